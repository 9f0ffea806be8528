//! JSON-RPC 2.0 interface used by the CLI subcommands.
//!
//! - `protocol`: request, response and error code types
//! - `transport`: line-framed TCP listener
//! - `methods`: method table over the report layer
//! - `client`: one-shot client for the CLI

pub mod client;
pub mod methods;
mod protocol;
mod transport;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

pub use client::{ClientError, RpcClient};
pub use methods::MethodHandler;
pub use protocol::{ErrorCode, Outcome, Request, Response, RpcError};
pub(crate) use transport::dispatch_line;

pub struct RpcServer {
    listener: TcpListener,
    handler: Arc<MethodHandler>,
    shutdown: CancellationToken,
}

impl RpcServer {
    /// Bind the listener. Port 0 picks a free port; see `local_addr()`.
    pub async fn bind(ctx: AppContext, addr: SocketAddr) -> anyhow::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            handler: Arc::new(MethodHandler::new(ctx)),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown()` is called. Open connections are closed too.
    pub async fn start(&self) -> anyhow::Result<()> {
        transport::accept_loop(&self.listener, self.handler.clone(), self.shutdown.clone()).await
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
