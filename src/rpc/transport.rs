//! Line-framed JSON over TCP.
//!
//! One request per line, one response line per request that carries an id.
//! Each connection is served by its own task and ends when the peer closes
//! it or the server is cancelled.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;

use super::methods::MethodHandler;
use super::protocol::{ErrorCode, Request, Response};

/// Longest request line accepted before the connection is dropped.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

pub(crate) async fn accept_loop(
    listener: &TcpListener,
    handler: Arc<MethodHandler>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "RPC server listening");

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept RPC connection");
                    continue;
                }
            },
        };

        let handler = handler.clone();
        let shutdown = shutdown.child_token();
        tokio::spawn(async move {
            tracing::debug!(%peer, "RPC client connected");
            if let Err(e) = serve_connection(stream, peer, &handler, shutdown).await {
                tracing::debug!(%peer, error = %e, "RPC connection ended with error");
            }
        });
    }

    tracing::info!("RPC server stopped");
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: &MethodHandler,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let peer = peer.to_string();
    let mut lines = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_BYTES));

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = lines.next() => match next {
                Some(line) => line?,
                None => break,
            },
        };

        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = dispatch_line(&line, &peer, handler).await {
            lines.send(serde_json::to_string(&response)?).await?;
        }
    }

    Ok(())
}

/// Decode one framed request and run it. Notifications run but yield `None`.
pub(crate) async fn dispatch_line(
    line: &str,
    peer: &str,
    handler: &MethodHandler,
) -> Option<Response> {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(peer, error = %e, "Unparsable RPC request");
            return Some(Response::error(
                Value::Null,
                ErrorCode::ParseError,
                format!("Parse error: {e}"),
            ));
        }
    };

    if let Err(reason) = request.check() {
        tracing::warn!(peer, reason, "Malformed RPC request");
        return Some(Response::error(
            request.id.unwrap_or(Value::Null),
            ErrorCode::InvalidRequest,
            format!("Invalid request: {reason}"),
        ));
    }

    tracing::debug!(peer, method = %request.method, "RPC request");
    let notification = request.is_notification();
    let response = handler.handle(request).await;
    (!notification).then_some(response)
}
