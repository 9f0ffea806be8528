//! Web dashboard for bkweb.
//!
//! Serves the embedded page that renders report slots, a JSON API, chart
//! images, and JSON-RPC 2.0 over WebSocket.
//!
//! ## Endpoints
//!
//! - `GET /` - Embedded dashboard page
//! - `GET /api/jobs?status=&jobs_per_page=&page=` - Job list slots
//! - `GET /api/report?backupjob_name=` - Weekly job report slots
//! - `GET /api/charts/{job}/{bytes|files}` - SVG chart for a job report
//! - `WS /ws` - JSON-RPC over WebSocket

mod api;
mod websocket;

use axum::{Router, response::Html, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::rpc::MethodHandler;

const INDEX_HTML: &str = include_str!("assets/index.html");

#[derive(Clone)]
pub struct WebState {
    pub ctx: AppContext,
    pub handler: Arc<MethodHandler>,
}

pub struct WebServer {
    listener: TcpListener,
    state: WebState,
    shutdown: CancellationToken,
}

impl WebServer {
    /// Bind the HTTP listener. Port 0 picks a free port; see `local_addr()`.
    pub async fn bind(ctx: AppContext, addr: SocketAddr) -> anyhow::Result<Self> {
        let handler = Arc::new(MethodHandler::new(ctx.clone()));
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            state: WebState { ctx, handler },
            shutdown: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Token that stops `start()` gracefully once cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn start(self) -> anyhow::Result<()> {
        tracing::info!(addr = %self.listener.local_addr()?, "Web dashboard listening");
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(self.shutdown.cancelled_owned())
            .await?;
        tracing::info!("Web dashboard stopped");
        Ok(())
    }
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(websocket::ws_handler))
        .route("/api/jobs", get(api::jobs))
        .route("/api/report", get(api::report))
        .route("/api/charts/{job}/{kind}", get(api::chart))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
