//! JSON-RPC over WebSocket: one text frame per request or response.

use axum::{
    extract::ws::{Message, WebSocket},
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};

use super::WebState;
use crate::rpc::dispatch_line;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(socket: WebSocket, state: WebState) {
    let (mut outgoing, mut incoming) = socket.split();

    while let Some(frame) = incoming.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket read failed");
                break;
            }
        };

        let Some(response) = dispatch_line(text.as_str(), "websocket", &state.handler).await
        else {
            continue;
        };
        let payload = match serde_json::to_string(&response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode WebSocket response");
                break;
            }
        };
        if outgoing.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }

    tracing::debug!("WebSocket closed");
}
