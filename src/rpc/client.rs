//! One-shot client for a running bkweb server.

use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use uuid::Uuid;

use super::protocol::{Outcome, Request, Response, RpcError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to connect to server: {0}")]
    Connect(std::io::Error),
    #[error("Communication error: {0}")]
    Frame(#[from] LinesCodecError),
    #[error("Server closed the connection without responding")]
    Closed,
    #[error("No response within {0:?}")]
    Timeout(Duration),
    #[error("Failed to encode request: {0}")]
    Encode(serde_json::Error),
    #[error("Failed to decode response: {0}")]
    Decode(serde_json::Error),
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(RpcError),
}

pub struct RpcClient {
    addr: SocketAddr,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: Duration::from_secs(60),
        }
    }

    /// Bound on connect plus the whole exchange. Reports can take a while on
    /// large catalogs.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, ClientError> {
        let response = tokio::time::timeout(self.timeout, self.exchange(method, params))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;

        match response.outcome {
            Outcome::Result(value) => serde_json::from_value(value).map_err(ClientError::Decode),
            Outcome::Error(e) => Err(ClientError::Rpc(e)),
        }
    }

    pub async fn call_no_params<T: DeserializeOwned>(
        &self,
        method: &str,
    ) -> Result<T, ClientError> {
        self.call(method, None).await
    }

    async fn exchange(&self, method: &str, params: Option<Value>) -> Result<Response, ClientError> {
        let stream = TcpStream::connect(self.addr)
            .await
            .map_err(ClientError::Connect)?;
        let mut lines = Framed::new(stream, LinesCodec::new());

        let request = Request::new(method, params, Value::String(Uuid::now_v7().to_string()));
        lines
            .send(serde_json::to_string(&request).map_err(ClientError::Encode)?)
            .await?;

        let line = lines.next().await.ok_or(ClientError::Closed)??;
        serde_json::from_str(&line).map_err(ClientError::Decode)
    }
}
