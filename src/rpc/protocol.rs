//! JSON-RPC 2.0 message types.
//!
//! See: https://www.jsonrpc.org/specification

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReportError;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Absent on notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Request {
    pub fn new(method: &str, params: Option<Value>, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id: Some(id),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Structural checks serde cannot express.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.jsonrpc != JSONRPC_VERSION {
            Err("jsonrpc must be \"2.0\"")
        } else if self.method.trim().is_empty() {
            Err("method must not be empty")
        } else {
            Ok(())
        }
    }
}

/// Exactly one of `result` or `error` is present on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub id: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Error codes this server emits. The application codes sit in the range
/// JSON-RPC reserves for server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    NotFound,
    QueryFailed,
    ConsoleFailed,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::NotFound => -32000,
            ErrorCode::QueryFailed => -32001,
            ErrorCode::ConsoleFailed => -32002,
        }
    }
}

impl From<&ReportError> for ErrorCode {
    fn from(err: &ReportError) -> Self {
        match err {
            ReportError::MissingParameter(_) | ReportError::InvalidParameter { .. } => {
                ErrorCode::InvalidParams
            }
            ReportError::ClientNotFound(_) => ErrorCode::NotFound,
            ReportError::Query(_) => ErrorCode::QueryFailed,
            ReportError::Console(_) => ErrorCode::ConsoleFailed,
        }
    }
}

impl Response {
    pub fn success(id: Value, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::with(id, Outcome::Result(value)),
            Err(e) => Self::error(id, ErrorCode::InternalError, e.to_string()),
        }
    }

    pub fn error(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with(
            id,
            Outcome::Error(RpcError {
                code: code.code(),
                message: message.into(),
                data: None,
            }),
        )
    }

    /// The failure's own message is kept; only the code is mapped.
    pub fn from_report_error(id: Value, err: &ReportError) -> Self {
        Self::error(id, ErrorCode::from(err), err.to_string())
    }

    fn with(id: Value, outcome: Outcome) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome,
            id,
        }
    }

    pub fn rpc_error(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            Outcome::Result(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_request_with_params() {
        let req: Request = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"jobs.list","params":{"status":"failed","jobs_per_page":50},"id":1}"#,
        )
        .unwrap();

        assert_eq!(req.method, "jobs.list");
        assert_eq!(req.params.unwrap()["jobs_per_page"], 50);
        assert_eq!(req.id, Some(json!(1)));
    }

    #[test]
    fn request_without_id_is_notification() {
        let req: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"server.status"}"#).unwrap();
        assert!(req.is_notification());
        assert!(req.check().is_ok());
    }

    #[test]
    fn check_rejects_version_and_blank_method() {
        let mut req = Request::new("jobs.list", None, Value::Null);
        req.jsonrpc = "1.0".into();
        assert!(req.check().is_err());

        assert!(Request::new("  ", None, Value::Null).check().is_err());
    }

    #[test]
    fn report_errors_map_to_codes() {
        let missing =
            Response::from_report_error(json!(3), &ReportError::MissingParameter("backupjob_name"));
        assert_eq!(missing.rpc_error().unwrap().code, -32602);

        let query = Response::from_report_error(json!(3), &ReportError::Query("locked".into()));
        let error = query.rpc_error().unwrap();
        assert_eq!(error.code, ErrorCode::QueryFailed.code());
        assert_eq!(error.message, "Catalog query failed: locked");
    }

    #[test]
    fn outcome_serializes_as_one_member() {
        let err = Response::error(json!("abc"), ErrorCode::MethodNotFound, "Method not found: x");
        let wire = serde_json::to_value(&err).unwrap();
        assert_eq!(wire["error"]["code"], -32601);
        assert!(wire.get("result").is_none());

        let ok: Response =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":{"total_jobs":4},"id":"abc"}"#)
                .unwrap();
        assert!(matches!(ok.outcome, Outcome::Result(ref v) if v["total_jobs"] == 4));
    }
}
