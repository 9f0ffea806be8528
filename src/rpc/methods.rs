//! RPC method dispatch.
//!
//! Every method maps onto one report-layer operation. The same handler backs
//! the TCP transport and the dashboard's WebSocket.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::context::AppContext;
use crate::core::{JobListRequest, classify};
use crate::error::ReportError;

use super::protocol::{ErrorCode, Request, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    ServerStatus,
    JobsList,
    BackupJobReport,
    ClassifyStatus,
    ShowClient,
}

impl Method {
    const ALL: [Method; 5] = [
        Method::ServerStatus,
        Method::JobsList,
        Method::BackupJobReport,
        Method::ClassifyStatus,
        Method::ShowClient,
    ];

    fn name(self) -> &'static str {
        match self {
            Method::ServerStatus => "server.status",
            Method::JobsList => "jobs.list",
            Method::BackupJobReport => "report.backup_job",
            Method::ClassifyStatus => "status.classify",
            Method::ShowClient => "clients.show",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

enum CallError {
    Params(serde_json::Error),
    Encode(serde_json::Error),
    Report(ReportError),
}

impl From<ReportError> for CallError {
    fn from(e: ReportError) -> Self {
        CallError::Report(e)
    }
}

type CallResult = Result<Value, CallError>;

#[derive(Serialize)]
struct ServerStatus {
    version: &'static str,
    uptime_secs: u64,
    http_bind: String,
    rpc_bind: String,
    catalog: String,
}

pub struct MethodHandler {
    ctx: AppContext,
    started: Instant,
}

impl MethodHandler {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            started: Instant::now(),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let id = request.id.unwrap_or(Value::Null);
        let Some(method) = Method::parse(&request.method) else {
            return Response::error(
                id,
                ErrorCode::MethodNotFound,
                format!("Method not found: {}", request.method),
            );
        };

        match self.call(method, request.params.unwrap_or(Value::Null)).await {
            Ok(result) => Response::success(id, result),
            Err(CallError::Params(e)) => {
                Response::error(id, ErrorCode::InvalidParams, format!("Invalid params: {e}"))
            }
            Err(CallError::Encode(e)) => {
                tracing::error!(method = method.name(), error = %e, "Failed to encode result");
                Response::error(id, ErrorCode::InternalError, e.to_string())
            }
            Err(CallError::Report(e)) => {
                if e.is_client_error() {
                    tracing::debug!(method = method.name(), error = %e, "Request rejected");
                } else {
                    tracing::error!(method = method.name(), error = %e, "Request failed");
                }
                Response::from_report_error(id, &e)
            }
        }
    }

    async fn call(&self, method: Method, params: Value) -> CallResult {
        let ctx = &self.ctx;
        match method {
            Method::ServerStatus => encode(ServerStatus {
                version: env!("CARGO_PKG_VERSION"),
                uptime_secs: self.started.elapsed().as_secs(),
                http_bind: ctx.config.http_bind.to_string(),
                rpc_bind: ctx.config.rpc_bind.to_string(),
                catalog: ctx.config.catalog_path.display().to_string(),
            }),
            Method::JobsList => {
                let request: JobListRequest = optional_params(params)?;
                let page = ctx.reports.job_list(&request, Utc::now()).await?;
                encode(page.to_template())
            }
            Method::BackupJobReport => {
                #[derive(Deserialize, Default)]
                struct Params {
                    #[serde(default)]
                    backupjob_name: Option<String>,
                }

                let p: Params = optional_params(params)?;
                let report = ctx
                    .reports
                    .backup_job_report(p.backupjob_name.as_deref(), Utc::now())
                    .await?;
                encode(report.to_template())
            }
            Method::ClassifyStatus => {
                #[derive(Deserialize)]
                struct Params {
                    code: String,
                }

                let p: Params = required_params(params)?;
                encode(classify(&p.code))
            }
            Method::ShowClient => {
                #[derive(Deserialize)]
                struct Params {
                    id: i64,
                }

                let p: Params = required_params(params)?;
                let client = ctx
                    .catalog
                    .client_by_id(p.id)
                    .await?
                    .ok_or(ReportError::ClientNotFound(p.id))?;
                encode(ctx.console.show_client(&client.name).await?)
            }
        }
    }
}

/// Missing params deserialize as the type's default.
fn optional_params<T: DeserializeOwned + Default>(params: Value) -> Result<T, CallError> {
    if params.is_null() {
        return Ok(T::default());
    }
    required_params(params)
}

fn required_params<T: DeserializeOwned>(params: Value) -> Result<T, CallError> {
    serde_json::from_value(params).map_err(CallError::Params)
}

fn encode(result: impl Serialize) -> CallResult {
    serde_json::to_value(result).map_err(CallError::Encode)
}
