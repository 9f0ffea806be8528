//! JSON API handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::WebState;
use crate::core::{JobListRequest, StoredSeries, TemplateContext};
use crate::error::ReportError;

/// Report failure rendered as a JSON error body.
pub struct ApiError(ReportError);

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReportError::MissingParameter(_) | ReportError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            ReportError::ClientNotFound(_) => StatusCode::NOT_FOUND,
            ReportError::Query(_) | ReportError::Console(_) => {
                tracing::error!(error = %self.0, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub async fn jobs(
    State(state): State<WebState>,
    Query(request): Query<JobListRequest>,
) -> Result<Json<TemplateContext>, ApiError> {
    let page = state.ctx.reports.job_list(&request, Utc::now()).await?;
    Ok(Json(page.to_template()))
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    backupjob_name: Option<String>,
}

pub async fn report(
    State(state): State<WebState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<TemplateContext>, ApiError> {
    let report = state
        .ctx
        .reports
        .backup_job_report(params.backupjob_name.as_deref(), Utc::now())
        .await?;
    Ok(Json(report.to_template()))
}

/// Chart image for one series of a job's weekly report. Only that series'
/// daily sums are queried.
pub async fn chart(
    State(state): State<WebState>,
    Path((job, kind)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let series: StoredSeries = kind.parse()?;
    let graph = state
        .ctx
        .reports
        .daily_graph(Some(&job), series, Utc::now())
        .await?;

    Ok(([(header::CONTENT_TYPE, graph.chart.mime)], graph.chart.body).into_response())
}
