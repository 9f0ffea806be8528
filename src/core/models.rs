use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the catalog `Job` table with its joined pool, client and status text.
///
/// Values are raw catalog values; formatting happens in the report layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    pub job_id: i64,
    pub name: String,
    pub level: String,
    pub status: String,
    pub job_bytes: u64,
    pub job_files: u64,
    /// `None` when the catalog holds NULL or the zero-date sentinel
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub pool_name: Option<String>,
    pub client_name: Option<String>,
    pub status_long: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRow {
    pub client_id: i64,
    pub name: String,
    pub uname: Option<String>,
}
