//! Parameterized job queries.
//!
//! Caller input only ever reaches SQL as bound parameters. Ordering and page
//! sizes come from closed allow-lists mapped to fixed SQL fragments.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_rusqlite::rusqlite::types::Value;

use super::CatalogClock;
use crate::core::StatusCategory;
use crate::error::{ReportError, Result};

/// Timestamp layout of the catalog's DATETIME columns.
pub const CATALOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Page sizes offered to users of the job list.
pub const JOBS_PER_PAGE: [u32; 5] = [25, 50, 75, 100, 150];

const JOB_COLUMNS: &str = "Job.JobId, Job.Name, Job.Level, Job.JobStatus, Job.JobBytes, \
     Job.JobFiles, Job.StartTime, Job.EndTime, Pool.Name, Client.Name, Status.JobStatusLong";

const JOB_JOINS: &str = "LEFT JOIN Pool ON Job.PoolId = Pool.PoolId \
     LEFT JOIN Client ON Job.ClientId = Client.ClientId \
     LEFT JOIN Status ON Job.JobStatus = Status.JobStatus";

/// Which jobs to select. All fields are optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    /// Exact job name
    pub name: Option<String>,
    pub category: Option<StatusCategory>,
    /// Inclusive lower bound on end time
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on end time
    pub to: Option<DateTime<Utc>>,
}

impl JobFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_category(mut self, category: Option<StatusCategory>) -> Self {
        self.category = category;
        self
    }

    /// WHERE clause (empty when unfiltered) and its positional parameters.
    /// Time bounds are bound as `clock` wall-clock stamps.
    pub(crate) fn where_clause(&self, clock: CatalogClock) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(name) = &self.name {
            conditions.push("Job.Name = ?".to_string());
            params.push(Value::Text(name.clone()));
        }

        if let Some(category) = self.category {
            let codes = category.codes();
            if codes.is_empty() {
                // Unknown has no code set; it can never match.
                conditions.push("0".to_string());
            } else {
                let placeholders = vec!["?"; codes.len()].join(", ");
                conditions.push(format!("Job.JobStatus IN ({placeholders})"));
                params.extend(codes.iter().map(|c| Value::Text(c.to_string())));
            }
        }

        if let Some(from) = self.from {
            conditions.push("Job.EndTime >= ?".to_string());
            params.push(Value::Text(clock.format(from)));
        }

        if let Some(to) = self.to {
            conditions.push("Job.EndTime < ?".to_string());
            params.push(Value::Text(clock.format(to)));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Allow-listed sort orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum JobOrder {
    #[default]
    JobIdDesc,
    EndTimeDesc,
}

impl JobOrder {
    fn sql(self) -> &'static str {
        match self {
            JobOrder::JobIdDesc => "Job.JobId DESC",
            JobOrder::EndTimeDesc => "Job.EndTime DESC, Job.JobId DESC",
        }
    }
}

/// A row limit taken from a fixed allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageSize(u32);

impl PageSize {
    /// Default size of the job list
    pub const DEFAULT: PageSize = PageSize(25);
    /// Number of recent jobs shown on a job report
    pub const RECENT: PageSize = PageSize(10);

    /// Accepts only the sizes in [`JOBS_PER_PAGE`].
    pub fn new(size: u32) -> Result<Self> {
        if JOBS_PER_PAGE.contains(&size) {
            Ok(PageSize(size))
        } else {
            Err(ReportError::invalid("jobs_per_page", size.to_string()))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A filtered, ordered and limited job listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobQuery {
    pub filter: JobFilter,
    pub order: JobOrder,
    pub page_size: PageSize,
    pub offset: u64,
}

impl JobQuery {
    pub(crate) fn to_sql(&self, clock: CatalogClock) -> (String, Vec<Value>) {
        let (where_sql, mut params) = self.filter.where_clause(clock);
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM Job {JOB_JOINS}{where_sql} ORDER BY {} LIMIT ? OFFSET ?",
            self.order.sql()
        );
        params.push(Value::Integer(self.page_size.get() as i64));
        params.push(Value::Integer(self.offset.min(i64::MAX as u64) as i64));
        (sql, params)
    }
}

pub(crate) fn count_sql(filter: &JobFilter, clock: CatalogClock) -> (String, Vec<Value>) {
    let (where_sql, params) = filter.where_clause(clock);
    (format!("SELECT COUNT(*) FROM Job{where_sql}"), params)
}

/// Column that can be summed over a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SumColumn {
    Bytes,
    Files,
}

pub(crate) fn sum_sql(
    column: SumColumn,
    filter: &JobFilter,
    clock: CatalogClock,
) -> (String, Vec<Value>) {
    let column = match column {
        SumColumn::Bytes => "Job.JobBytes",
        SumColumn::Files => "Job.JobFiles",
    };
    let (where_sql, params) = filter.where_clause(clock);
    (
        format!("SELECT COALESCE(SUM({column}), 0) FROM Job{where_sql}"),
        params,
    )
}
