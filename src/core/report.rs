//! Report assembly.
//!
//! Combines catalog queries, status classification, formatting and period
//! bucketing into the data bound to a display template. Every report is
//! recomputed per request; a failed query aborts the whole report.

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use super::chart::{ChartArtifact, ChartRenderer, Series, SeriesPoint};
use super::format::{SizeUnit, elapsed_time, human_size, size_in_unit};
use super::models::JobRow;
use super::period::{last_days_intervals_at, period_label};
use super::status::{Classification, JobLevel, StatusCategory, classify};
use super::template::TemplateContext;
use crate::db::{Catalog, JOBS_PER_PAGE, JobFilter, JobOrder, JobQuery, PageSize};
use crate::error::{ReportError, Result};

/// Length of the job report window in days.
pub const REPORT_DAYS: usize = 7;

/// Status filter choices offered by the job list, `Any` meaning unfiltered.
pub const JOB_STATUS_OPTIONS: [&str; 6] =
    ["Any", "Waiting", "Running", "Completed", "Failed", "Canceled"];

/// A job row prepared for display.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub job_id: i64,
    pub name: String,
    pub level: &'static str,
    pub level_name: &'static str,
    pub status: Classification,
    /// Status text from the catalog's own table, when present
    pub status_long: Option<String>,
    pub job_bytes: u64,
    pub bytes: String,
    pub job_files: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub elapsed: String,
    pub pool: Option<String>,
    pub client: Option<String>,
}

impl JobView {
    pub fn new(row: JobRow, now: DateTime<Utc>) -> Self {
        let level = JobLevel::from_code(&row.level);
        Self {
            job_id: row.job_id,
            level: level.short_label(),
            level_name: level.name(),
            status: classify(&row.status),
            status_long: row.status_long,
            job_bytes: row.job_bytes,
            bytes: human_size(row.job_bytes),
            job_files: row.job_files,
            elapsed: elapsed_time(row.start_time, row.end_time, now),
            start_time: row.start_time,
            end_time: row.end_time,
            pool: row.pool_name,
            client: row.client_name,
            name: row.name,
        }
    }
}

/// Stored totals for one day of a report window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotal {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bytes: u64,
    pub files: u64,
}

/// One of the two per-day series plotted on a job report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredSeries {
    Bytes,
    Files,
}

impl StoredSeries {
    fn title(self) -> &'static str {
        match self {
            StoredSeries::Bytes => "Stored bytes",
            StoredSeries::Files => "Stored files",
        }
    }

    fn y_title(self) -> &'static str {
        match self {
            StoredSeries::Bytes => SizeUnit::Gigabytes.label(),
            StoredSeries::Files => "Files",
        }
    }

    /// Plotted value of a day's sum: gigabytes or a plain file count.
    fn plot(self, sum: u64) -> f64 {
        match self {
            StoredSeries::Bytes => size_in_unit(sum, SizeUnit::Gigabytes),
            StoredSeries::Files => sum as f64,
        }
    }

    async fn sum(
        self,
        catalog: &dyn Catalog,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        name: &str,
    ) -> Result<u64> {
        match self {
            StoredSeries::Bytes => catalog.stored_bytes(from, to, Some(name)).await,
            StoredSeries::Files => catalog.stored_files(from, to, Some(name)).await,
        }
    }
}

impl FromStr for StoredSeries {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bytes" => Ok(StoredSeries::Bytes),
            "files" => Ok(StoredSeries::Files),
            other => Err(ReportError::invalid("chart", other)),
        }
    }
}

/// Chart slot: the plotted series and its rendered artifact.
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    pub series: Series,
    pub chart: ChartArtifact,
}

/// Weekly report for one backup job.
#[derive(Debug, Clone, Serialize)]
pub struct BackupJobReport {
    pub name: String,
    pub period: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_bytes: u64,
    pub total_files: u64,
    pub days: Vec<DayTotal>,
    pub stored_bytes: Graph,
    pub stored_files: Graph,
    /// Most recent runs, newest end time first
    pub jobs: Vec<JobView>,
}

impl BackupJobReport {
    pub fn to_template(&self) -> TemplateContext {
        let mut ctx = TemplateContext::new();
        ctx.assign("backupjob_name", &self.name);
        ctx.assign("backupjob_period", &self.period);
        ctx.assign("backupjob_bytes", human_size(self.total_bytes));
        ctx.assign("backupjob_files", self.total_files);
        ctx.assign("graph_stored_bytes", &self.stored_bytes);
        ctx.assign("graph_stored_files", &self.stored_files);
        ctx.assign("jobs", &self.jobs);
        ctx
    }
}

/// Job list parameters as received from a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListRequest {
    /// `any` or a status category name, case-insensitive
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub jobs_per_page: Option<u32>,
    /// Zero-based page index
    #[serde(default)]
    pub page: Option<u32>,
}

impl JobListRequest {
    fn status_filter(&self) -> Result<Option<StatusCategory>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("any") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }

    fn page_size(&self) -> Result<PageSize> {
        self.jobs_per_page
            .map(PageSize::new)
            .unwrap_or(Ok(PageSize::DEFAULT))
    }
}

/// One page of the job list plus the unpaged match count.
#[derive(Debug, Clone, Serialize)]
pub struct JobListPage {
    pub status: Option<StatusCategory>,
    pub page_size: PageSize,
    pub page: u32,
    pub total_jobs: u64,
    pub jobs: Vec<JobView>,
}

impl JobListPage {
    pub fn page_count(&self) -> u64 {
        self.total_jobs.div_ceil(self.page_size.get() as u64)
    }

    pub fn to_template(&self) -> TemplateContext {
        let mut ctx = TemplateContext::new();
        ctx.assign("job_status", JOB_STATUS_OPTIONS);
        ctx.assign("jobs_per_page", JOBS_PER_PAGE);
        ctx.assign(
            "selected_status",
            self.status.map(|s| s.label()).unwrap_or("Any"),
        );
        ctx.assign("selected_jobs_per_page", self.page_size);
        ctx.assign("page", self.page);
        ctx.assign("page_count", self.page_count());
        ctx.assign("total_jobs", self.total_jobs);
        ctx.assign("jobs", &self.jobs);
        ctx
    }
}

pub struct ReportAssembler {
    catalog: Arc<dyn Catalog>,
    charts: Arc<dyn ChartRenderer>,
}

impl ReportAssembler {
    pub fn new(catalog: Arc<dyn Catalog>, charts: Arc<dyn ChartRenderer>) -> Self {
        Self { catalog, charts }
    }

    /// Totals, per-day series and recent runs of `name` over the trailing week.
    ///
    /// All catalog queries run concurrently; the report is only assembled once
    /// every one of them has succeeded.
    pub async fn backup_job_report(
        &self,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BackupJobReport> {
        let name = job_name(name)?;

        let started = Instant::now();
        let catalog = self.catalog.as_ref();
        let from = now - Duration::days(REPORT_DAYS as i64);
        let buckets = last_days_intervals_at(REPORT_DAYS, now);

        let day_totals = try_join_all(buckets.iter().map(|day| async move {
            let (bytes, files) = tokio::try_join!(
                catalog.stored_bytes(day.start, day.end, Some(name)),
                catalog.stored_files(day.start, day.end, Some(name)),
            )?;
            Ok::<_, ReportError>(DayTotal {
                label: day.label.clone(),
                start: day.start,
                end: day.end,
                bytes,
                files,
            })
        }));

        let recent = JobQuery {
            filter: JobFilter::named(name),
            order: JobOrder::EndTimeDesc,
            page_size: PageSize::RECENT,
            offset: 0,
        };

        let (total_bytes, total_files, days, rows) = tokio::try_join!(
            catalog.stored_bytes(from, now, Some(name)),
            catalog.stored_files(from, now, Some(name)),
            day_totals,
            catalog.list_jobs(&recent),
        )?;

        let stored_bytes = self.graph(
            StoredSeries::Bytes,
            days.iter().map(|d| (d.label.clone(), d.bytes)),
        );
        let stored_files = self.graph(
            StoredSeries::Files,
            days.iter().map(|d| (d.label.clone(), d.files)),
        );

        tracing::debug!(
            job = %name,
            jobs = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backup job report assembled"
        );

        Ok(BackupJobReport {
            name: name.to_string(),
            period: period_label(from, now),
            from,
            to: now,
            total_bytes,
            total_files,
            days,
            stored_bytes,
            stored_files,
            jobs: rows.into_iter().map(|row| JobView::new(row, now)).collect(),
        })
    }

    /// A single per-day series of the weekly report, without the totals and
    /// recent runs. Issues one query per day.
    pub async fn daily_graph(
        &self,
        name: Option<&str>,
        series: StoredSeries,
        now: DateTime<Utc>,
    ) -> Result<Graph> {
        let name = job_name(name)?;
        let catalog = self.catalog.as_ref();
        let buckets = last_days_intervals_at(REPORT_DAYS, now);

        let sums = try_join_all(
            buckets
                .iter()
                .map(|day| series.sum(catalog, day.start, day.end, name)),
        )
        .await?;

        Ok(self.graph(
            series,
            buckets.into_iter().zip(sums).map(|(day, sum)| (day.label, sum)),
        ))
    }

    /// One page of the global job list, newest job id first.
    pub async fn job_list(
        &self,
        request: &JobListRequest,
        now: DateTime<Utc>,
    ) -> Result<JobListPage> {
        let status = request.status_filter()?;
        let page_size = request.page_size()?;
        let page = request.page.unwrap_or(0);

        let filter = JobFilter::default().with_category(status);
        let query = JobQuery {
            filter: filter.clone(),
            order: JobOrder::JobIdDesc,
            page_size,
            offset: page as u64 * page_size.get() as u64,
        };

        let (rows, total_jobs) = tokio::try_join!(
            self.catalog.list_jobs(&query),
            self.catalog.count_jobs(&filter),
        )?;

        Ok(JobListPage {
            status,
            page_size,
            page,
            total_jobs,
            jobs: rows.into_iter().map(|row| JobView::new(row, now)).collect(),
        })
    }

    fn graph(&self, kind: StoredSeries, sums: impl Iterator<Item = (String, u64)>) -> Graph {
        let series = Series {
            title: kind.title().to_string(),
            y_title: kind.y_title().to_string(),
            points: sums
                .map(|(label, sum)| SeriesPoint {
                    label,
                    value: kind.plot(sum),
                })
                .collect(),
        };
        let chart = self.charts.render(&series);
        Graph { series, chart }
    }
}

fn job_name(name: Option<&str>) -> Result<&str> {
    name.filter(|n| !n.trim().is_empty())
        .ok_or(ReportError::MissingParameter("backupjob_name"))
}
