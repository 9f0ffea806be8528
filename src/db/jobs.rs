use chrono::{DateTime, Utc};
use tokio_rusqlite::rusqlite::{self, Row, params_from_iter};

use super::query::{self, JobFilter, JobQuery, SumColumn};
use super::{CatalogClock, SqliteCatalog};
use crate::core::JobRow;
use crate::error::Result;

pub async fn list(catalog: &SqliteCatalog, job_query: &JobQuery) -> Result<Vec<JobRow>> {
    let clock = catalog.clock();
    let (sql, params) = job_query.to_sql(clock);
    tracing::debug!(sql = %sql, "Listing jobs");

    catalog
        .call(move |c| {
            let mut stmt = c.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| job_from_row(row, clock))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
}

pub async fn count(catalog: &SqliteCatalog, filter: &JobFilter) -> Result<u64> {
    let (sql, params) = query::count_sql(filter, catalog.clock());
    scalar(catalog, sql, params).await
}

pub async fn stored_bytes(
    catalog: &SqliteCatalog,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    name: Option<&str>,
) -> Result<u64> {
    let (sql, params) = query::sum_sql(
        SumColumn::Bytes,
        &period_filter(from, to, name),
        catalog.clock(),
    );
    scalar(catalog, sql, params).await
}

pub async fn stored_files(
    catalog: &SqliteCatalog,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    name: Option<&str>,
) -> Result<u64> {
    let (sql, params) = query::sum_sql(
        SumColumn::Files,
        &period_filter(from, to, name),
        catalog.clock(),
    );
    scalar(catalog, sql, params).await
}

fn period_filter(from: DateTime<Utc>, to: DateTime<Utc>, name: Option<&str>) -> JobFilter {
    JobFilter {
        name: name.map(str::to_string),
        ..Default::default()
    }
    .between(from, to)
}

async fn scalar(
    catalog: &SqliteCatalog,
    sql: String,
    params: Vec<rusqlite::types::Value>,
) -> Result<u64> {
    catalog
        .call(move |c| {
            let value: i64 = c.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
            Ok(value.max(0) as u64)
        })
        .await
}

fn job_from_row(row: &Row<'_>, clock: CatalogClock) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        job_id: row.get(0)?,
        name: row.get(1)?,
        level: row.get(2)?,
        status: row.get(3)?,
        job_bytes: counter(row.get(4)?),
        job_files: counter(row.get(5)?),
        start_time: catalog_timestamp(row.get(6)?, clock),
        end_time: catalog_timestamp(row.get(7)?, clock),
        pool_name: row.get(8)?,
        client_name: row.get(9)?,
        status_long: row.get(10)?,
    })
}

fn counter(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}

/// NULL, the `0000-00-00 00:00:00` sentinel and unparsable stamps are unset.
fn catalog_timestamp(value: Option<String>, clock: CatalogClock) -> Option<DateTime<Utc>> {
    clock.parse(&value?)
}
