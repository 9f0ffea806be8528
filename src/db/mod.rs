//! Catalog access.
//!
//! [`Catalog`] is the read-only query interface the report layer consumes.
//! [`SqliteCatalog`] implements it over a `tokio_rusqlite` connection, with
//! every call bounded by a timeout so a stuck engine surfaces as a
//! [`ReportError::Query`] instead of a hung request. A query that overruns is
//! interrupted so the connection thread is free for the next caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_rusqlite::{Connection, rusqlite};

use crate::core::{ClientRow, JobRow};
use crate::error::{ReportError, Result};

pub mod clients;
pub mod clock;
pub mod jobs;
pub mod query;

pub use clock::CatalogClock;
pub use query::{JOBS_PER_PAGE, JobFilter, JobOrder, JobQuery, PageSize};

/// Read-only query interface over the backup catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Jobs matching the query, in its order, limited to its page.
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobRow>>;

    /// Number of jobs matching the filter, independent of any page limit.
    async fn count_jobs(&self, filter: &JobFilter) -> Result<u64>;

    /// Sum of job bytes with an end time in `[from, to)`.
    async fn stored_bytes(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        name: Option<&str>,
    ) -> Result<u64>;

    /// Sum of job files with an end time in `[from, to)`.
    async fn stored_files(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        name: Option<&str>,
    ) -> Result<u64>;

    async fn client_by_id(&self, client_id: i64) -> Result<Option<ClientRow>>;
}

/// Catalog stored in an SQLite database.
#[derive(Clone)]
pub struct SqliteCatalog {
    conn: Connection,
    interrupt: Arc<rusqlite::InterruptHandle>,
    timeout: Duration,
    clock: CatalogClock,
}

impl SqliteCatalog {
    /// Open an existing catalog. Stamps are read in local time until
    /// [`with_clock`](Self::with_clock) says otherwise.
    pub async fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .await
            .map_err(ReportError::query)?;
        Self::from_connection(conn, timeout).await
    }

    /// Open an in-memory catalog with the schema applied.
    pub async fn open_in_memory(timeout: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(ReportError::query)?;
        let catalog = Self::from_connection(conn, timeout).await?;
        catalog.init_schema().await?;
        Ok(catalog)
    }

    async fn from_connection(conn: Connection, timeout: Duration) -> Result<Self> {
        let interrupt = conn
            .call(|c| Ok::<_, rusqlite::Error>(c.get_interrupt_handle()))
            .await
            .map_err(ReportError::query)?;
        Ok(Self {
            conn,
            interrupt: Arc::new(interrupt),
            timeout,
            clock: CatalogClock::default(),
        })
    }

    pub fn with_clock(mut self, clock: CatalogClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> CatalogClock {
        self.clock
    }

    /// Create the tables bkweb reads if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        self.call(|c| {
            c.execute_batch(include_str!("schema.sql"))?;
            Ok(())
        })
        .await
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a closure on the connection thread, bounded by the query timeout.
    pub(crate) async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        match tokio::time::timeout(self.timeout, self.conn.call(f)).await {
            Ok(result) => result.map_err(ReportError::query),
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Catalog query timed out");
                // Abort the statement still running on the connection thread.
                self.interrupt.interrupt();
                Err(ReportError::Query(format!(
                    "query timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobRow>> {
        jobs::list(self, query).await
    }

    async fn count_jobs(&self, filter: &JobFilter) -> Result<u64> {
        jobs::count(self, filter).await
    }

    async fn stored_bytes(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        name: Option<&str>,
    ) -> Result<u64> {
        jobs::stored_bytes(self, from, to, name).await
    }

    async fn stored_files(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        name: Option<&str>,
    ) -> Result<u64> {
        jobs::stored_files(self, from, to, name).await
    }

    async fn client_by_id(&self, client_id: i64) -> Result<Option<ClientRow>> {
        clients::get(self, client_id).await
    }
}
