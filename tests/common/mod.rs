//! Shared catalog fixtures for integration tests.

#![allow(dead_code)]

use bkweb::db::{CatalogClock, SqliteCatalog};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio_rusqlite::params;

/// A job row to insert. `None` times are stored as the zero-date sentinel.
pub struct Seed {
    pub job_id: i64,
    pub name: &'static str,
    pub level: &'static str,
    pub status: &'static str,
    pub bytes: i64,
    pub files: i64,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Seed {
    pub fn new(job_id: i64, name: &'static str, status: &'static str) -> Self {
        Self {
            job_id,
            name,
            level: "F",
            status,
            bytes: 0,
            files: 0,
            start: None,
            end: None,
        }
    }

    pub fn stored(mut self, bytes: i64, files: i64) -> Self {
        self.bytes = bytes;
        self.files = files;
        self
    }

    pub fn ran(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// Offset the fixture catalog's stamps are written in, east of UTC.
pub const CATALOG_OFFSET: &str = "+02:00";

pub async fn catalog() -> SqliteCatalog {
    let catalog = SqliteCatalog::open_in_memory(Duration::from_secs(5))
        .await
        .expect("open in-memory catalog")
        .with_clock(CATALOG_OFFSET.parse().expect("catalog offset"));

    catalog
        .connection()
        .call(|c| {
            c.execute_batch(
                "INSERT INTO Pool (PoolId, Name) VALUES (1, 'Default'), (2, 'Offsite');
                 INSERT INTO Client (ClientId, Name, Uname) VALUES
                    (1, 'backup-fd', '9.4.2 (linux)'),
                    (2, 'web01-fd', NULL);",
            )?;
            Ok::<(), tokio_rusqlite::rusqlite::Error>(())
        })
        .await
        .expect("seed pools and clients");

    catalog
}

pub async fn insert(catalog: &SqliteCatalog, seeds: Vec<Seed>) {
    const UNSET: &str = "0000-00-00 00:00:00";
    let clock: CatalogClock = catalog.clock();
    let stamp = move |at: Option<DateTime<Utc>>| {
        at.map(|at| clock.format(at))
            .unwrap_or_else(|| UNSET.to_string())
    };

    catalog
        .connection()
        .call(move |c| {
            let tx = c.transaction()?;
            for s in seeds {
                tx.execute(
                    "INSERT INTO Job (JobId, Name, Level, JobStatus, JobBytes, JobFiles,
                                      StartTime, EndTime, PoolId, ClientId)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, 1)",
                    params![
                        s.job_id,
                        s.name,
                        s.level,
                        s.status,
                        s.bytes,
                        s.files,
                        stamp(s.start),
                        stamp(s.end),
                    ],
                )?;
            }
            tx.commit()?;
            Ok::<(), tokio_rusqlite::rusqlite::Error>(())
        })
        .await
        .expect("seed jobs");
}
