//! Conversion between UTC instants and the catalog's wall-clock stamps.
//!
//! The director writes `StartTime`/`EndTime` in its own local time with no
//! offset attached, so every bound and every row goes through a
//! [`CatalogClock`] on its way in and out.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

use super::query::CATALOG_TIME_FORMAT;
use crate::error::ReportError;

/// Time zone the catalog's DATETIME columns are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogClock {
    /// This host's zone, for a director on the same machine
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl CatalogClock {
    pub fn utc() -> Self {
        CatalogClock::Fixed(Utc.fix())
    }

    /// `at` as the catalog would have written it.
    pub fn format(self, at: DateTime<Utc>) -> String {
        match self {
            CatalogClock::Local => at.with_timezone(&Local).format(CATALOG_TIME_FORMAT),
            CatalogClock::Fixed(offset) => at.with_timezone(&offset).format(CATALOG_TIME_FORMAT),
        }
        .to_string()
    }

    /// Parse a catalog stamp. The zero-date sentinel and garbage give `None`.
    pub fn parse(self, text: &str) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(text.trim(), CATALOG_TIME_FORMAT).ok()?;
        match self {
            CatalogClock::Local => resolve(&Local, naive),
            CatalogClock::Fixed(offset) => resolve(&offset, naive),
        }
    }
}

/// Ambiguous stamps (clocks turned back) take the earlier instant; stamps
/// inside a forward gap are read as the first valid time after it.
fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|at| at.with_timezone(&Utc))
}

/// Accepts `local`, `utc` or an offset such as `+02:00` / `-0530`.
impl FromStr for CatalogClock {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(CatalogClock::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(CatalogClock::utc());
        }
        parse_offset(s)
            .map(CatalogClock::Fixed)
            .ok_or_else(|| ReportError::invalid("catalog_timezone", s))
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl fmt::Display for CatalogClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogClock::Local => f.write_str("local"),
            CatalogClock::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}
