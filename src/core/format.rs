//! Human-readable rendering of byte counts and durations.
//!
//! These functions never fail: zero, missing and out-of-range inputs
//! degrade to a defined default string.

use chrono::{DateTime, Utc};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const DAYS_PER_YEAR: u64 = 365;

/// Fixed unit for chart axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
}

impl SizeUnit {
    fn exponent(self) -> i32 {
        match self {
            SizeUnit::Bytes => 0,
            SizeUnit::Kilobytes => 1,
            SizeUnit::Megabytes => 2,
            SizeUnit::Gigabytes => 3,
            SizeUnit::Terabytes => 4,
        }
    }

    pub fn label(self) -> &'static str {
        SIZE_UNITS[self.exponent() as usize]
    }
}

/// Render a byte count scaled by 1024 into B, KB, MB, GB or TB.
///
/// Scaling stops once the next unit would drop below 1. Bytes are shown
/// without decimals, scaled units with one. Zero renders as an empty string.
pub fn human_size(bytes: u64) -> String {
    if bytes == 0 {
        return String::new();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value / 1024.0 >= 1.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.1} {}", value, SIZE_UNITS[unit])
    }
}

/// Value of `bytes` in a fixed unit, rounded to one decimal.
pub fn size_in_unit(bytes: u64, unit: SizeUnit) -> f64 {
    let value = bytes as f64 / 1024f64.powi(unit.exponent());
    (value * 10.0).round() / 10.0
}

/// Render a duration in seconds as its two most significant units.
///
/// Each component is followed by a single space and pluralized when its
/// displayed value is 2 or more. The smallest displayed unit is rounded
/// half away from zero over the whole duration before being split, so
/// components never disagree (3599s is "60 mins ", not "1 hour 60 min ").
pub fn human_duration(seconds: u64) -> String {
    if seconds < MINUTE {
        return component(seconds, "sec");
    }
    if seconds < HOUR {
        return component(rounded_div(seconds, MINUTE), "min");
    }
    if seconds < DAY {
        let minutes = rounded_div(seconds, MINUTE);
        return format!(
            "{}{}",
            component(minutes / 60, "hour"),
            component(minutes % 60, "min")
        );
    }
    if seconds < 2 * DAYS_PER_YEAR * DAY {
        let hours = rounded_div(seconds, HOUR);
        return format!(
            "{}{}",
            component(hours / 24, "day"),
            component(hours % 24, "hour")
        );
    }

    let days = rounded_div(seconds, DAY);
    format!(
        "{}{}",
        component(days / DAYS_PER_YEAR, "year"),
        component(days % DAYS_PER_YEAR, "day")
    )
}

/// Render a duration as `HH:MM:SS`; hours are not wrapped at 24.
pub fn clock_duration(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / HOUR,
        (seconds % HOUR) / MINUTE,
        seconds % MINUTE
    )
}

/// Elapsed time of a job from its catalog timestamps.
///
/// An unset start renders as `N/A`; an unset end means the job is still
/// running and is measured against `now`.
pub fn elapsed_time(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    let Some(start) = start else {
        return "N/A".to_string();
    };
    let end = end.unwrap_or(now);
    let seconds = (end - start).num_seconds().max(0) as u64;
    human_duration(seconds)
}

fn component(value: u64, unit: &str) -> String {
    let suffix = if value >= 2 { "s " } else { " " };
    format!("{value} {unit}{suffix}")
}

fn rounded_div(value: u64, unit: u64) -> u64 {
    (value + unit / 2) / unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn human_size_reference_values() {
        assert_eq!(human_size(0), "");
        assert_eq!(human_size(1), "1 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1024), "1.0 KB");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(1024 * 1024 * 5), "5.0 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn human_size_caps_at_terabytes() {
        let pb = 1024u64.pow(5);
        assert_eq!(human_size(pb), "1024.0 TB");
        assert_eq!(human_size(u64::MAX), "16777216.0 TB");
    }

    #[test]
    fn size_in_fixed_unit() {
        assert_eq!(size_in_unit(0, SizeUnit::Gigabytes), 0.0);
        assert_eq!(size_in_unit(1024 * 1024 * 1024, SizeUnit::Gigabytes), 1.0);
        assert_eq!(size_in_unit(1536 * 1024 * 1024, SizeUnit::Gigabytes), 1.5);
        assert_eq!(size_in_unit(2048, SizeUnit::Bytes), 2048.0);
        assert_eq!(SizeUnit::Gigabytes.label(), "GB");
    }

    #[test]
    fn human_duration_seconds_and_minutes() {
        assert_eq!(human_duration(0), "0 sec ");
        assert_eq!(human_duration(1), "1 sec ");
        assert_eq!(human_duration(2), "2 secs ");
        assert_eq!(human_duration(59), "59 secs ");
        assert_eq!(human_duration(60), "1 min ");
        assert_eq!(human_duration(89), "1 min ");
        assert_eq!(human_duration(90), "2 mins ");
        assert_eq!(human_duration(3599), "60 mins ");
    }

    #[test]
    fn human_duration_hours_pluralize_at_boundaries() {
        assert_eq!(human_duration(3600), "1 hour 0 min ");
        assert_eq!(human_duration(3661), "1 hour 1 min ");
        assert_eq!(human_duration(3720), "1 hour 2 mins ");
        assert_eq!(human_duration(7200), "2 hours 0 min ");
        assert_eq!(human_duration(7320), "2 hours 2 mins ");
    }

    #[test]
    fn human_duration_days_and_years() {
        assert_eq!(human_duration(DAY), "1 day 0 hour ");
        assert_eq!(human_duration(2 * DAY + 3 * HOUR), "2 days 3 hours ");
        assert_eq!(human_duration(729 * DAY), "729 days 0 hour ");
        assert_eq!(human_duration(730 * DAY), "2 years 0 day ");
        assert_eq!(human_duration(731 * DAY), "2 years 1 day ");
    }

    #[test]
    fn clock_format() {
        assert_eq!(clock_duration(0), "00:00:00");
        assert_eq!(clock_duration(3661), "01:01:01");
        assert_eq!(clock_duration(100 * HOUR), "100:00:00");
    }

    #[test]
    fn elapsed_time_sentinels() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let start = now - Duration::minutes(5);

        assert_eq!(elapsed_time(None, Some(now), now), "N/A");
        assert_eq!(elapsed_time(None, None, now), "N/A");
        assert_eq!(elapsed_time(Some(start), None, now), "5 mins ");
        assert_eq!(
            elapsed_time(Some(start), Some(start + Duration::seconds(3661)), now),
            "1 hour 1 min "
        );
    }

    #[test]
    fn elapsed_time_clamps_inverted_stamps() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(
            elapsed_time(Some(now), Some(now - Duration::hours(1)), now),
            "0 sec "
        );
    }
}
