//! Job status and level classification.
//!
//! All mappings are constant tables keyed by the single-character codes the
//! backup engine writes into the catalog. Lookups are total: an unrecognized
//! code yields the `Unknown` variant and a warning, never an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// Semantic grouping of job status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Waiting,
    Running,
    Completed,
    Failed,
    Canceled,
    Unknown,
}

/// Category → status code set. Codes not listed here classify as `Unknown`.
const CATEGORY_CODES: &[(StatusCategory, &[char])] = &[
    (StatusCategory::Running, &['R']),
    (
        StatusCategory::Waiting,
        &['F', 'S', 'M', 'm', 's', 'j', 'c', 'd', 't', 'C'],
    ),
    (StatusCategory::Completed, &['T']),
    (StatusCategory::Failed, &['f', 'E']),
    (StatusCategory::Canceled, &['A']),
];

const STATUS_DESCRIPTIONS: &[(char, &str)] = &[
    ('C', "created but not yet running"),
    ('R', "running"),
    ('B', "blocked"),
    ('T', "terminated normally"),
    ('E', "Job terminated in error"),
    ('e', "Non-fatal error"),
    ('f', "Fatal error"),
    ('D', "Verify differences"),
    ('A', "canceled by user"),
    ('F', "waiting on File daemon"),
    ('S', "waiting on the Storage daemon"),
    ('m', "waiting for new media"),
    ('M', "waiting for Mount"),
    ('s', "Waiting for storage resource"),
    ('j', "Waiting for job resource"),
    ('c', "Waiting for Client resource"),
    ('d', "Waiting for maximum jobs"),
    ('t', "Waiting for start time"),
    ('p', "Waiting for higher priority jobs to finish"),
];

const UNKNOWN_STATUS: &str = "Unknown status";

impl StatusCategory {
    /// Categories a job list can be filtered by, in display order.
    pub const FILTERABLE: [StatusCategory; 5] = [
        StatusCategory::Waiting,
        StatusCategory::Running,
        StatusCategory::Completed,
        StatusCategory::Failed,
        StatusCategory::Canceled,
    ];

    /// The fixed set of status codes belonging to this category.
    pub fn codes(self) -> &'static [char] {
        CATEGORY_CODES
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, codes)| *codes)
            .unwrap_or(&[])
    }

    /// Category of a single status code.
    pub fn of(code: char) -> Self {
        CATEGORY_CODES
            .iter()
            .find(|(_, codes)| codes.contains(&code))
            .map(|(category, _)| *category)
            .unwrap_or(StatusCategory::Unknown)
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::Waiting => "Waiting",
            StatusCategory::Running => "Running",
            StatusCategory::Completed => "Completed",
            StatusCategory::Failed => "Failed",
            StatusCategory::Canceled => "Canceled",
            StatusCategory::Unknown => "Unknown",
        }
    }

    pub fn icon(self) -> StatusIcon {
        match self {
            StatusCategory::Completed => StatusIcon::Ok,
            StatusCategory::Failed | StatusCategory::Canceled => StatusIcon::Error,
            StatusCategory::Waiting => StatusIcon::Waiting,
            StatusCategory::Running => StatusIcon::Running,
            StatusCategory::Unknown => StatusIcon::Unknown,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatusCategory {
    type Err = ReportError;

    /// Case-insensitive. `Unknown` is not a filterable category.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::FILTERABLE
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReportError::invalid("status", s))
    }
}

/// Display icon for a status category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIcon {
    Ok,
    Error,
    Waiting,
    Running,
    Unknown,
}

impl StatusIcon {
    /// Image served by the dashboard for this icon.
    pub fn file_name(self) -> &'static str {
        match self {
            StatusIcon::Ok => "s_ok.png",
            StatusIcon::Error => "s_error.gif",
            StatusIcon::Waiting => "waiting.png",
            StatusIcon::Running => "running.png",
            StatusIcon::Unknown => "unknown.png",
        }
    }
}

/// Result of classifying a raw status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub code: String,
    pub category: StatusCategory,
    pub icon: StatusIcon,
    pub description: &'static str,
}

/// Long human description of a status code, if the code is known.
pub fn describe(code: char) -> Option<&'static str> {
    STATUS_DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, description)| *description)
}

/// Classify a raw catalog status code.
///
/// Anything that is not exactly one known character is `Unknown`.
pub fn classify(code: &str) -> Classification {
    let single = single_char(code);
    let category = single.map(StatusCategory::of).unwrap_or(StatusCategory::Unknown);
    let description = single.and_then(describe);

    if description.is_none() {
        tracing::warn!(code = %code, "Unknown job status code");
    }

    Classification {
        code: code.to_string(),
        category,
        icon: category.icon(),
        description: description.unwrap_or(UNKNOWN_STATUS),
    }
}

/// Backup level of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobLevel {
    Full,
    Incremental,
    Differential,
    Base,
    Unknown,
}

const LEVELS: &[(char, JobLevel)] = &[
    ('F', JobLevel::Full),
    ('I', JobLevel::Incremental),
    ('D', JobLevel::Differential),
    ('B', JobLevel::Base),
];

/// Level codes include the verify levels, which have no `JobLevel` variant.
const LEVEL_DESCRIPTIONS: &[(char, &str)] = &[
    ('F', "Full backup"),
    ('I', "Incr (since last backup)"),
    ('D', "Diff (since last full backup)"),
    ('C', "verify from catalog"),
    ('V', "verify save (init DB)"),
    ('O', "verify Volume to catalog entries"),
    ('d', "verify Disk attributes to catalog"),
    ('A', "verify data on volume"),
    ('B', "Base level job"),
];

impl JobLevel {
    pub fn from_code(code: &str) -> Self {
        let level = single_char(code)
            .and_then(|c| LEVELS.iter().find(|(l, _)| *l == c))
            .map(|(_, level)| *level)
            .unwrap_or(JobLevel::Unknown);

        if level == JobLevel::Unknown {
            tracing::warn!(code = %code, "Unknown job level code");
        }
        level
    }

    /// Abbreviation used in job tables.
    pub fn short_label(self) -> &'static str {
        match self {
            JobLevel::Full => "Full",
            JobLevel::Incremental => "Incr",
            JobLevel::Differential => "Diff",
            JobLevel::Base => "Base",
            JobLevel::Unknown => "Unknown",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JobLevel::Full => "Full",
            JobLevel::Incremental => "Incremental",
            JobLevel::Differential => "Differential",
            JobLevel::Base => "Base",
            JobLevel::Unknown => "Unknown",
        }
    }
}

/// Long description of any level code, verify levels included.
pub fn describe_level(code: &str) -> Option<&'static str> {
    let c = single_char(code)?;
    LEVEL_DESCRIPTIONS
        .iter()
        .find(|(l, _)| *l == c)
        .map(|(_, description)| *description)
}

fn single_char(code: &str) -> Option<char> {
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_code_sets_match_catalog_table() {
        assert_eq!(StatusCategory::Running.codes(), &['R']);
        assert_eq!(
            StatusCategory::Waiting.codes(),
            &['F', 'S', 'M', 'm', 's', 'j', 'c', 'd', 't', 'C']
        );
        assert_eq!(StatusCategory::Completed.codes(), &['T']);
        assert_eq!(StatusCategory::Failed.codes(), &['f', 'E']);
        assert_eq!(StatusCategory::Canceled.codes(), &['A']);
        assert!(StatusCategory::Unknown.codes().is_empty());
    }

    #[test]
    fn every_mapped_code_round_trips_to_its_category() {
        for category in StatusCategory::FILTERABLE {
            for code in category.codes() {
                assert_eq!(StatusCategory::of(*code), category, "code {code}");
                assert_eq!(classify(&code.to_string()).category, category);
            }
        }
    }

    #[test]
    fn icons_follow_category() {
        assert_eq!(classify("T").icon, StatusIcon::Ok);
        assert_eq!(classify("E").icon, StatusIcon::Error);
        assert_eq!(classify("f").icon, StatusIcon::Error);
        assert_eq!(classify("A").icon, StatusIcon::Error);
        assert_eq!(classify("R").icon, StatusIcon::Running);
        assert_eq!(classify("m").icon, StatusIcon::Waiting);
    }

    #[test]
    fn classify_is_total() {
        for code in ["", "Z", "TT", "é", " ", "0"] {
            let c = classify(code);
            assert_eq!(c.category, StatusCategory::Unknown);
            assert_eq!(c.icon, StatusIcon::Unknown);
            assert_eq!(c.description, "Unknown status");
        }
    }

    #[test]
    fn described_codes_outside_categories_are_unknown_category() {
        let blocked = classify("B");
        assert_eq!(blocked.category, StatusCategory::Unknown);
        assert_eq!(blocked.icon, StatusIcon::Unknown);
        assert_eq!(blocked.description, "blocked");
    }

    #[test]
    fn long_descriptions() {
        assert_eq!(classify("T").description, "terminated normally");
        assert_eq!(classify("S").description, "waiting on the Storage daemon");
        assert_eq!(
            describe('p'),
            Some("Waiting for higher priority jobs to finish")
        );
    }

    #[test]
    fn parse_category_case_insensitive() {
        assert_eq!("failed".parse::<StatusCategory>().unwrap(), StatusCategory::Failed);
        assert_eq!("RUNNING".parse::<StatusCategory>().unwrap(), StatusCategory::Running);
        assert_eq!(" Waiting ".parse::<StatusCategory>().unwrap(), StatusCategory::Waiting);
        assert!("unknown".parse::<StatusCategory>().is_err());
        assert!("any".parse::<StatusCategory>().is_err());
    }

    #[test]
    fn levels() {
        assert_eq!(JobLevel::from_code("F").short_label(), "Full");
        assert_eq!(JobLevel::from_code("I").short_label(), "Incr");
        assert_eq!(JobLevel::from_code("D").name(), "Differential");
        assert_eq!(JobLevel::from_code("B"), JobLevel::Base);
        assert_eq!(JobLevel::from_code("V"), JobLevel::Unknown);
        assert_eq!(JobLevel::from_code(""), JobLevel::Unknown);
        assert_eq!(describe_level("V"), Some("verify save (init DB)"));
        assert_eq!(describe_level("X"), None);
    }
}
