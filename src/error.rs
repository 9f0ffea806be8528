//! Error types for report assembly and catalog access.

use thiserror::Error;

/// Result type alias for catalog and report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that abort a report computation.
///
/// Unknown status or level codes are not errors: they are rendered as
/// "Unknown" and logged with `tracing::warn!`.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Catalog access or execution failed (includes query timeouts)
    #[error("Catalog query failed: {0}")]
    Query(String),

    /// A required request parameter was absent or blank
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A request parameter was outside its allow-list
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// No client with the given id exists in the catalog
    #[error("Client not found: {0}")]
    ClientNotFound(i64),

    /// The console binary could not be run or timed out
    #[error("Console command failed: {0}")]
    Console(String),
}

impl ReportError {
    /// Wrap an engine error, keeping its message for the caller.
    pub fn query(e: impl std::fmt::Display) -> Self {
        Self::Query(e.to_string())
    }

    pub fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }

    /// True when the caller supplied bad input (as opposed to a backend failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidParameter { .. } | Self::ClientNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_distinguished_from_backend_failures() {
        assert!(ReportError::MissingParameter("backupjob_name").is_client_error());
        assert!(ReportError::invalid("jobs_per_page", "7").is_client_error());
        assert!(!ReportError::Query("disk I/O error".into()).is_client_error());
        assert!(!ReportError::Console("timed out".into()).is_client_error());
    }

    #[test]
    fn query_error_carries_engine_message() {
        let err = ReportError::Query("no such table: Job".into());
        assert_eq!(err.to_string(), "Catalog query failed: no such table: Job");
    }
}
