// src/error.rs
use thiserror::Error;

/// Why a `Created at` value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFault {
    /// Does not match the configured grammar.
    InvalidFormat,
    /// Parsed, but outside the representable nanosecond range.
    OutOfBounds,
}

/// Every failure the report pipeline can surface to a user.
///
/// Each variant aborts only the stage that produced it; see
/// [`crate::report::build_report`] for which stages still render.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid date format in 'Created at' at line {line}: {value:?}")]
    InvalidTimestamp { line: u64, value: String },

    #[error("out of bounds datetime in 'Created at' at line {line}: {value:?}")]
    TimestampOutOfBounds { line: u64, value: String },

    #[error("missing column in data: '{0}'")]
    MissingField(String),

    #[error("no orders matched a recognized state code in 'Billing Province'")]
    NoStateData,

    #[error("an error occurred: {0}")]
    Unclassified(String),
}

impl ReportError {
    pub fn timestamp(line: u64, value: &str, fault: TimestampFault) -> Self {
        let value = value.to_string();
        match fault {
            TimestampFault::InvalidFormat => ReportError::InvalidTimestamp { line, value },
            TimestampFault::OutOfBounds => ReportError::TimestampOutOfBounds { line, value },
        }
    }

    pub fn missing(column: &str) -> Self {
        ReportError::MissingField(column.to_string())
    }

    /// True for both timestamp variants (the `ParseError` kind).
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidTimestamp { .. } | ReportError::TimestampOutOfBounds { .. }
        )
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Unclassified(format!("malformed CSV: {}", e))
    }
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Unclassified(e.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Unclassified(format!("invalid JSON: {}", e))
    }
}

impl From<serde_yaml::Error> for ReportError {
    fn from(e: serde_yaml::Error) -> Self {
        ReportError::Unclassified(format!("invalid config: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
