use std::fmt;

use thiserror::Error as ThisError;

/// Why a row could not be imported
#[derive(ThisError, Debug)]
pub enum ImportError {
    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("invalid email address {0:?}")]
    InvalidEmail(String),

    #[error("invalid date {0:?}, expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidDate(String),

    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("invalid phone number {0:?}")]
    InvalidPhone(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("no user with email {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Error(#[from] anyhow::Error),
}

/// A failed row, `line` is the line in the input file
#[derive(Debug)]
pub struct RowError {
    pub line: u64,
    pub error: ImportError,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Outcome of an import run
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: Vec<RowError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
