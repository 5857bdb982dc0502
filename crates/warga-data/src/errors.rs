use thiserror::Error as ThisError;

/// Storage errors shared by all backends
#[derive(Debug, Clone, ThisError)]
pub enum QueryError {
    #[error("Not found")]
    NotFound,
    #[error("Ambiguous results ({0:?}) for query")]
    Ambiguous(usize),
    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}
