use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum NotifyError {
    #[error("no usable phone number for {0}")]
    NoPhone(String),

    #[error("message rejected with status {0}: {1}")]
    Rejected(u16, String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Error(#[from] anyhow::Error),
}
