use chrono::{DateTime, Utc};
use thiserror::Error as ThisError;

use crate::PasswordWeakness;

/// Authentication errors. All of them are user facing.
#[derive(ThisError, Debug)]
pub enum AuthError {
    #[error("account not found")]
    AccountNotFound,

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("account locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    #[error("account inactive")]
    AccountInactive,

    #[error("password too weak: {0}")]
    WeakPassword(PasswordWeakness),

    #[error("password and confirmation do not match")]
    PasswordMismatch,

    #[error("an account with email {0} already exists")]
    DuplicateEmail(String),

    #[error("a national id is required for the temporary password")]
    MissingNationalId,

    #[error(transparent)]
    Error(#[from] anyhow::Error),
}
