use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Why an authentication attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FailureReason {
    UserNotFound,
    InvalidPassword,
    AccountLocked,
    AccountInactive,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::UserNotFound => write!(f, "user not found"),
            FailureReason::InvalidPassword => write!(f, "invalid password"),
            FailureReason::AccountLocked => write!(f, "account locked"),
            FailureReason::AccountInactive => write!(f, "account inactive"),
        }
    }
}

/// A login history entry. Entries are append only: backends
/// provide `Insert` and `Query` for them, nothing else.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: u32,
    pub attempted_at: DateTime<Utc>,
    pub user_id: Option<u32>,
    pub email: String,
    pub success: bool,
    pub reason: Option<FailureReason>,
    pub origin: Option<String>,
}

impl LoginAttempt {
    pub fn succeeded(user_id: u32, email: &str, at: DateTime<Utc>) -> Self {
        Self {
            attempted_at: at,
            user_id: Some(user_id),
            email: email.to_string(),
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(
        user_id: Option<u32>,
        email: &str,
        reason: FailureReason,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            attempted_at: at,
            user_id,
            email: email.to_string(),
            success: false,
            reason: Some(reason),
            ..Default::default()
        }
    }

    pub fn with_origin(self, origin: Option<String>) -> Self {
        Self { origin, ..self }
    }

    pub fn matches(&self, filter: &LoginAttemptFilter) -> bool {
        if let Some(user_id) = filter.user_id {
            if self.user_id != Some(user_id) {
                return false;
            }
        }
        if let Some(email) = &filter.email {
            if !self.email.eq_ignore_ascii_case(email) {
                return false;
            }
        }
        if let Some(success) = filter.success {
            if self.success != success {
                return false;
            }
        }
        true
    }
}

/// Filter login history. Results are ordered newest first.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginAttemptFilter {
    pub user_id: Option<u32>,
    pub email: Option<String>,
    pub success: Option<bool>,
    pub limit: Option<u32>,
}
