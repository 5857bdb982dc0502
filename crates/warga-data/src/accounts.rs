use anyhow::Result;
use async_trait::async_trait;

use crate::{LoginAttempt, User, UserFilter};

/// What to store after looking at the current account record
#[derive(Debug)]
pub struct AccountChange<R> {
    /// Replacement for the account record
    pub user: Option<User>,
    /// Entry to append to the login history
    pub attempt: Option<LoginAttempt>,
    pub result: R,
}

impl<R> AccountChange<R> {
    /// Store nothing, just return `result`
    pub fn keep(result: R) -> Self {
        Self {
            user: None,
            attempt: None,
            result,
        }
    }

    pub fn store(self, user: User) -> Self {
        Self {
            user: Some(user),
            ..self
        }
    }

    pub fn append(self, attempt: LoginAttempt) -> Self {
        Self {
            attempt: Some(attempt),
            ..self
        }
    }
}

/// Read-modify-write of a single account.
///
/// The first account matching the filter is passed to `change`.
/// The returned record and history entry are stored together or
/// not at all, and no other writer can touch the account in between,
/// also not from another process sharing the datastore.
#[async_trait]
pub trait ModifyAccount {
    async fn modify_account<F, R>(&self, filter: &UserFilter, change: F) -> Result<R>
    where
        F: FnOnce(Option<User>) -> AccountChange<R> + Send,
        R: Send;
}
