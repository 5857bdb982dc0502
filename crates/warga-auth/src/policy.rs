use chrono::{DateTime, Duration, Utc};

use warga_data::User;

pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCKOUT_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Active,
    Locked { until: DateTime<Utc> },
}

/// Account lockout parameters. One policy is used for
/// every account and every storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout_duration: Duration::minutes(DEFAULT_LOCKOUT_MINUTES),
        }
    }
}

impl LockoutPolicy {
    /// A threshold below one would lock accounts that never failed.
    pub fn new(max_failed_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            max_failed_attempts: max_failed_attempts.max(1),
            lockout_duration,
        }
    }

    /// State of an account at a point in time. A lock is
    /// in effect while `now` is before `locked_until`.
    pub fn state(&self, user: &User, now: DateTime<Utc>) -> AccountState {
        match user.locked_until {
            Some(until) if now < until => AccountState::Locked { until },
            _ => AccountState::Active,
        }
    }

    /// Count a failed credential check. Returns true if the
    /// account got locked by it.
    pub fn register_failure(&self, user: &mut User, now: DateTime<Utc>) -> bool {
        user.failed_attempts = user.failed_attempts.saturating_add(1);
        if user.failed_attempts >= self.max_failed_attempts {
            user.locked_until = Some(now + self.lockout_duration);
            return true;
        }
        false
    }

    /// Clear all lock bookkeeping
    pub fn reset(&self, user: &mut User) {
        user.failed_attempts = 0;
        user.locked_until = None;
    }
}
