use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Payment, PaymentFilter, PaymentSummary, Query};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" | "" => Ok(Role::Member),
            other => Err(anyhow!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserFilter {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub role: Option<Role>,
    /// Users with failed attempts or a lock timestamp
    pub locked: Option<bool>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub address: String,
    pub house_number: String,
    pub role: Role,
    pub active: bool,
    pub membership_date: NaiveDate,

    pub password_hash: String,
    pub temporary_password: bool,
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Get all payments of the user
    pub async fn get_payments<DB>(&self, db: &DB) -> Result<Vec<Payment>>
    where
        DB: Query<Payment, Filter = PaymentFilter>,
    {
        let payments: Vec<Payment> = db
            .query(&PaymentFilter {
                user_id: Some(self.id),
                ..Default::default()
            })
            .await?;
        Ok(payments)
    }

    /// Summarize the payments of the user
    pub async fn payment_summary<DB>(&self, db: &DB) -> Result<PaymentSummary>
    where
        DB: Query<Payment, Filter = PaymentFilter>,
    {
        let payments = self.get_payments(db).await?;
        Ok(PaymentSummary::from_payments(&payments))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check if a filter selects this user. Backends without
    /// a query language use this.
    pub fn matches(&self, filter: &UserFilter) -> bool {
        if let Some(id) = filter.id {
            if self.id != id {
                return false;
            }
        }
        if let Some(name) = &filter.name {
            if !self.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(email) = &filter.email {
            if !self.email.eq_ignore_ascii_case(email) {
                return false;
            }
        }
        if let Some(national_id) = &filter.national_id {
            if &self.national_id != national_id {
                return false;
            }
        }
        if let Some(role) = filter.role {
            if self.role != role {
                return false;
            }
        }
        if let Some(locked) = filter.locked {
            let has_lock_state = self.failed_attempts > 0 || self.locked_until.is_some();
            if has_lock_state != locked {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" member ".parse::<Role>().unwrap(), Role::Member);
        assert_eq!("".parse::<Role>().unwrap(), Role::Member);
        assert!("treasurer".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_matches() {
        let user = User {
            id: 3,
            name: "Siti Rahma".to_string(),
            email: "siti@warga.test".to_string(),
            ..Default::default()
        };
        assert!(user.matches(&UserFilter::default()));
        assert!(user.matches(&UserFilter {
            name: Some("rahma".to_string()),
            ..Default::default()
        }));
        assert!(user.matches(&UserFilter {
            email: Some("SITI@warga.test".to_string()),
            ..Default::default()
        }));
        assert!(!user.matches(&UserFilter {
            id: Some(4),
            ..Default::default()
        }));
        assert!(!user.matches(&UserFilter {
            locked: Some(true),
            ..Default::default()
        }));

        let locked = User {
            failed_attempts: 2,
            ..user
        };
        assert!(locked.matches(&UserFilter {
            locked: Some(true),
            ..Default::default()
        }));
    }
}
