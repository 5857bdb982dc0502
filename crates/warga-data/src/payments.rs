use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error as ThisError;

use crate::{Insert, Query, Update, User, UserFilter};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Overdue => write!(f, "overdue"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" | "completed" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            other => Err(anyhow!("unknown payment status: {}", other)),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub id: Option<u32>,
    pub user_id: Option<u32>,
    pub status: Option<PaymentStatus>,
    pub date_before: Option<NaiveDate>,
    pub date_after: Option<NaiveDate>,
}

#[derive(Debug, Default, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: u32,
    pub user_id: u32,
    pub amount: f64,
    pub date: NaiveDate,
    pub status: PaymentStatus,
    pub method: String,
    pub reference: String,
}

impl Payment {
    /// Check if a filter selects this payment.
    /// Date bounds are inclusive.
    pub fn matches(&self, filter: &PaymentFilter) -> bool {
        if let Some(id) = filter.id {
            if self.id != id {
                return false;
            }
        }
        if let Some(user_id) = filter.user_id {
            if self.user_id != user_id {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if self.status != status {
                return false;
            }
        }
        if let Some(date_before) = filter.date_before {
            if self.date > date_before {
                return false;
            }
        }
        if let Some(date_after) = filter.date_after {
            if self.date < date_after {
                return false;
            }
        }
        true
    }
}

/// Payment figures derived for a user
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub total_paid: f64,
    pub outstanding: f64,
    /// Status of the most recent payment
    pub status: Option<PaymentStatus>,
}

impl PaymentSummary {
    pub fn from_payments(payments: &[Payment]) -> Self {
        let mut summary = PaymentSummary::default();
        for payment in payments {
            match payment.status {
                PaymentStatus::Paid => summary.total_paid += payment.amount,
                PaymentStatus::Pending | PaymentStatus::Overdue => {
                    summary.outstanding += payment.amount
                }
            }
        }
        summary.status = payments
            .iter()
            .max_by_key(|p| (p.date, p.id))
            .map(|p| p.status);
        summary
    }
}

#[derive(ThisError, Debug)]
pub enum PaymentError {
    #[error("payment references unknown user {0}")]
    UnknownUser(u32),

    #[error("payment amount must be positive, got {0}")]
    InvalidAmount(f64),

    #[error(transparent)]
    Error(#[from] anyhow::Error),
}

/// Record a payment for an existing user
pub async fn record_payment<DB>(db: &DB, payment: Payment) -> Result<Payment, PaymentError>
where
    DB: Query<User, Filter = UserFilter> + Insert<Payment> + Send + Sync,
{
    if !(payment.amount > 0.0) {
        return Err(PaymentError::InvalidAmount(payment.amount));
    }
    let users: Vec<User> = db
        .query(&UserFilter {
            id: Some(payment.user_id),
            ..Default::default()
        })
        .await?;
    if users.is_empty() {
        return Err(PaymentError::UnknownUser(payment.user_id));
    }

    let payment = db.insert(payment).await?;
    tracing::info!(
        payment_id = payment.id,
        user_id = payment.user_id,
        amount = payment.amount,
        "payment recorded"
    );
    Ok(payment)
}

/// Mark all pending payments dated before `today` as overdue.
/// Returns the number of updated payments.
pub async fn mark_overdue<DB>(db: &DB, today: NaiveDate) -> Result<usize>
where
    DB: Query<Payment, Filter = PaymentFilter> + Update<Payment> + Send + Sync,
{
    let pending: Vec<Payment> = db
        .query(&PaymentFilter {
            status: Some(PaymentStatus::Pending),
            date_before: today.pred_opt(),
            ..Default::default()
        })
        .await?;

    let count = pending.len();
    for payment in pending {
        db.update(Payment {
            status: PaymentStatus::Overdue,
            ..payment
        })
        .await?;
    }
    tracing::info!(count, %today, "marked payments overdue");
    Ok(count)
}
