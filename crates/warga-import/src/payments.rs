use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use warga_data::{
    record_payment, Insert, Payment, PaymentError, PaymentStatus, Query, User, UserFilter,
};

use crate::{fields, ImportError, ImportReport, RowError};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PaymentRow {
    email: String,
    amount: String,
    date: String,
    status: String,
    method: String,
    reference: String,
}

/// A validated payment row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentRecord {
    pub line: u64,
    pub email: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub status: PaymentStatus,
    pub method: String,
    pub reference: String,
}

impl PaymentRecord {
    fn from_row(line: u64, row: PaymentRow) -> Result<Self, ImportError> {
        let status = if row.status.trim().is_empty() {
            PaymentStatus::Paid
        } else {
            row.status
                .parse::<PaymentStatus>()
                .map_err(|e| ImportError::InvalidValue(e.to_string()))?
        };
        let date = fields::date(&row.date)?.ok_or(ImportError::MissingField("date"))?;
        Ok(Self {
            line,
            email: fields::email(&row.email)?,
            amount: fields::amount(&row.amount)?,
            date,
            status,
            method: row.method.trim().to_string(),
            reference: row.reference.trim().to_string(),
        })
    }
}

/// Parse a payment CSV file with a header row:
/// email,amount,date,status,method,reference
pub fn parse<R: Read>(reader: R) -> Result<Vec<Result<PaymentRecord, RowError>>, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    fields::normalize_headers(&mut rdr)?;
    let headers = rdr.headers()?.clone();

    let mut rows = vec![];
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row = record
            .deserialize::<PaymentRow>(Some(&headers))
            .map_err(ImportError::from)
            .and_then(|row| PaymentRecord::from_row(line, row))
            .map_err(|error| RowError { line, error });
        rows.push(row);
    }
    Ok(rows)
}

async fn import_payment<DB>(db: &DB, record: PaymentRecord) -> Result<Payment, ImportError>
where
    DB: Query<User, Filter = UserFilter> + Insert<Payment> + Send + Sync,
{
    let users: Vec<User> = db
        .query(&UserFilter {
            email: Some(record.email.clone()),
            ..Default::default()
        })
        .await?;
    let user = users
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::UnknownUser(record.email.clone()))?;

    let payment = Payment {
        user_id: user.id,
        amount: record.amount,
        date: record.date,
        status: record.status,
        method: record.method,
        reference: record.reference,
        ..Default::default()
    };
    record_payment(db, payment).await.map_err(|e| match e {
        PaymentError::Error(e) => ImportError::Error(e),
        other => ImportError::InvalidValue(other.to_string()),
    })
}

/// Record payments for parsed rows, resolving users by email
pub async fn import_payments<DB>(
    db: &DB,
    rows: Vec<Result<PaymentRecord, RowError>>,
) -> ImportReport
where
    DB: Query<User, Filter = UserFilter> + Insert<Payment> + Send + Sync,
{
    let mut report = ImportReport::default();
    for row in rows {
        let record = match row {
            Ok(record) => record,
            Err(err) => {
                report.failed.push(err);
                continue;
            }
        };
        let line = record.line;
        match import_payment(db, record).await {
            Ok(payment) => {
                tracing::debug!(line, payment_id = payment.id, "imported payment");
                report.imported += 1;
            }
            Err(error) => report.failed.push(RowError { line, error }),
        }
    }
    tracing::info!(
        imported = report.imported,
        failed = report.failed.len(),
        "payment import finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use warga_data::PaymentFilter;
    use warga_db::Connection;

    const CSV: &str = "\
email,amount,date,status,method,reference
siti@warga.test,50000,2024-01-05,completed,transfer,TRX-1
siti@warga.test,\"50000,5\",05/02/2024,,cash,
siti@warga.test,50000,2024-03-05,pending,,

nobody@warga.test,50000,2024-01-05,paid,,
siti@warga.test,-5,2024-01-05,paid,,
siti@warga.test,50000,,paid,,
";

    #[test]
    fn test_parse_payments() {
        let rows = parse(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 6);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.status, PaymentStatus::Paid);
        assert_eq!(first.reference, "TRX-1");

        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.amount, 50000.5);
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
        assert_eq!(second.status, PaymentStatus::Paid);

        assert!(rows[3].is_ok());
        assert!(matches!(
            rows[4].as_ref().unwrap_err().error,
            ImportError::InvalidAmount(_)
        ));
        assert!(matches!(
            rows[5].as_ref().unwrap_err().error,
            ImportError::MissingField("date")
        ));
    }

    #[tokio::test]
    async fn test_import_payments() {
        let db = Connection::open_test().await;
        let user = db
            .insert(User {
                name: "Siti".to_string(),
                email: "siti@warga.test".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let rows = parse(CSV.as_bytes()).unwrap();
        let report = import_payments(&db, rows).await;
        assert_eq!(report.imported, 3);
        assert_eq!(report.failed.len(), 3);
        assert!(matches!(
            report.failed[0].error,
            ImportError::UnknownUser(_)
        ));

        let payments: Vec<Payment> = db
            .query(&PaymentFilter {
                user_id: Some(user.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payments.len(), 3);
        let summary = user.payment_summary(&db).await.unwrap();
        assert_eq!(summary.total_paid, 100000.5);
        assert_eq!(summary.outstanding, 50000.0);
    }
}
