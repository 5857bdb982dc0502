//! CSV export of users and payments. Credentials, national ids
//! and lock state never leave the database.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;
use csv::Writer;
use serde::Serialize;

use warga_data::{Payment, PaymentStatus, Role, User};

use crate::ImportError;

#[derive(Serialize)]
struct UserLine<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    address: &'a str,
    house_number: &'a str,
    role: Role,
    active: bool,
    membership_date: NaiveDate,
}

#[derive(Serialize)]
struct PaymentLine<'a> {
    email: &'a str,
    name: &'a str,
    amount: f64,
    date: NaiveDate,
    status: PaymentStatus,
    method: &'a str,
    reference: &'a str,
}

/// Write users as CSV with a header row
pub fn users<W: Write>(writer: W, users: &[User]) -> Result<usize, ImportError> {
    let mut wtr = Writer::from_writer(writer);
    for user in users {
        wtr.serialize(UserLine {
            name: &user.name,
            email: &user.email,
            phone: &user.phone,
            address: &user.address,
            house_number: &user.house_number,
            role: user.role,
            active: user.active,
            membership_date: user.membership_date,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(users.len())
}

/// Write payments as CSV, with the owner's email and name.
/// The output can be imported again.
pub fn payments<W: Write>(
    writer: W,
    payments: &[Payment],
    users: &[User],
) -> Result<usize, ImportError> {
    let owners: HashMap<u32, &User> = users.iter().map(|u| (u.id, u)).collect();

    let mut wtr = Writer::from_writer(writer);
    for payment in payments {
        let (email, name) = owners
            .get(&payment.user_id)
            .map(|u| (u.email.as_str(), u.name.as_str()))
            .unwrap_or_default();
        wtr.serialize(PaymentLine {
            email,
            name,
            amount: payment.amount,
            date: payment.date,
            status: payment.status,
            method: &payment.method,
            reference: &payment.reference,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(payments.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siti() -> User {
        User {
            id: 1,
            name: "Siti Rahma".to_string(),
            email: "siti@warga.test".to_string(),
            phone: "081211112222".to_string(),
            national_id: "3174015501900001".to_string(),
            address: "Jl. Melati 1".to_string(),
            house_number: "A-1".to_string(),
            active: true,
            membership_date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            password_hash: "$argon2id$secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_export_users() {
        let mut out = vec![];
        let count = users(&mut out, &[siti()]).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "name,email,phone,address,house_number,role,active,membership_date\n\
             Siti Rahma,siti@warga.test,081211112222,Jl. Melati 1,A-1,member,true,2023-01-15\n"
        );
        assert!(!text.contains("3174015501900001"));
        assert!(!text.contains("argon2"));
    }

    #[test]
    fn test_export_payments_reimport() {
        let payment = Payment {
            id: 7,
            user_id: 1,
            amount: 50000.5,
            date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            status: PaymentStatus::Paid,
            method: "transfer".to_string(),
            reference: "TRX-1".to_string(),
        };
        let mut out = vec![];
        payments(&mut out, &[payment], &[siti()]).unwrap();

        let rows = crate::payments::parse(out.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);
        let record = rows[0].as_ref().unwrap();
        assert_eq!(record.email, "siti@warga.test");
        assert_eq!(record.amount, 50000.5);
        assert_eq!(record.status, PaymentStatus::Paid);
        assert_eq!(record.reference, "TRX-1");
    }
}
