use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use warga_auth::{register_account, AuthError, NewAccount};
use warga_data::{Insert, Query, Role, User, UserFilter};

use crate::{fields, ImportError, ImportReport, RowError};

/// A row as found in the file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserRow {
    name: String,
    email: String,
    phone: String,
    national_id: String,
    address: String,
    house_number: String,
    role: String,
    membership_date: String,
}

/// A validated user row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub line: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub address: String,
    pub house_number: String,
    pub role: Role,
    pub membership_date: Option<NaiveDate>,
}

impl UserRecord {
    fn from_row(line: u64, row: UserRow) -> Result<Self, ImportError> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| ImportError::InvalidValue(e.to_string()))?;
        Ok(Self {
            line,
            name: fields::required(&row.name, "name")?,
            email: fields::email(&row.email)?,
            phone: fields::phone(&row.phone)?,
            national_id: fields::required(&row.national_id, "national_id")?,
            address: row.address.trim().to_string(),
            house_number: row.house_number.trim().to_string(),
            role,
            membership_date: fields::date(&row.membership_date)?,
        })
    }

    pub fn into_account(self, today: NaiveDate) -> NewAccount {
        NewAccount {
            name: self.name,
            email: self.email,
            phone: self.phone,
            national_id: self.national_id,
            address: self.address,
            house_number: self.house_number,
            role: self.role,
            membership_date: self.membership_date.unwrap_or(today),
        }
    }
}

/// Parse a user CSV file with a header row:
/// name,email,phone,national_id,address,house_number,role,membership_date
///
/// Columns may come in any order, missing optional columns are empty.
pub fn parse<R: Read>(reader: R) -> Result<Vec<Result<UserRecord, RowError>>, ImportError> {
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
            .deserialize::<UserRow>(Some(&headers))
            .map_err(ImportError::from)
            .and_then(|row| UserRecord::from_row(line, row))
            .map_err(|error| RowError { line, error });
        rows.push(row);
    }
    Ok(rows)
}

/// Register accounts for parsed rows. Failed rows and
/// already known emails end up in the report.
pub async fn import_users<DB>(
    db: &DB,
    rows: Vec<Result<UserRecord, RowError>>,
    today: NaiveDate,
) -> ImportReport
where
    DB: Query<User, Filter = UserFilter> + Insert<User> + Send + Sync,
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
        match register_account(db, record.into_account(today)).await {
            Ok(user) => {
                tracing::debug!(line, user_id = user.id, "imported user");
                report.imported += 1;
            }
            Err(err) => {
                let error = match err {
                    AuthError::Error(e) => ImportError::Error(e),
                    other => ImportError::InvalidValue(other.to_string()),
                };
                report.failed.push(RowError { line, error });
            }
        }
    }
    tracing::info!(
        imported = report.imported,
        failed = report.failed.len(),
        "user import finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;
    use warga_auth::verify_password;
    use warga_db::Connection;

    const CSV: &str = "\
Name,Email,Phone,National_ID,Address,House_Number,Role,Membership_Date
Siti Rahma,siti@warga.test,0812-1111-2222,3174015501900001,Jl. Melati 1,A-1,member,2023-01-15
Budi Santoso,BUDI@warga.test,,3174010101800002,Jl. Melati 2,A-2,admin,15/02/2023
,nobody@warga.test,,1,,,,
Rina,rina@warga,,2,,,,
Agus,agus@warga.test,,3,,,treasurer,
";

    #[test]
    fn test_parse_users() {
        let rows = parse(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);

        let siti = rows[0].as_ref().unwrap();
        assert_eq!(siti.line, 2);
        assert_eq!(siti.name, "Siti Rahma");
        assert_eq!(siti.phone, "081211112222");
        assert_eq!(siti.role, Role::Member);
        assert_eq!(
            siti.membership_date,
            Some(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap())
        );

        let budi = rows[1].as_ref().unwrap();
        assert_eq!(budi.email, "budi@warga.test");
        assert_eq!(budi.role, Role::Admin);

        let missing_name = rows[2].as_ref().unwrap_err();
        assert_eq!(missing_name.line, 4);
        assert!(matches!(missing_name.error, ImportError::MissingField("name")));
        assert!(matches!(
            rows[3].as_ref().unwrap_err().error,
            ImportError::InvalidEmail(_)
        ));
        assert!(matches!(
            rows[4].as_ref().unwrap_err().error,
            ImportError::InvalidValue(_)
        ));
    }

    #[test]
    fn test_parse_users_file() {
        let file = File::open("test/users.csv").unwrap();
        let rows = parse(file).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn test_import_users() {
        let db = Connection::open_test().await;
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let rows = parse(CSV.as_bytes()).unwrap();
        let report = import_users(&db, rows, today).await;
        assert_eq!(report.imported, 2);
        assert_eq!(report.failed.len(), 3);

        // Importing again skips known emails
        let rows = parse(CSV.as_bytes()).unwrap();
        let report = import_users(&db, rows, today).await;
        assert_eq!(report.imported, 0);
        assert_eq!(report.failed.len(), 5);
        assert!(report.failed[0].to_string().starts_with("line 2: "));

        let users: Vec<User> = db.query(&UserFilter::default()).await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[0].temporary_password);
        assert!(verify_password("3174015501900001", &users[0].password_hash));
    }
}
