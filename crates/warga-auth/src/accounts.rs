use chrono::NaiveDate;

use warga_data::{Insert, Query, QueryError, Role, User, UserFilter};

use crate::{hash_password, validate_password_strength, AuthError};

/// Data for a new account
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub address: String,
    pub house_number: String,
    pub role: Role,
    pub membership_date: NaiveDate,
}

async fn insert_account<DB>(
    db: &DB,
    account: NewAccount,
    password_hash: String,
    temporary_password: bool,
) -> Result<User, AuthError>
where
    DB: Query<User, Filter = UserFilter> + Insert<User> + Send + Sync,
{
    let email = account.email.trim().to_string();
    let existing: Vec<User> = db
        .query(&UserFilter {
            email: Some(email.clone()),
            ..Default::default()
        })
        .await?;
    if !existing.is_empty() {
        return Err(AuthError::DuplicateEmail(email));
    }

    let user = User {
        name: account.name.trim().to_string(),
        email: email.clone(),
        phone: account.phone,
        national_id: account.national_id.trim().to_string(),
        address: account.address,
        house_number: account.house_number,
        role: account.role,
        active: true,
        membership_date: account.membership_date,
        password_hash,
        temporary_password,
        ..Default::default()
    };
    let user = db.insert(user).await.map_err(|e| {
        match e.downcast_ref::<QueryError>() {
            Some(QueryError::Duplicate(_)) => AuthError::DuplicateEmail(email.clone()),
            _ => AuthError::Error(e),
        }
    })?;
    tracing::info!(user_id = user.id, role = %user.role, "account registered");
    Ok(user)
}

/// Register an account. Its initial password is the
/// national id, marked as temporary.
pub async fn register_account<DB>(db: &DB, account: NewAccount) -> Result<User, AuthError>
where
    DB: Query<User, Filter = UserFilter> + Insert<User> + Send + Sync,
{
    let national_id = account.national_id.trim();
    if national_id.is_empty() {
        return Err(AuthError::MissingNationalId);
    }
    let password_hash = hash_password(national_id)?;
    insert_account(db, account, password_hash, true).await
}

/// Register an account with a chosen password, which
/// has to pass the strength rules.
pub async fn register_account_with_password<DB>(
    db: &DB,
    account: NewAccount,
    password: &str,
) -> Result<User, AuthError>
where
    DB: Query<User, Filter = UserFilter> + Insert<User> + Send + Sync,
{
    validate_password_strength(password)?;
    let password_hash = hash_password(password)?;
    insert_account(db, account, password_hash, false).await
}
