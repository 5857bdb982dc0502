use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use warga_data::{
    AccountChange, FailureReason, LoginAttempt, ModifyAccount, Query, Role, User, UserFilter,
};

use crate::{
    hash_password, validate_password_strength, verify_password, AccountState, AuthError,
    LockoutPolicy,
};

/// What a caller presents to log in
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Network origin or client name, recorded in the login history
    pub origin: Option<String>,
}

/// The authenticated account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// The password still is the initial one and should be changed
    pub temporary_password: bool,
}

impl From<&User> for AccountSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            temporary_password: user.temporary_password,
        }
    }
}

/// A password change request by the account holder
#[derive(Debug, Clone, Default)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

fn by_id(user_id: u32) -> UserFilter {
    UserFilter {
        id: Some(user_id),
        ..Default::default()
    }
}

/// Checks credentials and keeps the lockout bookkeeping.
///
/// Each account change runs through `ModifyAccount`, so the
/// read-modify-write of an account record and its login history
/// entry cannot interleave with another attempt.
#[derive(Debug, Default)]
pub struct Authenticator {
    policy: LockoutPolicy,
}

impl Authenticator {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Authenticate an account at `now`.
    ///
    /// Every call appends exactly one entry to the login history.
    /// A locked account is rejected without looking at the password.
    /// An inactive account is rejected after the password check and
    /// does not count as a failure.
    pub async fn authenticate<DB>(
        &self,
        db: &DB,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<AccountSummary, AuthError>
    where
        DB: ModifyAccount + Send + Sync,
    {
        let email = credentials.email.trim();
        let filter = UserFilter {
            email: Some(email.to_string()),
            ..Default::default()
        };
        let origin = &credentials.origin;
        let policy = &self.policy;

        db.modify_account(&filter, |user| {
            let failed = |user_id: Option<u32>,
                          reason: FailureReason,
                          error: AuthError|
             -> AccountChange<Result<AccountSummary, AuthError>> {
                let attempt =
                    LoginAttempt::failed(user_id, email, reason, now).with_origin(origin.clone());
                AccountChange::keep(Err(error)).append(attempt)
            };

            let Some(mut user) = user.filter(|_| !email.is_empty()) else {
                tracing::info!(email, "login for unknown account");
                return failed(None, FailureReason::UserNotFound, AuthError::AccountNotFound);
            };

            if let AccountState::Locked { until } = policy.state(&user, now) {
                tracing::info!(user_id = user.id, %until, "login for locked account");
                return failed(
                    Some(user.id),
                    FailureReason::AccountLocked,
                    AuthError::AccountLocked { until },
                );
            }

            // The lock has run out, start counting from zero
            if user.locked_until.is_some() {
                tracing::info!(user_id = user.id, "lockout expired");
                policy.reset(&mut user);
            }

            if !verify_password(&credentials.password, &user.password_hash) {
                let locked = policy.register_failure(&mut user, now);
                if locked {
                    tracing::warn!(
                        user_id = user.id,
                        failed_attempts = user.failed_attempts,
                        until = ?user.locked_until,
                        "account locked"
                    );
                } else {
                    tracing::info!(
                        user_id = user.id,
                        failed_attempts = user.failed_attempts,
                        "invalid password"
                    );
                }
                let user_id = Some(user.id);
                return failed(user_id, FailureReason::InvalidPassword, AuthError::InvalidCredential)
                    .store(user);
            }

            if !user.active {
                tracing::info!(user_id = user.id, "login for inactive account");
                // Keeps the reset of an expired lock
                let user_id = Some(user.id);
                return failed(user_id, FailureReason::AccountInactive, AuthError::AccountInactive)
                    .store(user);
            }

            user.failed_attempts = 0;
            user.last_login_at = Some(now);
            tracing::info!(user_id = user.id, "login");
            let attempt = LoginAttempt::succeeded(user.id, email, now).with_origin(origin.clone());
            AccountChange::keep(Ok(AccountSummary::from(&user)))
                .append(attempt)
                .store(user)
        })
        .await?
    }

    /// Change the password of an account. Nothing is stored
    /// unless every check passes. Clears the temporary flag.
    pub async fn change_password<DB>(
        &self,
        db: &DB,
        user_id: u32,
        change: &PasswordChange,
    ) -> Result<User, AuthError>
    where
        DB: ModifyAccount + Send + Sync,
    {
        if change.new != change.confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password_strength(&change.new)?;

        let user = db
            .modify_account(&by_id(user_id), |user| {
                let Some(mut user) = user else {
                    return AccountChange::keep(Err(AuthError::AccountNotFound));
                };
                if !verify_password(&change.current, &user.password_hash) {
                    return AccountChange::keep(Err(AuthError::InvalidCredential));
                }
                match hash_password(&change.new) {
                    Ok(hash) => {
                        user.password_hash = hash;
                        user.temporary_password = false;
                        AccountChange::keep(Ok(user.clone())).store(user)
                    }
                    Err(e) => AccountChange::keep(Err(e.into())),
                }
            })
            .await??;
        tracing::info!(user_id, "password changed");
        Ok(user)
    }

    /// Lift the lock of one account
    pub async fn unlock<DB>(&self, db: &DB, user_id: u32) -> Result<User, AuthError>
    where
        DB: ModifyAccount + Send + Sync,
    {
        let user = db
            .modify_account(&by_id(user_id), |user| match user {
                Some(mut user) => {
                    self.policy.reset(&mut user);
                    AccountChange::keep(Ok(user.clone())).store(user)
                }
                None => AccountChange::keep(Err(AuthError::AccountNotFound)),
            })
            .await??;
        tracing::info!(user_id, "account unlocked");
        Ok(user)
    }

    /// Lift the locks of all accounts. Returns the number
    /// of accounts touched.
    pub async fn unlock_all<DB>(&self, db: &DB) -> Result<usize, AuthError>
    where
        DB: Query<User, Filter = UserFilter> + ModifyAccount + Send + Sync,
    {
        let users: Vec<User> = db
            .query(&UserFilter {
                locked: Some(true),
                ..Default::default()
            })
            .await?;
        let mut count = 0;
        for user in users {
            let unlocked = db
                .modify_account(&by_id(user.id), |user| match user {
                    // Skip accounts another writer removed or unlocked meanwhile
                    Some(mut user) if user.failed_attempts > 0 || user.locked_until.is_some() => {
                        self.policy.reset(&mut user);
                        AccountChange::keep(true).store(user)
                    }
                    _ => AccountChange::keep(false),
                })
                .await?;
            if unlocked {
                count += 1;
            }
        }
        tracing::info!(count, "all accounts unlocked");
        Ok(count)
    }

    /// Administrative reset: the password becomes the national id
    /// again and is marked temporary.
    pub async fn reset_password<DB>(&self, db: &DB, user_id: u32) -> Result<User, AuthError>
    where
        DB: ModifyAccount + Send + Sync,
    {
        let user = db
            .modify_account(&by_id(user_id), |user| {
                let Some(mut user) = user else {
                    return AccountChange::keep(Err(AuthError::AccountNotFound));
                };
                if user.national_id.trim().is_empty() {
                    return AccountChange::keep(Err(AuthError::MissingNationalId));
                }
                match hash_password(user.national_id.trim()) {
                    Ok(hash) => {
                        user.password_hash = hash;
                        user.temporary_password = true;
                        AccountChange::keep(Ok(user.clone())).store(user)
                    }
                    Err(e) => AccountChange::keep(Err(e.into())),
                }
            })
            .await??;
        tracing::info!(user_id, "password reset to temporary password");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{register_account, NewAccount};

    use warga_data::{LoginAttemptFilter, Retrieve, Store, Update};
    use warga_db::Connection;
    use warga_file::FileStore;

    const NATIONAL_ID: &str = "3174015501900001";
    const EMAIL: &str = "siti@warga.test";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            email: EMAIL.to_string(),
            password: password.to_string(),
            origin: Some("test".to_string()),
        }
    }

    async fn register<DB: Store>(db: &DB) -> User {
        register_account(
            db,
            NewAccount {
                name: "Siti Rahma".to_string(),
                email: EMAIL.to_string(),
                national_id: NATIONAL_ID.to_string(),
                house_number: "A-3".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    async fn history<DB: Store>(db: &DB) -> Vec<LoginAttempt> {
        db.query(&LoginAttemptFilter::default()).await.unwrap()
    }

    async fn lockout_scenario<DB: Store>(db: &DB) {
        let auth = Authenticator::default();
        let user = register(db).await;

        // Four failures keep the account active
        for _ in 0..4 {
            let result = auth.authenticate(db, &credentials("wrong"), now()).await;
            assert!(matches!(result, Err(AuthError::InvalidCredential)));
        }
        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.failed_attempts, 4);
        assert_eq!(stored.locked_until, None);

        // The fifth one locks it
        let result = auth.authenticate(db, &credentials("wrong"), now()).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.failed_attempts, 5);
        assert_eq!(stored.locked_until, Some(now() + Duration::minutes(15)));

        // The correct password is rejected inside the window
        let later = now() + Duration::minutes(14);
        let result = auth.authenticate(db, &credentials(NATIONAL_ID), later).await;
        match result {
            Err(AuthError::AccountLocked { until }) => {
                assert_eq!(until, now() + Duration::minutes(15))
            }
            other => panic!("expected locked account, got {:?}", other),
        }
        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.failed_attempts, 5);

        // After the window the correct password works again
        let after = now() + Duration::minutes(15);
        let summary = auth
            .authenticate(db, &credentials(NATIONAL_ID), after)
            .await
            .unwrap();
        assert_eq!(summary.id, user.id);
        assert!(summary.temporary_password);
        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.failed_attempts, 0);
        assert_eq!(stored.locked_until, None);
        assert_eq!(stored.last_login_at, Some(after));

        // One entry per attempt
        let entries = history(db).await;
        assert_eq!(entries.len(), 7);
        assert!(entries[0].success);
        assert_eq!(entries[1].reason, Some(FailureReason::AccountLocked));
        assert_eq!(entries[2].reason, Some(FailureReason::InvalidPassword));
        assert_eq!(entries[1].origin.as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn test_lockout_sqlite() {
        let db = Connection::open_test().await;
        lockout_scenario(&db).await;
    }

    #[tokio::test]
    async fn test_lockout_file_store() {
        let db = FileStore::open_test().await;
        lockout_scenario(&db).await;
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        let result = auth.authenticate(&db, &credentials("whatever"), now()).await;
        assert!(matches!(result, Err(AuthError::AccountNotFound)));

        let entries = history(&db).await;
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
        assert_eq!(entries[0].user_id, None);
        assert_eq!(entries[0].email, EMAIL);
        assert_eq!(entries[0].reason, Some(FailureReason::UserNotFound));
    }

    #[tokio::test]
    async fn test_email_is_case_insensitive() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        register(&db).await;
        let credentials = Credentials {
            email: " SITI@warga.test ".to_string(),
            password: NATIONAL_ID.to_string(),
            origin: None,
        };
        assert!(auth.authenticate(&db, &credentials, now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_success_resets_failed_attempts() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        let user = register(&db).await;
        db.update(User {
            failed_attempts: 3,
            ..user.clone()
        })
        .await
        .unwrap();

        auth.authenticate(&db, &credentials(NATIONAL_ID), now())
            .await
            .unwrap();
        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.failed_attempts, 0);
        assert_eq!(stored.last_login_at, Some(now()));
    }

    #[tokio::test]
    async fn test_four_failures_then_wrong_password_locks() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        let user = register(&db).await;
        db.update(User {
            failed_attempts: 4,
            ..user.clone()
        })
        .await
        .unwrap();

        let result = auth.authenticate(&db, &credentials("Wrong123"), now()).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.locked_until, Some(now() + Duration::minutes(15)));

        let result = auth
            .authenticate(&db, &credentials(NATIONAL_ID), now())
            .await;
        assert!(matches!(result, Err(AuthError::AccountLocked { .. })));
    }

    #[tokio::test]
    async fn test_expired_lock_counts_from_zero() {
        let db = Connection::open_test().await;
        let auth = Authenticator::new(LockoutPolicy::new(3, Duration::minutes(30)));
        let user = register(&db).await;
        db.update(User {
            failed_attempts: 3,
            locked_until: Some(now()),
            ..user.clone()
        })
        .await
        .unwrap();

        let result = auth.authenticate(&db, &credentials("wrong"), now()).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.failed_attempts, 1);
        assert_eq!(stored.locked_until, None);
    }

    #[tokio::test]
    async fn test_inactive_account() {
        let db = FileStore::open_test().await;
        let auth = Authenticator::default();
        let user = register(&db).await;
        db.update(User {
            active: false,
            ..user.clone()
        })
        .await
        .unwrap();

        let result = auth.authenticate(&db, &credentials("wrong"), now()).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
        let result = auth
            .authenticate(&db, &credentials(NATIONAL_ID), now())
            .await;
        assert!(matches!(result, Err(AuthError::AccountInactive)));

        let stored: User = db.retrieve(user.id).await.unwrap();
        assert_eq!(stored.failed_attempts, 1);
        assert_eq!(stored.last_login_at, None);

        let entries = history(&db).await;
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].success);
        assert_eq!(entries[0].reason, Some(FailureReason::AccountInactive));
        assert_eq!(entries[0].user_id, Some(user.id));
    }

    #[tokio::test]
    async fn test_change_password() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        let user = register(&db).await;

        let rejected = [
            (
                PasswordChange {
                    current: NATIONAL_ID.to_string(),
                    new: "Sandi2024".to_string(),
                    confirm: "Sandi2025".to_string(),
                },
                "mismatch",
            ),
            (
                PasswordChange {
                    current: NATIONAL_ID.to_string(),
                    new: "sandi2024".to_string(),
                    confirm: "sandi2024".to_string(),
                },
                "weak",
            ),
            (
                PasswordChange {
                    current: "not-the-password".to_string(),
                    new: "Sandi2024".to_string(),
                    confirm: "Sandi2024".to_string(),
                },
                "credential",
            ),
        ];
        for (change, kind) in rejected {
            let result = auth.change_password(&db, user.id, &change).await;
            match (kind, result) {
                ("mismatch", Err(AuthError::PasswordMismatch)) => {}
                ("weak", Err(AuthError::WeakPassword(_))) => {}
                ("credential", Err(AuthError::InvalidCredential)) => {}
                (kind, other) => panic!("{}: unexpected {:?}", kind, other),
            }
            let stored: User = db.retrieve(user.id).await.unwrap();
            assert_eq!(stored.password_hash, user.password_hash);
            assert!(stored.temporary_password);
        }

        let changed = auth
            .change_password(
                &db,
                user.id,
                &PasswordChange {
                    current: NATIONAL_ID.to_string(),
                    new: "Sandi2024".to_string(),
                    confirm: "Sandi2024".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(!changed.temporary_password);

        let result = auth
            .authenticate(&db, &credentials(NATIONAL_ID), now())
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
        let summary = auth
            .authenticate(&db, &credentials("Sandi2024"), now())
            .await
            .unwrap();
        assert!(!summary.temporary_password);
    }

    #[tokio::test]
    async fn test_change_password_unknown_account() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        let result = auth
            .change_password(
                &db,
                99,
                &PasswordChange {
                    current: "x".to_string(),
                    new: "Sandi2024".to_string(),
                    confirm: "Sandi2024".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_unlock_and_unlock_all() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        let user = register(&db).await;
        let other = register_account(
            &db,
            NewAccount {
                name: "Budi".to_string(),
                email: "budi@warga.test".to_string(),
                national_id: "3174010101800002".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        for u in [&user, &other] {
            db.update(User {
                failed_attempts: 5,
                locked_until: Some(now() + Duration::minutes(15)),
                ..u.clone()
            })
            .await
            .unwrap();
        }

        let unlocked = auth.unlock(&db, user.id).await.unwrap();
        assert_eq!(unlocked.failed_attempts, 0);
        assert_eq!(unlocked.locked_until, None);
        assert!(auth
            .authenticate(&db, &credentials(NATIONAL_ID), now())
            .await
            .is_ok());

        assert_eq!(auth.unlock_all(&db).await.unwrap(), 1);
        let stored: User = db.retrieve(other.id).await.unwrap();
        assert_eq!(stored.locked_until, None);
        assert_eq!(auth.unlock_all(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let db = Connection::open_test().await;
        let auth = Authenticator::default();
        let user = register(&db).await;
        auth.change_password(
            &db,
            user.id,
            &PasswordChange {
                current: NATIONAL_ID.to_string(),
                new: "Sandi2024".to_string(),
                confirm: "Sandi2024".to_string(),
            },
        )
        .await
        .unwrap();

        let reset = auth.reset_password(&db, user.id).await.unwrap();
        assert!(reset.temporary_password);
        let summary = auth
            .authenticate(&db, &credentials(NATIONAL_ID), now())
            .await
            .unwrap();
        assert!(summary.temporary_password);
    }
}
