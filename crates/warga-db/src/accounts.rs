use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteConnection;

use warga_data::{AccountChange, ModifyAccount, User, UserFilter};

use crate::{login_history, users, Connection};

async fn apply<F, R>(conn: &mut SqliteConnection, filter: &UserFilter, change: F) -> Result<R>
where
    F: FnOnce(Option<User>) -> AccountChange<R>,
{
    let user = users::select(conn, filter).await?.into_iter().next();
    let change = change(user);
    if let Some(user) = &change.user {
        users::write(conn, user).await?;
    }
    if let Some(attempt) = &change.attempt {
        login_history::append(conn, attempt).await?;
    }
    Ok(change.result)
}

#[async_trait]
impl ModifyAccount for Connection {
    /// Runs in an immediate transaction, which takes the database
    /// write lock before the account is read.
    async fn modify_account<F, R>(&self, filter: &UserFilter, change: F) -> Result<R>
    where
        F: FnOnce(Option<User>) -> AccountChange<R> + Send,
        R: Send,
    {
        let mut conn = self.lock().await;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        match apply(&mut conn, filter, change).await {
            Ok(result) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(result)
            }
            Err(err) => {
                if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    tracing::error!("rollback failed: {}", rollback);
                }
                Err(err)
            }
        }
    }
}
