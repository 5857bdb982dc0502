use anyhow::Result;
use async_trait::async_trait;

use warga_data::{AccountChange, LoginAttempt, ModifyAccount, QueryError, User, UserFilter};

use crate::users::check_unique_email;
use crate::FileStore;

#[async_trait]
impl ModifyAccount for FileStore {
    async fn modify_account<F, R>(&self, filter: &UserFilter, change: F) -> Result<R>
    where
        F: FnOnce(Option<User>) -> AccountChange<R> + Send,
        R: Send,
    {
        self.write(move |snapshot| {
            let user = snapshot.users.rows.iter().find(|u| u.matches(filter)).cloned();
            let AccountChange {
                user,
                attempt,
                result,
            } = change(user);

            if let Some(user) = user {
                check_unique_email(snapshot, &user)?;
                let row = snapshot
                    .users
                    .rows
                    .iter_mut()
                    .find(|u| u.id == user.id)
                    .ok_or(QueryError::NotFound)?;
                *row = user;
            }
            if let Some(attempt) = attempt {
                let id = snapshot.login_history.allocate();
                snapshot
                    .login_history
                    .rows
                    .push(LoginAttempt { id, ..attempt });
            }
            Ok(result)
        })
        .await
    }
}
