use anyhow::Result;
use async_trait::async_trait;

use warga_data::{Insert, LoginAttempt, LoginAttemptFilter, Query};

use crate::FileStore;

#[async_trait]
impl Query<LoginAttempt> for FileStore {
    type Filter = LoginAttemptFilter;

    /// Login history, newest first
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<LoginAttempt>> {
        let snapshot = self.read().await?;
        let limit = filter.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let attempts = snapshot
            .login_history
            .rows
            .iter()
            .rev()
            .filter(|a| a.matches(filter))
            .take(limit)
            .cloned()
            .collect();
        Ok(attempts)
    }
}

#[async_trait]
impl Insert<LoginAttempt> for FileStore {
    async fn insert(&self, attempt: LoginAttempt) -> Result<LoginAttempt> {
        self.write(move |snapshot| {
            let attempt = LoginAttempt {
                id: snapshot.login_history.allocate(),
                ..attempt
            };
            snapshot.login_history.rows.push(attempt.clone());
            Ok(attempt)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use warga_data::FailureReason;

    #[tokio::test]
    async fn test_login_history_newest_first() {
        let db = FileStore::open_test().await;
        let now = Utc::now();
        db.insert(LoginAttempt::failed(
            None,
            "x@warga.test",
            FailureReason::UserNotFound,
            now,
        ))
        .await
        .unwrap();
        db.insert(LoginAttempt::succeeded(1, "a@warga.test", now))
            .await
            .unwrap();

        let history: Vec<LoginAttempt> = db
            .query(&LoginAttemptFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, 2);
        assert!(history[0].success);
    }
}
