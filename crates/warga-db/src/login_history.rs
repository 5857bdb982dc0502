use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteConnection, QueryBuilder, Sqlite};

use warga_data::{Insert, LoginAttempt, LoginAttemptFilter, Query, QueryError};

use crate::{results::Id, Connection};

#[async_trait]
impl Query<LoginAttempt> for Connection {
    type Filter = LoginAttemptFilter;

    /// Fetch login history, newest first
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<LoginAttempt>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                id,
                attempted_at,
                user_id,
                email,
                success,
                reason,
                origin
            FROM login_history
            WHERE 1
            "#,
        );
        if let Some(user_id) = filter.user_id {
            qry.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(email) = filter.email.clone() {
            qry.push(" AND email = ").push_bind(email).push(" COLLATE NOCASE");
        }
        if let Some(success) = filter.success {
            qry.push(" AND success = ").push_bind(success);
        }
        qry.push(" ORDER BY id DESC");
        if let Some(limit) = filter.limit {
            qry.push(" LIMIT ").push_bind(limit);
        }

        let attempts: Vec<LoginAttempt> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(attempts)
    }
}

/// Append to the login history on an already locked connection.
/// Returns the id of the new entry.
pub(crate) async fn append(conn: &mut SqliteConnection, attempt: &LoginAttempt) -> Result<u32> {
    let mut qry = QueryBuilder::<Sqlite>::new(
        r#"INSERT INTO login_history (
            attempted_at,
            user_id,
            email,
            success,
            reason,
            origin
        ) VALUES (
        "#,
    );
    qry.separated(", ")
        .push_bind(attempt.attempted_at)
        .push_bind(attempt.user_id)
        .push_bind(&attempt.email)
        .push_bind(attempt.success)
        .push_bind(attempt.reason)
        .push_bind(&attempt.origin);
    let insert: Id<u32> = qry
        .push(") RETURNING id ")
        .build_query_as()
        .fetch_one(&mut *conn)
        .await?;
    Ok(insert.id)
}

#[async_trait]
impl Insert<LoginAttempt> for Connection {
    /// Append to the login history
    async fn insert(&self, attempt: LoginAttempt) -> Result<LoginAttempt> {
        let mut conn = self.lock().await;
        let id = append(&mut conn, &attempt).await?;

        let attempt: LoginAttempt = sqlx::query_as(
            r#"
            SELECT id, attempted_at, user_id, email, success, reason, origin
            FROM login_history
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(QueryError::NotFound)?;
        Ok(attempt)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use warga_data::FailureReason;

    #[tokio::test]
    async fn test_login_history_append_and_query() {
        let db = Connection::open_test().await;
        let now = Utc::now();

        db.insert(LoginAttempt::failed(
            None,
            "nobody@warga.test",
            FailureReason::UserNotFound,
            now - Duration::minutes(2),
        ))
        .await
        .unwrap();
        let attempt = db
            .insert(
                LoginAttempt::succeeded(1, "Admin@warga.test", now)
                    .with_origin(Some("127.0.0.1".to_string())),
            )
            .await
            .unwrap();
        assert!(attempt.success);
        assert_eq!(attempt.origin.as_deref(), Some("127.0.0.1"));

        let history: Vec<LoginAttempt> = db.query(&LoginAttemptFilter::default()).await.unwrap();
        assert_eq!(history.len(), 2);
        // newest first
        assert!(history[0].success);
        assert_eq!(history[1].reason, Some(FailureReason::UserNotFound));

        let history: Vec<LoginAttempt> = db
            .query(&LoginAttemptFilter {
                email: Some("admin@warga.test".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);

        let history: Vec<LoginAttempt> = db
            .query(&LoginAttemptFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_login_history_is_append_only() {
        let db = Connection::open_test().await;
        let attempt = db
            .insert(LoginAttempt::succeeded(1, "admin@warga.test", Utc::now()))
            .await
            .unwrap();

        let mut conn = db.lock().await;
        let update = sqlx::query("UPDATE login_history SET success = 0 WHERE id = ?")
            .bind(attempt.id)
            .execute(&mut *conn)
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM login_history WHERE id = ?")
            .bind(attempt.id)
            .execute(&mut *conn)
            .await;
        assert!(delete.is_err());
    }
}
