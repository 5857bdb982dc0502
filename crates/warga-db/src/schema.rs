use anyhow::Result;

use crate::Connection;

const SCHEMA: &str = include_str!("../schema.sql");

/// Install the database schema.
pub async fn install(conn: &Connection) -> Result<()> {
    let mut conn = conn.lock().await;
    sqlx::raw_sql(SCHEMA).execute(&mut *conn).await?;
    tracing::info!("database schema installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_install() {
        let conn = Connection::open("sqlite::memory:").await.unwrap();
        install(&conn).await.unwrap();
        // Installing twice is fine
        install(&conn).await.unwrap();
    }
}
