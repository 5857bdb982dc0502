use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Id<T> {
    pub id: T,
}

/// Map a unique constraint violation to a duplicate error,
/// pass everything else through.
pub fn unique_violation(err: sqlx::Error, what: &str) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return warga_data::QueryError::Duplicate(what.to_string()).into();
        }
    }
    err.into()
}
