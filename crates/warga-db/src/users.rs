use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteConnection, QueryBuilder, Sqlite};

use warga_data::{Delete, Insert, Query, QueryError, Retrieve, Update, User, UserFilter};

use crate::{
    results::{unique_violation, Id},
    Connection,
};

/// Select users on an already locked connection
pub(crate) async fn select(conn: &mut SqliteConnection, filter: &UserFilter) -> Result<Vec<User>> {
    let mut qry = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT
            id,
            name,
            email,
            phone,
            national_id,
            address,
            house_number,
            role,
            active,
            membership_date,
            password_hash,
            temporary_password,
            failed_attempts,
            locked_until,
            last_login_at
        FROM users
        WHERE 1
        "#,
    );

    if let Some(id) = filter.id {
        qry.push(" AND id = ").push_bind(id);
    }
    if let Some(name) = filter.name.clone() {
        qry.push(" AND name LIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(email) = filter.email.clone() {
        // email is declared COLLATE NOCASE
        qry.push(" AND email = ").push_bind(email);
    }
    if let Some(national_id) = filter.national_id.clone() {
        qry.push(" AND national_id = ").push_bind(national_id);
    }
    if let Some(role) = filter.role {
        qry.push(" AND role = ").push_bind(role);
    }
    match filter.locked {
        Some(true) => {
            qry.push(" AND (failed_attempts > 0 OR locked_until IS NOT NULL)");
        }
        Some(false) => {
            qry.push(" AND failed_attempts = 0 AND locked_until IS NULL");
        }
        None => {}
    }
    qry.push(" ORDER BY id");

    let users: Vec<User> = qry.build_query_as().fetch_all(&mut *conn).await?;
    Ok(users)
}

#[async_trait]
impl Query<User> for Connection {
    type Filter = UserFilter;

    async fn query(&self, filter: &Self::Filter) -> Result<Vec<User>> {
        let mut conn = self.lock().await;
        select(&mut conn, filter).await
    }
}

#[async_trait]
impl Retrieve<User> for Connection {
    type Key = u32;

    async fn retrieve(&self, user_id: Self::Key) -> Result<User> {
        let filter = UserFilter {
            id: Some(user_id),
            ..Default::default()
        };
        let user = self
            .query(&filter)
            .await?
            .pop()
            .ok_or(QueryError::NotFound)?;
        Ok(user)
    }
}

#[async_trait]
impl Insert<User> for Connection {
    async fn insert(&self, user: User) -> Result<User> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO users (
                    name,
                    email,
                    phone,
                    national_id,
                    address,
                    house_number,
                    role,
                    active,
                    membership_date,
                    password_hash,
                    temporary_password,
                    failed_attempts,
                    locked_until,
                    last_login_at
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(&user.name)
                .push_bind(&user.email)
                .push_bind(&user.phone)
                .push_bind(&user.national_id)
                .push_bind(&user.address)
                .push_bind(&user.house_number)
                .push_bind(user.role)
                .push_bind(user.active)
                .push_bind(user.membership_date)
                .push_bind(&user.password_hash)
                .push_bind(user.temporary_password)
                .push_bind(user.failed_attempts)
                .push_bind(user.locked_until)
                .push_bind(user.last_login_at);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| unique_violation(e, &user.email))?
        };
        self.retrieve(insert.id).await
    }
}

/// Write all columns of a user on an already locked connection
pub(crate) async fn write(conn: &mut SqliteConnection, user: &User) -> Result<()> {
    QueryBuilder::<Sqlite>::new("UPDATE users SET")
        .push(" name = ")
        .push_bind(&user.name)
        .push(", email = ")
        .push_bind(&user.email)
        .push(", phone = ")
        .push_bind(&user.phone)
        .push(", national_id = ")
        .push_bind(&user.national_id)
        .push(", address = ")
        .push_bind(&user.address)
        .push(", house_number = ")
        .push_bind(&user.house_number)
        .push(", role = ")
        .push_bind(user.role)
        .push(", active = ")
        .push_bind(user.active)
        .push(", membership_date = ")
        .push_bind(user.membership_date)
        .push(", password_hash = ")
        .push_bind(&user.password_hash)
        .push(", temporary_password = ")
        .push_bind(user.temporary_password)
        .push(", failed_attempts = ")
        .push_bind(user.failed_attempts)
        .push(", locked_until = ")
        .push_bind(user.locked_until)
        .push(", last_login_at = ")
        .push_bind(user.last_login_at)
        .push(" WHERE id = ")
        .push_bind(user.id)
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| unique_violation(e, &user.email))?;
    Ok(())
}

#[async_trait]
impl Update<User> for Connection {
    /// Update user
    async fn update(&self, user: User) -> Result<User> {
        {
            let mut conn = self.lock().await;
            write(&mut conn, &user).await?;
        }
        self.retrieve(user.id).await
    }
}

#[async_trait]
impl Delete<User> for Connection {
    /// Delete user, payments are removed with it
    async fn delete(&self, user: User) -> Result<()> {
        let mut conn = self.lock().await;
        QueryBuilder::<Sqlite>::new("DELETE FROM users WHERE id = ")
            .push_bind(user.id)
            .build()
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
