use anyhow::Result;
use async_trait::async_trait;

use warga_data::{Delete, Insert, Query, QueryError, Retrieve, Update, User, UserFilter};

use crate::store::Snapshot;
use crate::FileStore;

pub(crate) fn check_unique_email(snapshot: &Snapshot, user: &User) -> Result<()> {
    let taken = snapshot
        .users
        .rows
        .iter()
        .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email));
    if taken {
        return Err(QueryError::Duplicate(user.email.clone()).into());
    }
    Ok(())
}

#[async_trait]
impl Query<User> for FileStore {
    type Filter = UserFilter;

    async fn query(&self, filter: &Self::Filter) -> Result<Vec<User>> {
        let snapshot = self.read().await?;
        let users = snapshot
            .users
            .rows
            .iter()
            .filter(|u| u.matches(filter))
            .cloned()
            .collect();
        Ok(users)
    }
}

#[async_trait]
impl Retrieve<User> for FileStore {
    type Key = u32;

    async fn retrieve(&self, user_id: Self::Key) -> Result<User> {
        let snapshot = self.read().await?;
        let user = snapshot
            .users
            .rows
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(QueryError::NotFound)?;
        Ok(user)
    }
}

#[async_trait]
impl Insert<User> for FileStore {
    async fn insert(&self, user: User) -> Result<User> {
        self.write(move |snapshot| {
            check_unique_email(snapshot, &User { id: 0, ..user.clone() })?;
            let user = User {
                id: snapshot.users.allocate(),
                ..user
            };
            snapshot.users.rows.push(user.clone());
            Ok(user)
        })
        .await
    }
}

#[async_trait]
impl Update<User> for FileStore {
    async fn update(&self, user: User) -> Result<User> {
        self.write(move |snapshot| {
            check_unique_email(snapshot, &user)?;
            let row = snapshot
                .users
                .rows
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(QueryError::NotFound)?;
            *row = user.clone();
            Ok(user)
        })
        .await
    }
}

#[async_trait]
impl Delete<User> for FileStore {
    /// Delete user together with the user's payments
    async fn delete(&self, user: User) -> Result<()> {
        self.write(move |snapshot| {
            snapshot.users.rows.retain(|u| u.id != user.id);
            snapshot.payments.rows.retain(|p| p.user_id != user.id);
            Ok(())
        })
        .await
    }
}
