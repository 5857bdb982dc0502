//! Storage operations. Each model implements the ones it
//! supports, per backend.

use anyhow::Result;
use async_trait::async_trait;

/// Select rows of a model. `Filter` is the model's filter struct,
/// unset fields match everything.
#[async_trait]
pub trait Query<T> {
    type Filter;
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<T>>;
}

/// Store a new row. The stored row, with its id, is returned.
#[async_trait]
pub trait Insert<T> {
    async fn insert(&self, item: T) -> Result<T>;
}

/// Replace a row identified by its id
#[async_trait]
pub trait Update<T> {
    async fn update(&self, item: T) -> Result<T>;
}

/// Fetch a single row by `Key`, `QueryError::NotFound` if missing
#[async_trait]
pub trait Retrieve<T> {
    type Key;
    async fn retrieve(&self, key: Self::Key) -> Result<T>;
}

#[async_trait]
pub trait Delete<T> {
    async fn delete(&self, item: T) -> Result<()>;
}
