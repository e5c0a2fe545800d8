//! Storage layer for user records.
//!
//! [`UserStore`] is the narrow interface the webhook handler writes
//! through. [`Storage`] implements it over PostgreSQL using the repository
//! pattern; [`memory::InMemoryUserStore`] implements it without a database
//! for tests and local runs.
//!
//! Every write is idempotent: repeating a call with the same input leaves
//! the store in the same state as calling it once.

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::PgPool;

pub mod memory;
pub mod users;

use crate::{
    error::Result,
    models::{UserId, UserRecord},
};

/// Boxed future returned by [`UserStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// User-record operations required by the webhook handler.
pub trait UserStore: Send + Sync + 'static {
    /// Inserts a record, replacing any existing record with the same id.
    ///
    /// Upstream delivery is at-least-once, so a repeated create must
    /// succeed and leave exactly one record behind.
    fn create(&self, record: UserRecord) -> StoreFuture<'_, ()>;

    /// Replaces every field of the record stored under `id`, creating it
    /// when absent.
    fn replace_by_id(&self, id: UserId, record: UserRecord) -> StoreFuture<'_, ()>;

    /// Removes the record stored under `id`.
    ///
    /// Returns whether a record existed. Deleting a missing id is not an
    /// error.
    fn delete_by_id(&self, id: UserId) -> StoreFuture<'_, bool>;

    /// Looks up a record by id.
    fn find_by_id(&self, id: UserId) -> StoreFuture<'_, Option<UserRecord>>;

    /// Verifies the store is reachable.
    fn health_check(&self) -> StoreFuture<'_, ()>;
}

/// Container for repository instances sharing one connection pool.
#[derive(Clone)]
pub struct Storage {
    /// Repository for user records.
    pub users: Arc<users::Repository>,
}

impl Storage {
    /// Creates a new storage instance over the given pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);
        Self { users: Arc::new(users::Repository::new(pool)) }
    }

    /// Creates the `users` table and its index when missing.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if a DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        self.users.ensure_schema().await
    }

    /// Executes a trivial query to verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.users.pool()).await?;

        Ok(())
    }
}

impl UserStore for Storage {
    fn create(&self, record: UserRecord) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.users.upsert(&record.id, &record).await })
    }

    fn replace_by_id(&self, id: UserId, record: UserRecord) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.users.upsert(&id, &record).await })
    }

    fn delete_by_id(&self, id: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async move { self.users.delete(&id).await })
    }

    fn find_by_id(&self, id: UserId) -> StoreFuture<'_, Option<UserRecord>> {
        Box::pin(async move { self.users.find_by_id(&id).await })
    }

    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(Storage::health_check(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_can_be_created() {
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let storage = Storage::new(pool);
        let _store: Arc<dyn UserStore> = Arc::new(storage);
    }
}
