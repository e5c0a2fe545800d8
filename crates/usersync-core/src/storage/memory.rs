//! In-memory user store.
//!
//! Keeps records in a map behind an async lock. Counts every applied
//! mutation so callers can assert that rejected requests touched nothing,
//! and supports injecting a one-shot failure to exercise storage error
//! paths.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::sync::RwLock;

use super::{StoreFuture, UserStore};
use crate::{
    error::CoreError,
    models::{UserId, UserRecord},
};

/// Map-backed [`UserStore`].
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    records: Arc<RwLock<HashMap<UserId, UserRecord>>>,
    mutations: Arc<AtomicUsize>,
    injected_error: Arc<RwLock<Option<String>>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record without counting it as a mutation.
    pub async fn seed(&self, record: UserRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    /// Returns the record stored under `id`.
    pub async fn get(&self, id: &UserId) -> Option<UserRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Returns how many create, replace and delete calls were applied.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::Acquire)
    }

    /// Makes the next operation fail with a database error.
    pub async fn inject_error(&self, message: impl Into<String>) {
        *self.injected_error.write().await = Some(message.into());
    }

    async fn take_injected_error(&self) -> Result<(), CoreError> {
        match self.injected_error.write().await.take() {
            Some(message) => Err(CoreError::Database(message)),
            None => Ok(()),
        }
    }

    async fn put(&self, id: UserId, record: UserRecord) -> Result<(), CoreError> {
        self.take_injected_error().await?;
        let record = UserRecord { id: id.clone(), ..record };
        self.records.write().await.insert(id, record);
        self.mutations.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl UserStore for InMemoryUserStore {
    fn create(&self, record: UserRecord) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.put(record.id.clone(), record).await })
    }

    fn replace_by_id(&self, id: UserId, record: UserRecord) -> StoreFuture<'_, ()> {
        Box::pin(self.put(id, record))
    }

    fn delete_by_id(&self, id: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.take_injected_error().await?;
            let existed = self.records.write().await.remove(&id).is_some();
            self.mutations.fetch_add(1, Ordering::AcqRel);
            Ok(existed)
        })
    }

    fn find_by_id(&self, id: UserId) -> StoreFuture<'_, Option<UserRecord>> {
        Box::pin(async move {
            self.take_injected_error().await?;
            Ok(self.get(&id).await)
        })
    }

    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.take_injected_error())
    }
}
