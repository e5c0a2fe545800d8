//! Repository for user record database operations.
//!
//! Writes are single statements keyed by the provider id, so each event is
//! applied atomically and concurrent events for the same id are ordered by
//! PostgreSQL's row locking (last write wins).

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    error::Result,
    models::{UserId, UserRecord},
};

/// Repository for user records.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Creates the `users` table when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT,
                name TEXT NOT NULL DEFAULT '',
                image TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&*self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&*self.pool)
            .await?;

        Ok(())
    }

    /// Inserts or fully replaces the record stored under `id`.
    ///
    /// The stored id is always `id`; `record.id` is not consulted.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    pub async fn upsert(&self, id: &UserId, record: &UserRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, name, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                updated_at = NOW()
            ",
        )
        .bind(id)
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.image)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a user, returning whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    pub async fn delete(&self, id: &UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r"
            SELECT id, email, name, image
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(user)
    }
}
