//! Error types and result handling for user synchronization.
//!
//! `CoreError` covers the storage layer. `SyncError` is the taxonomy the
//! webhook handler works with: every step of request processing returns it,
//! and it carries a stable code so failures can be told apart in logs and
//! responses.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Storage-level error type.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested user not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Broad category of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Deployment defect: the webhook secret is absent or unusable.
    Configuration,
    /// The request could not be proven to come from the identity provider.
    Authentication,
    /// The payload was not a well-formed lifecycle event.
    Decode,
    /// The user store rejected or could not perform the write.
    Storage,
}

/// Failures raised while receiving and applying a webhook event.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No webhook secret configured (E1001).
    #[error("[E1001] Webhook secret is not configured")]
    MissingSecret,

    /// Webhook secret present but not decodable (E1002).
    #[error("[E1002] Webhook secret is invalid: {reason}")]
    InvalidSecret {
        /// Why the secret was rejected
        reason: String,
    },

    /// Signature headers missing, stale or not matching (E2001).
    #[error("[E2001] Webhook verification failed: {reason}")]
    Authentication {
        /// Verification failure detail
        reason: String,
    },

    /// Payload is not a recognizable event envelope (E3001).
    #[error("[E3001] Invalid event payload: {reason}")]
    Decode {
        /// Decoding failure detail
        reason: String,
    },

    /// Payload exceeds the configured size limit (E3002).
    #[error("[E3002] Payload too large: {size_bytes} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Size of the received body in bytes
        size_bytes: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Store write failed (E4001).
    #[error("[E4001] Storage failure: {0}")]
    Storage(#[from] CoreError),
}

impl SyncError {
    /// Returns the stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingSecret => "E1001",
            Self::InvalidSecret { .. } => "E1002",
            Self::Authentication { .. } => "E2001",
            Self::Decode { .. } => "E3001",
            Self::PayloadTooLarge { .. } => "E3002",
            Self::Storage(_) => "E4001",
        }
    }

    /// Returns the error category.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSecret | Self::InvalidSecret { .. } => ErrorKind::Configuration,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Decode { .. } | Self::PayloadTooLarge { .. } => ErrorKind::Decode,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode { reason: err.to_string() }
    }
}
