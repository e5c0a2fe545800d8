//! Applies decoded lifecycle events to a [`UserStore`].
//!
//! Each known event maps to exactly one store call, so a failure can never
//! leave a record half-written. Unknown events do not touch the store.

use std::fmt;

use tracing::{debug, info};

use crate::{
    error::SyncError,
    events::UserEvent,
    models::UserId,
    storage::UserStore,
};

/// What applying an event did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Record inserted, or replaced on redelivery.
    Created {
        /// Affected user
        id: UserId,
    },

    /// Record fully replaced, or created if it was missing.
    Updated {
        /// Affected user
        id: UserId,
    },

    /// Record removed.
    Deleted {
        /// Affected user
        id: UserId,
        /// Whether a record existed before the delete
        existed: bool,
    },

    /// Event tag not handled; store untouched.
    Ignored {
        /// The tag as received
        event_type: String,
    },
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { id } => write!(f, "created {id}"),
            Self::Updated { id } => write!(f, "updated {id}"),
            Self::Deleted { id, existed: true } => write!(f, "deleted {id}"),
            Self::Deleted { id, existed: false } => write!(f, "delete of absent {id}"),
            Self::Ignored { event_type } => write!(f, "ignored {event_type}"),
        }
    }
}

/// Applies one event with a single store call.
///
/// # Errors
///
/// Returns `SyncError::Storage` if the store call fails. Nothing is retried.
pub async fn apply_event(store: &dyn UserStore, event: UserEvent) -> Result<SyncOutcome, SyncError> {
    let outcome = match event {
        UserEvent::Created(record) => {
            let id = record.id.clone();
            store.create(record).await?;
            SyncOutcome::Created { id }
        },
        UserEvent::Updated(record) => {
            let id = record.id.clone();
            store.replace_by_id(id.clone(), record).await?;
            SyncOutcome::Updated { id }
        },
        UserEvent::Deleted { id } => {
            let existed = store.delete_by_id(id.clone()).await?;
            if !existed {
                debug!(user_id = %id, "Delete for unknown user treated as no-op");
            }
            SyncOutcome::Deleted { id, existed }
        },
        UserEvent::Unknown { event_type } => {
            debug!(event_type = %event_type, "Ignoring unhandled event type");
            SyncOutcome::Ignored { event_type }
        },
    };

    info!(outcome = %outcome, "Event applied");
    Ok(outcome)
}
