//! Lifecycle events delivered by the identity provider.
//!
//! Every webhook body is an envelope `{"type": ..., "data": {...}}`. The
//! `type` tag selects one of the closed set of [`UserEvent`] variants; tags
//! this service does not handle decode to [`UserEvent::Unknown`] without
//! looking at `data`, so new upstream event kinds never fail a delivery.

use serde::Deserialize;

use crate::{
    error::SyncError,
    models::{UserId, UserRecord},
};

/// Event tag for account creation.
pub const USER_CREATED: &str = "user.created";
/// Event tag for account updates.
pub const USER_UPDATED: &str = "user.updated";
/// Event tag for account deletion.
pub const USER_DELETED: &str = "user.deleted";

/// A decoded account lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    /// A new account; carries the full record to store.
    Created(UserRecord),

    /// An existing account changed; carries the full replacement record.
    Updated(UserRecord),

    /// An account was removed.
    Deleted {
        /// Identifier of the removed account
        id: UserId,
    },

    /// Any event tag not handled by this service.
    Unknown {
        /// The tag as received
        event_type: String,
    },
}

impl UserEvent {
    /// Decodes a raw webhook body.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Decode` if the body is not a JSON envelope, or if
    /// a known event lacks a non-empty `data.id`.
    pub fn from_slice(body: &[u8]) -> Result<Self, SyncError> {
        let envelope: Envelope = serde_json::from_slice(body)?;

        let event = match envelope.event_type.as_str() {
            USER_CREATED => Self::Created(UserPayload::decode(envelope.data)?.into_record()),
            USER_UPDATED => Self::Updated(UserPayload::decode(envelope.data)?.into_record()),
            USER_DELETED => {
                let data: DeletedPayload = serde_json::from_value(envelope.data)?;
                Self::Deleted { id: non_empty_id(data.id)? }
            },
            _ => Self::Unknown { event_type: envelope.event_type },
        };

        Ok(event)
    }

    /// Returns the upstream tag this event was decoded from.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Created(_) => USER_CREATED,
            Self::Updated(_) => USER_UPDATED,
            Self::Deleted { .. } => USER_DELETED,
            Self::Unknown { event_type } => event_type,
        }
    }

    /// Returns the affected user, if the event targets one.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Created(record) | Self::Updated(record) => Some(&record.id),
            Self::Deleted { id } => Some(id),
            Self::Unknown { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email_addresses: Option<Vec<EmailAddress>>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeletedPayload {
    id: String,
}

impl UserPayload {
    fn decode(data: serde_json::Value) -> Result<Self, SyncError> {
        let payload: Self = serde_json::from_value(data)?;
        if payload.id.is_empty() {
            return Err(empty_id());
        }
        Ok(payload)
    }

    fn into_record(self) -> UserRecord {
        // The first listed address is the one the application treats as primary.
        let email = self
            .email_addresses
            .and_then(|addresses| addresses.into_iter().next())
            .and_then(|address| address.email_address);

        UserRecord::new(
            self.id,
            email,
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.image_url,
        )
    }
}

fn non_empty_id(id: String) -> Result<UserId, SyncError> {
    if id.is_empty() {
        return Err(empty_id());
    }
    Ok(UserId(id))
}

fn empty_id() -> SyncError {
    SyncError::Decode { reason: "data.id must not be empty".to_string() }
}
