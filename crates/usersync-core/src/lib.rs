//! Core domain models, event decoding and storage.
//!
//! Provides the user record model, the typed lifecycle events delivered by
//! the identity provider, the error taxonomy shared by every layer, and the
//! storage seam the webhook handler writes through.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod models;
pub mod storage;
pub mod sync;
pub mod time;

pub use error::{CoreError, ErrorKind, Result, SyncError};
pub use events::UserEvent;
pub use models::{UserId, UserRecord};
pub use storage::UserStore;
pub use sync::{apply_event, SyncOutcome};
pub use time::{Clock, RealClock, TestClock};
