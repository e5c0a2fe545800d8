//! HTTP request handlers.
//!
//! - `webhook` - identity-provider lifecycle events
//! - `health` - liveness, readiness and health probes
//!
//! Webhook failures of every kind are answered with the same `400` shape so
//! the sender's retry behaviour does not depend on which step failed.

pub mod health;
pub mod webhook;

pub use health::{health_check, liveness_check, readiness_check};
pub use webhook::receive_user_event;
