//! HTTP surface for identity-provider user synchronization.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod server;

pub use config::{Config, Environment, WebhookSettings};
pub use server::{create_router, start_server, AppState};
