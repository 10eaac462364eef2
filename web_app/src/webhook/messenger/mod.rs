//! Facebook Messenger Platform integration
//!
//! ## Submodules
//!
//! - [`security`] - Origin check of webhook requests (`X-Hub-Signature`)
//! - [`classify`] - Event kind detection
//! - [`parser`] - Typed parsing of messaging events
//! - [`batch`] - Unwrapping of webhook envelopes
//! - [`dispatch`] - Kind to handler routing
//! - [`handler`] - The whole inbound pipeline for one request
//! - [`routes`] - HTTP endpoint handlers
//! - [`worker`] - Default handlers and the reply task
//! - [`client`] - Graph API client for sending messages
//! - [`schemas`] / [`outgoing_schemas`] - Inbound and outbound data structures

pub mod batch;
pub mod classify;
pub mod client;
pub mod dispatch;
pub mod errors;
pub mod handler;
pub mod outgoing_schemas;
pub mod parser;
pub mod routes;
pub mod schemas;
pub mod security;
pub mod worker;

// Re-export commonly used items for convenience
pub use routes::{receive, verify};
