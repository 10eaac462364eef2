//! Webhook handlers for external integrations
//!
//! ## Modules
//!
//! - [`messenger`] - Facebook Messenger Platform webhook and Send API client

pub mod messenger;
pub mod routes;
