//! # Messenger Bot
//!
//! Facebook Messenger webhook receiver and Send API client.
//!
//! Inbound requests flow through [`webhook::messenger::handler::process_webhook`]:
//! signature check, envelope unwrapping, event classification and parsing, then
//! dispatch to the handler registered for each event kind. Outbound messages go
//! through [`webhook::messenger::client::MessengerClient`].

pub mod config;
pub mod consts;
pub mod front;
pub mod logger;
pub mod metric;
pub mod webhook;
