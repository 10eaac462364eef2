//! # Messenger Webhook Handler
//!
//! Turns the raw body of a webhook POST into dispatched messages:
//! origin check, JSON decoding, envelope unwrapping, then one dispatch per
//! parsed event. Only the origin check can fail the request; everything after
//! it is logged and acknowledged so Meta doesn't redeliver broken payloads.

use super::{
    batch::unwrap_envelope,
    dispatch::DispatchTable,
    errors::{AuthError, UnwrapError},
    security,
};
use crate::{config::AppConfig, metric};
use tracing::info;

/// Per-process webhook settings taken from the configuration
#[derive(Clone)]
pub struct WebhookSettings {
    /// 🔒 SENSITIVE: key of the signature HMAC
    pub app_secret: String,
    /// 🔒 SENSITIVE: token expected during GET verification
    pub verify_token: String,
    /// Expected envelope `object`, `"page"` for pages
    pub object_type: String,
    /// Whether signatures are checked at all
    pub enforce_origin: bool,
}

impl WebhookSettings {
    pub fn from_config(app_config: &AppConfig) -> Self {
        Self {
            app_secret: app_config.facebook_app_secret.clone(),
            verify_token: app_config.facebook_verify_token.clone(),
            object_type: app_config.facebook_object_type.clone(),
            enforce_origin: app_config.enforce_origin,
        }
    }
}

/// What happened to an authenticated webhook request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebhookOutcome {
    /// Messages handed to a handler
    pub dispatched: usize,
    /// Messages whose kind has no handler
    pub skipped: usize,
    /// Messaging events that couldn't be classified or parsed
    pub failed: usize,
    /// Whether the whole body was dropped (bad JSON or envelope)
    pub discarded: bool,
    /// Whether the body was processed without checking its signature
    pub unverified: bool,
}

/// Processes one webhook delivery.
///
/// # Arguments
/// * `raw_body` - Request body exactly as received
/// * `signature_header` - Value of the signature header, if any
/// * `settings` - Secret, expected object type and origin enforcement flag
/// * `dispatcher` - Handler table messages are routed through
///
/// # Errors
/// Only [`AuthError`] is returned, and only when origin enforcement is on.
/// Nothing is parsed in that case. With enforcement off every request is
/// logged as unverified and flagged in [`WebhookOutcome::unverified`].
pub fn process_webhook(
    raw_body: &[u8],
    signature_header: Option<&str>,
    settings: &WebhookSettings,
    dispatcher: &DispatchTable,
) -> Result<WebhookOutcome, AuthError> {
    if settings.enforce_origin {
        security::verify(settings.app_secret.as_bytes(), raw_body, signature_header).map_err(
            |e| {
                metric::incr_webhook_rejection_statds(e.reason());
                logfire::warn!(
                    "Rejected webhook request: {reason}",
                    reason = e.reason().to_string()
                );
                e
            },
        )?;
    } else {
        metric::incr_webhook_unverified_statds();
        logfire::warn!("Processing webhook without signature verification, ENFORCE_ORIGIN is off");
    }

    let mut outcome = WebhookOutcome {
        unverified: !settings.enforce_origin,
        ..Default::default()
    };

    let envelope: serde_json::Value = match serde_json::from_slice(raw_body) {
        Ok(envelope) => envelope,
        Err(e) => {
            metric::incr_webhook_rejection_statds("invalid_json");
            logfire::warn!(
                "Failed to decode webhook body: {error}",
                error = e.to_string()
            );
            outcome.discarded = true;
            return Ok(outcome);
        }
    };

    let batch = match unwrap_envelope(&envelope, &settings.object_type) {
        Ok(batch) => batch,
        Err(e) => {
            let reason = match e {
                UnwrapError::WrongObjectType { .. } => "wrong_object_type",
                _ => "malformed_envelope",
            };
            metric::incr_webhook_rejection_statds(reason);
            logfire::warn!(
                "Discarded webhook envelope: {error}",
                error = e.to_string()
            );
            outcome.discarded = true;
            return Ok(outcome);
        }
    };

    for item in &batch.errors {
        metric::incr_webhook_rejection_statds("invalid_event");
        logfire::warn!(
            "Skipping messaging event {entry}/{messaging}: {error}",
            entry = item.entry as i64,
            messaging = item.messaging as i64,
            error = item.error.to_string()
        );
    }
    outcome.failed = batch.errors.len();

    for message in batch.into_messages() {
        metric::incr_webhook_event_statds(message.kind().as_str());

        if dispatcher.dispatch(message) {
            outcome.dispatched += 1;
        } else {
            outcome.skipped += 1;
        }
    }

    info!(
        "Processed webhook: dispatched={}, skipped={}, failed={}",
        outcome.dispatched, outcome.skipped, outcome.failed
    );

    Ok(outcome)
}
