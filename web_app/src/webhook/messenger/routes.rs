//! Messenger webhook endpoint handlers
//!
//! Implements the verification endpoint (GET) and the event receiver (POST).
//!
//! # Security
//!
//! The POST endpoint checks the `X-Hub-Signature-256` (or legacy
//! `X-Hub-Signature`) HMAC of the raw body before anything is parsed.

use super::{
    handler,
    security::{SIGNATURE_256_HEADER, SIGNATURE_HEADER},
};
use crate::front::{AppState, errors};
use ntex::{util::Bytes, web};
use serde::Deserialize;
use tracing::info;

/// Query parameters for webhook verification
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// The mode parameter, "subscribe" when present
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// The verification token configured in the app dashboard
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    /// The challenge string to echo back
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

/// Webhook verification endpoint (GET)
///
/// # Returns
/// - 200 with challenge string if verification succeeds
/// - 403 if verification fails
#[web::get("")]
pub async fn verify(
    query: web::types::Query<VerifyQuery>,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    if query.mode.as_deref().is_some_and(|mode| mode != "subscribe") {
        logfire::warn!("Invalid verification mode, expected 'subscribe'");
        return Err(errors::WebhookError::Unauthorized.into());
    }

    if query.verify_token != app_state.settings.verify_token {
        logfire::warn!("Invalid webhook verify token");
        return Err(errors::WebhookError::Unauthorized.into());
    }

    info!("Webhook verification successful");

    Ok(web::HttpResponse::Ok()
        .content_type("text/plain")
        .body(query.challenge.clone()))
}

/// Webhook receiver endpoint (POST)
///
/// # Returns
/// - 403 when the signature is missing, malformed or wrong
/// - 200 `{"status": "received"}` otherwise, even if events failed to parse
#[web::post("")]
pub async fn receive(
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let _span = logfire::span!("messenger_webhook").entered();

    let signature = signature_header(&req);

    if let Err(e) = handler::process_webhook(
        &body,
        signature,
        &app_state.settings,
        &app_state.dispatcher,
    ) {
        return Err(errors::WebhookError::from(e).into());
    }

    Ok(web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "received"
    })))
}

/// Signature header of the request, the SHA-256 one first
fn signature_header(req: &web::HttpRequest) -> Option<&str> {
    [SIGNATURE_256_HEADER, SIGNATURE_HEADER]
        .into_iter()
        .find_map(|name| req.headers().get(name))
        .and_then(|value| value.to_str().ok())
}
