//! Handlers not linked to the webhook

use ntex::web;
use serde_json::json;

use crate::front::errors;

/// Return a [UrlNotFound](errors::WebhookError::UrlNotFound) error for urls not defined
pub async fn serve_not_found() -> Result<web::HttpResponse, web::Error> {
    Err(errors::WebhookError::UrlNotFound.into())
}

/// Liveness probe for the load balancer
#[web::get("/health")]
pub async fn health() -> Result<impl web::Responder, web::Error> {
    Ok(web::HttpResponse::Ok().json(&json!({"status": "ok"})))
}
