//! # Messenger Graph API Client
//!
//! Sends messages, sender actions and page settings through the Graph API and
//! fetches user profiles. HTTP lives behind [`GraphTransport`] so the client
//! logic can be exercised without the network.

use super::{
    outgoing_schemas::{
        Button, GenericElement, OutgoingMessage, QuickReply, SendResponse, SenderAction,
        SenderActionRequest, ThreadSetting,
    },
    schemas::{Entity, UserProfile},
};
use crate::{config::AppConfig, consts, metric};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

/// Profile fields requested by [`MessengerClient::fetch_user`]
pub const USER_FIELDS: [&str; 8] = [
    "first_name",
    "last_name",
    "profile_pic",
    "locale",
    "timezone",
    "gender",
    "is_payment_enabled",
    "last_ad_referral",
];

const MESSAGES_PATH: &str = "me/messages";
const THREAD_SETTINGS_PATH: &str = "me/thread_settings";
const SUBSCRIBED_APPS_PATH: &str = "me/subscribed_apps";

/// Authenticated access to Graph API endpoints.
///
/// `path` is relative to the versioned base url, e.g. `me/messages`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphTransport {
    async fn post(&self, path: &str, body: Value) -> Result<Value>;

    async fn get(&self, path: &str, query: Vec<(String, String)>) -> Result<Value>;
}

pub type ImplGraphTransport = Box<dyn GraphTransport + Send + Sync>;

/// Base url of a Graph API version, e.g. `https://graph.facebook.com/v2.9/`
pub fn graph_base_url(version: &str) -> String {
    format!("{}/{version}/", consts::GRAPH_API_HOST)
}

/// [`GraphTransport`] over HTTPS, authenticating with the page access token
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ReqwestTransport {
    pub fn new(api_version: &str, access_token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(consts::GRAPH_API_TIMEOUT_SECS))
            .build()
            .context("Failed to build Graph API http client")?;

        Ok(Self {
            client,
            base_url: graph_base_url(api_version),
            access_token: access_token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_response(response: reqwest::Response) -> Result<Value> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            anyhow::bail!("Graph API returned error status {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Graph API response")
    }
}

#[async_trait]
impl GraphTransport for ReqwestTransport {
    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.url(path))
            .query(&[("access_token", &self.access_token)])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Graph API {path}"))?;

        Self::read_response(response).await
    }

    async fn get(&self, path: &str, mut query: Vec<(String, String)>) -> Result<Value> {
        query.push(("access_token".to_string(), self.access_token.clone()));

        let response = self
            .client
            .get(self.url(path))
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Graph API {path}"))?;

        Self::read_response(response).await
    }
}

/// Messenger Platform client for one page
pub struct MessengerClient {
    transport: ImplGraphTransport,
}

impl MessengerClient {
    pub fn new(transport: ImplGraphTransport) -> Self {
        Self { transport }
    }

    /// Client talking to the real Graph API with the configured page token
    pub fn from_config(app_config: &AppConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(
            &app_config.graph_api_version,
            app_config.facebook_access_token.clone(),
        )?;

        Ok(Self::new(Box::new(transport)))
    }

    /// Posts `message` to the Send API.
    ///
    /// # Arguments
    /// * `message` - Message built with one of the [`OutgoingMessage`] constructors
    /// * `kind` - Label used in logs and metrics, e.g. `"text"`
    pub async fn send(&self, message: &OutgoingMessage, kind: &str) -> Result<SendResponse> {
        let body = serde_json::to_value(message).context("Failed to serialize message")?;

        let sent = self
            .transport
            .post(MESSAGES_PATH, body)
            .await
            .and_then(|response| {
                serde_json::from_value::<SendResponse>(response)
                    .context("Failed to parse send response")
            });

        match sent {
            Ok(response) => {
                metric::incr_outbound_send_statds(kind, "ok");
                info!(
                    "Sent {} message to {}",
                    kind, message.recipient.id
                );
                Ok(response)
            }
            Err(e) => {
                metric::incr_outbound_send_statds(kind, "error");
                logfire::error!(
                    "Failed to send {kind} message to {recipient}: {error}",
                    kind = kind.to_string(),
                    recipient = message.recipient.id.clone(),
                    error = e.to_string()
                );
                Err(e)
            }
        }
    }

    pub async fn send_text(&self, user_id: &str, text: &str) -> Result<SendResponse> {
        self.send(&OutgoingMessage::text(user_id, text), "text").await
    }

    pub async fn send_image(&self, user_id: &str, image_url: &str) -> Result<SendResponse> {
        self.send(&OutgoingMessage::image(user_id, image_url), "image")
            .await
    }

    pub async fn send_buttons(
        &self,
        user_id: &str,
        text: &str,
        buttons: Vec<Button>,
    ) -> Result<SendResponse> {
        self.send(&OutgoingMessage::buttons(user_id, text, buttons), "buttons")
            .await
    }

    pub async fn send_generic(
        &self,
        user_id: &str,
        elements: Vec<GenericElement>,
    ) -> Result<SendResponse> {
        self.send(&OutgoingMessage::generic(user_id, elements), "generic")
            .await
    }

    pub async fn send_quick_replies(
        &self,
        user_id: &str,
        text: &str,
        replies: Vec<QuickReply>,
    ) -> Result<SendResponse> {
        self.send(
            &OutgoingMessage::quick_replies(user_id, text, replies),
            "quick_replies",
        )
        .await
    }

    /// Turns the typing indicator on or off
    pub async fn typing(&self, user_id: &str, on: bool) -> Result<()> {
        let action = if on {
            SenderAction::TypingOn
        } else {
            SenderAction::TypingOff
        };
        let body = serde_json::to_value(SenderActionRequest::new(user_id, action))
            .context("Failed to serialize sender action")?;

        self.transport.post(MESSAGES_PATH, body).await?;
        Ok(())
    }

    /// Fetches the profile of `user_id` and returns it as a hydrated [`Entity`]
    pub async fn fetch_user(&self, user_id: &str) -> Result<Entity> {
        let query = vec![("fields".to_string(), USER_FIELDS.join(","))];
        let response = self
            .transport
            .get(user_id, query)
            .await
            .with_context(|| format!("Failed to fetch profile of user {user_id}"))?;

        let profile: UserProfile =
            serde_json::from_value(response).context("Failed to parse user profile")?;

        let mut entity = Entity::new(user_id);
        entity.hydrate(profile);
        Ok(entity)
    }

    /// Subscribes this app to the page webhooks
    pub async fn subscribe_to_page(&self) -> Result<Value> {
        self.transport.post(SUBSCRIBED_APPS_PATH, json!({})).await
    }

    pub async fn set_greeting_text(&self, text: &str) -> Result<Value> {
        self.post_thread_setting(&ThreadSetting::greeting(text))
            .await
    }

    pub async fn set_get_started_button_payload(&self, payload: &str) -> Result<Value> {
        self.post_thread_setting(&ThreadSetting::get_started(payload))
            .await
    }

    async fn post_thread_setting(&self, setting: &ThreadSetting) -> Result<Value> {
        let body = serde_json::to_value(setting).context("Failed to serialize thread setting")?;
        self.transport.post(THREAD_SETTINGS_PATH, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(mock_transport: MockGraphTransport) -> MessengerClient {
        MessengerClient::new(Box::new(mock_transport))
    }

    #[test]
    fn test_graph_base_url() {
        assert_eq!(graph_base_url("v2.9"), "https://graph.facebook.com/v2.9/");

        let transport = ReqwestTransport::new("v2.9", "token").unwrap();
        assert_eq!(
            transport.url("/me/messages"),
            "https://graph.facebook.com/v2.9/me/messages"
        );
    }

    #[ntex::test]
    async fn test_send_text_posts_to_messages() {
        let mut mock_transport = MockGraphTransport::new();
        mock_transport
            .expect_post()
            .withf(|path, body| {
                path.to_string() == "me/messages"
                    && *body == json!({"recipient": {"id": "U1"}, "message": {"text": "hi"}})
            })
            .times(1)
            .returning(|_, _| Ok(json!({"recipient_id": "U1", "message_id": "mid.1"})));

        let response = client_with(mock_transport)
            .send_text("U1", "hi")
            .await
            .unwrap();

        assert_eq!(response.recipient_id.as_deref(), Some("U1"));
        assert_eq!(response.message_id.as_deref(), Some("mid.1"));
    }

    #[ntex::test]
    async fn test_send_propagates_transport_error() {
        let mut mock_transport = MockGraphTransport::new();
        mock_transport
            .expect_post()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("Graph API returned error status 400")));

        let result = client_with(mock_transport)
            .send_image("U1", "https://example.com/cat.png")
            .await;

        assert!(result.is_err_and(|e| e.to_string().contains("400")));
    }

    #[ntex::test]
    async fn test_send_rejects_malformed_response() {
        let mut mock_transport = MockGraphTransport::new();
        mock_transport
            .expect_post()
            .times(1)
            .returning(|_, _| Ok(json!({"recipient_id": "U1", "message_id": 5})));

        let result = client_with(mock_transport).send_text("U1", "hi").await;

        assert!(result.is_err_and(|e| e.to_string() == "Failed to parse send response"));
    }

    #[ntex::test]
    async fn test_send_accepts_empty_response() {
        let mut mock_transport = MockGraphTransport::new();
        mock_transport
            .expect_post()
            .times(1)
            .returning(|_, _| Ok(json!({})));

        let response = client_with(mock_transport).send_text("U1", "hi").await.unwrap();

        assert_eq!(response, SendResponse::default());
    }

    #[ntex::test]
    async fn test_typing_sends_sender_action() {
        let mut mock_transport = MockGraphTransport::new();
        mock_transport
            .expect_post()
            .withf(|_, body| body["sender_action"] == "typing_off")
            .times(1)
            .returning(|_, _| Ok(json!({})));

        assert!(client_with(mock_transport).typing("U1", false).await.is_ok());
    }

    #[ntex::test]
    async fn test_fetch_user_hydrates_entity() {
        let mut mock_transport = MockGraphTransport::new();
        mock_transport
            .expect_get()
            .withf(|path, query| {
                path.to_string() == "U1"
                    && *query == vec![("fields".to_string(), USER_FIELDS.join(","))]
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({"first_name": "Ada", "last_name": "Lovelace", "timezone": 1, "id": "U1"}))
            });

        let user = client_with(mock_transport).fetch_user("U1").await.unwrap();

        assert_eq!(user.id.as_deref(), Some("U1"));
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.timezone, Some(1.0));
    }

    #[ntex::test]
    async fn test_page_settings_paths() {
        let mut mock_transport = MockGraphTransport::new();
        mock_transport
            .expect_post()
            .withf(|path, body| {
                path.to_string() == "me/thread_settings" && body["setting_type"] == "greeting"
            })
            .times(1)
            .returning(|_, _| Ok(json!({"result": "success"})));
        mock_transport
            .expect_post()
            .withf(|path, body| {
                path.to_string() == "me/thread_settings"
                    && body["call_to_actions"][0]["payload"] == "GET_STARTED"
            })
            .times(1)
            .returning(|_, _| Ok(json!({"result": "success"})));
        mock_transport
            .expect_post()
            .withf(|path, _| path.to_string() == "me/subscribed_apps")
            .times(1)
            .returning(|_, _| Ok(json!({"success": true})));

        let client = client_with(mock_transport);

        assert!(client.set_greeting_text("Hello!").await.is_ok());
        assert!(client.set_get_started_button_payload("GET_STARTED").await.is_ok());
        assert_eq!(
            client.subscribe_to_page().await.unwrap(),
            json!({"success": true})
        );
    }
}
