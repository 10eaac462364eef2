//! Application configuration loaded from environment variables.
//!
//! # Security Notes
//! - Fields marked SENSITIVE must never be logged
//! - The app secret is what proves webhook origin; rotating it in the Meta
//!   dashboard requires a restart

use anyhow::anyhow;
use envconfig::Envconfig;
use std::sync::OnceLock;

/// Environment variables used to configure the webhook server.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    /// Example: "0.0.0.0", "localhost"
    #[envconfig(default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "8080")]
    pub web_server_port: u16,

    /// Path to SSL private key file, used in prod only (SENSITIVE PATH)
    #[envconfig(default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file, used in prod only (NON-SENSITIVE)
    #[envconfig(default = "server.crt")]
    pub certificate_path: String,

    /// 🔒 SENSITIVE: App secret keying the `X-Hub-Signature` HMAC
    pub facebook_app_secret: String,

    /// 🔒 SENSITIVE: Page access token for the Graph API
    pub facebook_access_token: String,

    /// 🔒 SENSITIVE: Token echoed by Meta during webhook verification
    pub facebook_verify_token: String,

    /// Expected `object` of webhook envelopes (NON-SENSITIVE)
    #[envconfig(default = "page")]
    pub facebook_object_type: String,

    /// Graph API version prefix (NON-SENSITIVE)
    #[envconfig(default = "v2.9")]
    pub graph_api_version: String,

    /// Text sent when a user taps the get-started button
    pub greeting_text: Option<String>,

    /// Postback payload of the get-started button
    pub get_started_payload: Option<String>,

    /// Whether webhook signatures are checked. Only disable for local testing.
    #[envconfig(default = "true")]
    pub enforce_origin: bool,

    /// 🔒 SENSITIVE: Logfire write token; plain stdout logging when unset
    pub logfire_token: Option<String>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!(
            "{host}:{port}",
            host = self.web_server_host,
            port = self.web_server_port
        )
    }
}

/// Global application configuration, set once by [`init_config`]
pub static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Loads [`AppConfig`] from the environment into [`APP_CONFIG`].
///
/// Calling it again returns the already loaded configuration.
pub fn init_config() -> anyhow::Result<&'static AppConfig> {
    if let Some(app_config) = APP_CONFIG.get() {
        return Ok(app_config);
    }

    let app_config = AppConfig::init_from_env()
        .map_err(|e| anyhow!("failed to load configuration from environment: {e:?}"))?;

    Ok(APP_CONFIG.get_or_init(|| app_config))
}
