use anyhow::anyhow;
use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct AppConfig {
    #[envconfig(default = "local")]
    pub env: String,
    pub facebook_access_token: Option<String>,
    pub facebook_app_secret: Option<String>,
    #[envconfig(default = "v2.9")]
    pub graph_api_version: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::init_from_env().map_err(|e| anyhow!("failed to load configuration: {e:?}"))
    }

    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    pub fn access_token(&self) -> anyhow::Result<&str> {
        self.facebook_access_token
            .as_deref()
            .ok_or_else(|| anyhow!("FACEBOOK_ACCESS_TOKEN is not set"))
    }

    pub fn app_secret(&self) -> anyhow::Result<&str> {
        self.facebook_app_secret
            .as_deref()
            .ok_or_else(|| anyhow!("FACEBOOK_APP_SECRET is not set"))
    }
}
