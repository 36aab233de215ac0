use std::env;

use anyhow::{Context, Result, anyhow};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "2222";

/// How the Google side of the integration obtains bearer tokens. The
/// two are separate deployment modes and never active together.
#[derive(Clone, Debug)]
pub enum GoogleAuthConfig {
    /// Base64 encoded service account key JSON. A fresh token is
    /// minted on every call.
    ServiceAccount { key_base64: String },
    /// User-delegated OAuth with a stored refresh token.
    OAuth {
        client_id: String,
        client_secret: String,
    },
}

/// Whether slash commands answer right away with a placeholder and
/// follow up later, or do all the work before the first response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseMode {
    #[default]
    Deferred,
    Immediate,
}

impl std::str::FromStr for ResponseMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deferred" => Ok(ResponseMode::Deferred),
            "immediate" | "sync" => Ok(ResponseMode::Immediate),
            other => Err(anyhow!("Unknown response mode: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Directory holding the sqlite file, `{DEMOS_STORAGE_PATH}/db`
    pub db_path: String,
    pub base_url: String,
    pub calendar_id: String,
    pub google_auth: GoogleAuthConfig,
    pub google_token_url: String,
    pub google_auth_url: String,
    pub google_calendar_api_url: String,
    pub discord_application_id: String,
    pub discord_public_key: String,
    pub discord_bot_token: Option<String>,
    pub discord_api_url: String,
    pub response_mode: ResponseMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let storage_path = env::var("DEMOS_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db", storage_path.trim_end_matches('/'));
        let base_url = env::var("DEMOS_BASE_URL")
            .unwrap_or(format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT));
        let calendar_id = env::var("DEMOS_CALENDAR_ID").unwrap_or("primary".to_string());

        let google_auth = match env::var("DEMOS_GOOGLE_SERVICE_ACCOUNT") {
            Ok(key_base64) if !key_base64.trim().is_empty() => {
                GoogleAuthConfig::ServiceAccount { key_base64 }
            }
            _ => GoogleAuthConfig::OAuth {
                client_id: env::var("DEMOS_GOOGLE_CLIENT_ID").context(
                    "Missing DEMOS_GOOGLE_CLIENT_ID (or DEMOS_GOOGLE_SERVICE_ACCOUNT)",
                )?,
                client_secret: env::var("DEMOS_GOOGLE_CLIENT_SECRET")
                    .context("Missing DEMOS_GOOGLE_CLIENT_SECRET")?,
            },
        };

        let google_token_url = env::var("DEMOS_GOOGLE_TOKEN_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string());
        let google_auth_url = env::var("DEMOS_GOOGLE_AUTH_URL")
            .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string());
        let google_calendar_api_url = env::var("DEMOS_GOOGLE_CALENDAR_API_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string());

        let discord_application_id = env::var("DEMOS_DISCORD_APPLICATION_ID")
            .context("Missing env var DEMOS_DISCORD_APPLICATION_ID")?;
        let discord_public_key = env::var("DEMOS_DISCORD_PUBLIC_KEY")
            .context("Missing env var DEMOS_DISCORD_PUBLIC_KEY")?;
        let discord_bot_token = env::var("DEMOS_DISCORD_BOT_TOKEN").ok();
        let discord_api_url = env::var("DEMOS_DISCORD_API_URL")
            .unwrap_or_else(|_| "https://discord.com/api/v10".to_string());

        let response_mode = match env::var("DEMOS_RESPONSE_MODE") {
            Ok(mode) => mode.parse()?,
            Err(_) => ResponseMode::default(),
        };

        Ok(Self {
            db_path,
            base_url,
            calendar_id,
            google_auth,
            google_token_url,
            google_auth_url,
            google_calendar_api_url,
            discord_application_id,
            discord_public_key,
            discord_bot_token,
            discord_api_url,
            response_mode,
        })
    }

    /// Where Google sends the user back to after consent.
    pub fn oauth_redirect_uri(&self) -> String {
        format!(
            "{}/api/oauth/google/callback",
            self.base_url.trim_end_matches('/')
        )
    }
}
