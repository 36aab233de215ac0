//! User-delegated OAuth against Google's token endpoint

use anyhow::{Context, anyhow};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::core::{AppConfig, CalendarError, GoogleAuthConfig};

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Google's documented lifetime for access tokens, used when a
/// response leaves `expires_in` out.
const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
}

/// A token endpoint answer that carried an access token.
#[derive(Debug, Clone)]
pub struct GrantedToken {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
}

#[derive(Clone)]
pub struct OAuthClient {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    auth_url: String,
}

impl OAuthClient {
    pub fn new(
        http: Client,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        token_url: &str,
        auth_url: &str,
    ) -> Self {
        Self {
            http,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            token_url: token_url.to_string(),
            auth_url: auth_url.to_string(),
        }
    }

    /// Build the client for the user-delegated flow. Returns `None`
    /// when the app runs with a service account.
    pub fn from_config(http: Client, config: &AppConfig) -> Option<Self> {
        match &config.google_auth {
            GoogleAuthConfig::OAuth {
                client_id,
                client_secret,
            } => Some(Self::new(
                http,
                client_id,
                client_secret,
                &config.oauth_redirect_uri(),
                &config.google_token_url,
                &config.google_auth_url,
            )),
            GoogleAuthConfig::ServiceAccount { .. } => None,
        }
    }

    /// Consent URL an operator opens to grant calendar access. Offline
    /// access with a forced consent prompt so Google hands out a
    /// refresh token every time.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(CALENDAR_READONLY_SCOPE)
        )
    }

    /// Trade the one-time authorization code for tokens.
    pub async fn exchange_code_for_token(&self, code: &str) -> anyhow::Result<GrantedToken> {
        let res = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .context("Failed to send code exchange request")?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Code exchange failed: {} ({})", status, text);
        }
        let body: TokenResponse =
            serde_json::from_str(&text).context("Failed to parse code exchange response")?;
        granted(body).ok_or_else(|| anyhow!("No access token in code exchange response"))
    }

    /// Use the long-lived refresh token to get a new access token.
    ///
    /// A rejected grant (revoked or unknown refresh token) and a
    /// success response without an access token both mean the stored
    /// credentials are no good, so they map to `Unauthenticated`.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<GrantedToken, CalendarError> {
        let res = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .context("Failed to send token refresh request")?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Token refresh rejected: {} ({})", status, text);
            return Err(CalendarError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(anyhow!("Token refresh failed: {} ({})", status, text).into());
        }

        let body: TokenResponse =
            serde_json::from_str(&text).context("Failed to parse token refresh response")?;
        if let Some(error) = &body.error {
            tracing::warn!("Token refresh returned error: {}", error);
        }
        granted(body).ok_or_else(|| {
            tracing::warn!("Token refresh response had no access token");
            CalendarError::Unauthenticated
        })
    }
}

fn granted(body: TokenResponse) -> Option<GrantedToken> {
    let access_token = body.access_token.filter(|t| !t.is_empty())?;
    Some(GrantedToken {
        access_token,
        expires_in: body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
        refresh_token: body.refresh_token.filter(|t| !t.is_empty()),
    })
}
