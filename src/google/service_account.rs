//! Service account flow: sign a JWT assertion and trade it for an
//! access token on every call. Nothing is persisted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::oauth::{CALENDAR_READONLY_SCOPE, TokenResponse};
use super::token::TokenProvider;
use crate::core::CalendarError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields we need from the key file Google hands out.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .context("Service account key is not valid base64")?;
        serde_json::from_slice(&bytes).context("Service account key is not valid JSON")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
}

pub struct ServiceAccountTokenProvider {
    http: Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
}

impl ServiceAccountTokenProvider {
    pub fn new(http: Client, key: ServiceAccountKey) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("Service account private key is not a valid RSA PEM")?;
        Ok(Self {
            http,
            key,
            signing_key,
        })
    }

    pub fn from_base64(http: Client, encoded: &str) -> Result<Self> {
        Self::new(http, ServiceAccountKey::from_base64(encoded)?)
    }

    pub fn assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            sub: self.key.client_email.clone(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
            scope: CALENDAR_READONLY_SCOPE.to_string(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .context("Failed to sign service account assertion")
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    // Every call mints a new token, so forcing a refresh changes nothing.
    async fn access_token(&self, _force_refresh: bool) -> Result<String, CalendarError> {
        let assertion = self.assertion()?;
        let res = self
            .http
            .post(&self.key.token_uri)
            .json(&serde_json::json!({
                "grant_type": JWT_BEARER_GRANT,
                "assertion": assertion,
            }))
            .send()
            .await
            .context("Failed to send service account token request")?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!("Failed to get service account token: {} ({})", status, text);
            return Err(CalendarError::Unauthenticated);
        }

        let body: TokenResponse = serde_json::from_str(&text)
            .context("Failed to parse service account token response")?;
        match body.access_token {
            Some(token) if !token.is_empty() => {
                tracing::debug!("Minted service account token for {}", self.key.client_email);
                Ok(token)
            }
            _ => {
                tracing::error!("Service account token response had no access token");
                Err(CalendarError::Unauthenticated)
            }
        }
    }

    async fn invalidate(&self) -> Result<(), CalendarError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const TEST_KEY_PEM: &str = include_str!("../../tests/fixtures/service_account_key.pem");

    fn test_key(token_uri: &str) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "demos@project.iam.gserviceaccount.com".to_string(),
            private_key: TEST_KEY_PEM.to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    #[test]
    fn test_key_from_base64() {
        let json = serde_json::json!({
            "type": "service_account",
            "project_id": "project",
            "private_key_id": "abc",
            "private_key": TEST_KEY_PEM,
            "client_email": "demos@project.iam.gserviceaccount.com",
            "client_id": "123",
            "token_uri": "https://oauth2.googleapis.com/token",
        });
        let encoded = STANDARD.encode(json.to_string());

        let key = ServiceAccountKey::from_base64(&encoded).unwrap();
        assert_eq!(key.client_email, "demos@project.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
        assert!(ServiceAccountKey::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_assertion_claims() {
        let provider =
            ServiceAccountTokenProvider::new(Client::new(), test_key("https://example.com/token"))
                .unwrap();
        let assertion = provider.assertion().unwrap();

        let parts: Vec<&str> = assertion.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "RS256");

        let claims: AssertionClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(claims.iss, "demos@project.iam.gserviceaccount.com");
        assert_eq!(claims.sub, claims.iss);
        assert_eq!(claims.aud, "https://example.com/token");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.scope, CALENDAR_READONLY_SCOPE);
    }

    #[test]
    fn test_rejects_invalid_private_key() {
        let mut key = test_key("https://example.com/token");
        key.private_key = "not a key".to_string();
        assert!(ServiceAccountTokenProvider::new(Client::new(), key).is_err());
    }

    #[tokio::test]
    async fn test_mints_token_per_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "grant_type": JWT_BEARER_GRANT,
            })))
            .with_status(200)
            .with_body(r#"{"access_token": "minted", "expires_in": 3599}"#)
            .expect(2)
            .create_async()
            .await;

        let provider = ServiceAccountTokenProvider::new(
            Client::new(),
            test_key(&format!("{}/token", server.url())),
        )
        .unwrap();

        assert_eq!(provider.access_token(false).await.unwrap(), "minted");
        assert_eq!(provider.access_token(false).await.unwrap(), "minted");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_assertion_is_unauthenticated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let provider = ServiceAccountTokenProvider::new(
            Client::new(),
            test_key(&format!("{}/token", server.url())),
        )
        .unwrap();

        let result = provider.access_token(false).await;
        assert!(matches!(result, Err(CalendarError::Unauthenticated)));
    }
}
