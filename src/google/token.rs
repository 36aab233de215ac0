//! Produces usable bearer tokens for the calendar API

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::oauth::OAuthClient;
use super::store::{CredentialRecord, CredentialStore, expire_access_token};
use crate::core::CalendarError;

/// Anything that can hand out a bearer token for Google APIs.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token, refreshing first when `force_refresh` is set or
    /// the cached one is no longer valid.
    async fn access_token(&self, force_refresh: bool) -> Result<String, CalendarError>;

    /// Called when Google rejected a token we believed was valid.
    async fn invalidate(&self) -> Result<(), CalendarError>;
}

/// Token provider for the user-delegated flow. Keeps the access token
/// in the credential store and refreshes it with the stored refresh
/// token once it expires.
///
/// Concurrent refreshes are not serialized. Both callers end up with
/// a valid token and the last write wins in the store.
pub struct StoredTokenProvider {
    store: Arc<dyn CredentialStore>,
    oauth: OAuthClient,
}

impl StoredTokenProvider {
    pub fn new(store: Arc<dyn CredentialStore>, oauth: OAuthClient) -> Self {
        Self { store, oauth }
    }
}

#[async_trait]
impl TokenProvider for StoredTokenProvider {
    async fn access_token(&self, force_refresh: bool) -> Result<String, CalendarError> {
        let Some(record) = CredentialRecord::load(self.store.as_ref()).await? else {
            tracing::warn!("No Google credentials stored, authorization required");
            return Err(CalendarError::Unauthenticated);
        };

        if !force_refresh && !record.is_expired(Utc::now()) {
            return Ok(record.access_token);
        }

        tracing::debug!(
            "Refreshing Google access token (forced: {}, expired at {})",
            force_refresh,
            record.expires_at
        );
        let granted = self.oauth.refresh_access_token(&record.refresh_token).await?;

        // Google does not rotate refresh tokens on this grant
        let refreshed = CredentialRecord::new(
            granted.access_token,
            record.refresh_token,
            granted.expires_in,
        );
        refreshed.save(self.store.as_ref()).await?;

        Ok(refreshed.access_token)
    }

    async fn invalidate(&self) -> Result<(), CalendarError> {
        expire_access_token(self.store.as_ref()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::oauth::tests::test_client;
    use crate::google::store::tests::memory_store;
    use crate::google::store::{CredentialKey, SqliteCredentialStore};

    async fn seeded_store(access_token: &str, expires_at_ms: i64) -> SqliteCredentialStore {
        let store = memory_store().await;
        store
            .put(CredentialKey::AccessToken, access_token)
            .await
            .unwrap();
        store
            .put(CredentialKey::RefreshToken, "stored_refresh")
            .await
            .unwrap();
        store
            .put(CredentialKey::TokenExpiry, &expires_at_ms.to_string())
            .await
            .unwrap();
        store
    }

    async fn token_endpoint(server: &mut mockito::Server, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::Regex(
                "refresh_token=stored_refresh".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "refreshed", "expires_in": 3600}"#)
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_valid_token_skips_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 0).await;
        let future = Utc::now().timestamp_millis() + 60 * 60 * 1000;
        let store = Arc::new(seeded_store("cached", future).await);

        let provider = StoredTokenProvider::new(
            store.clone(),
            test_client(&format!("{}/token", server.url())),
        );

        assert_eq!(provider.access_token(false).await.unwrap(), "cached");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_once_and_persists() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 1).await;
        let past = Utc::now().timestamp_millis() - 1000;
        let store = Arc::new(seeded_store("stale", past).await);

        let provider = StoredTokenProvider::new(
            store.clone(),
            test_client(&format!("{}/token", server.url())),
        );

        assert_eq!(provider.access_token(false).await.unwrap(), "refreshed");
        mock.assert_async().await;

        let record = CredentialRecord::load(store.as_ref()).await.unwrap().unwrap();
        assert_eq!(record.access_token, "refreshed");
        assert_eq!(record.refresh_token, "stored_refresh");
        assert!(!record.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_expiry() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 1).await;
        let future = Utc::now().timestamp_millis() + 60 * 60 * 1000;
        let store = Arc::new(seeded_store("cached", future).await);

        let provider = StoredTokenProvider::new(
            store.clone(),
            test_client(&format!("{}/token", server.url())),
        );

        assert_eq!(provider.access_token(true).await.unwrap(), "refreshed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_credentials_are_unauthenticated() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 0).await;
        let store = memory_store().await;
        store
            .put(CredentialKey::RefreshToken, "stored_refresh")
            .await
            .unwrap();

        let provider = StoredTokenProvider::new(
            Arc::new(store),
            test_client(&format!("{}/token", server.url())),
        );

        let result = provider.access_token(true).await;
        assert!(matches!(result, Err(CalendarError::Unauthenticated)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalidate_forces_next_read_to_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 1).await;
        let future = Utc::now().timestamp_millis() + 60 * 60 * 1000;
        let store = Arc::new(seeded_store("cached", future).await);

        let provider = StoredTokenProvider::new(
            store.clone(),
            test_client(&format!("{}/token", server.url())),
        );

        provider.invalidate().await.unwrap();
        assert_eq!(provider.access_token(false).await.unwrap(), "refreshed");
        mock.assert_async().await;
    }
}
