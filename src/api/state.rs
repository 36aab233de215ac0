use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_rusqlite::Connection;

use super::deferred::DeferredResponseCoordinator;
use crate::core::{AppConfig, GoogleAuthConfig};
use crate::demos::DemosService;
use crate::discord::{DiscordClient, SignatureVerifier};
use crate::google::{
    CalendarFetcher, CredentialStore, OAuthClient, ServiceAccountTokenProvider,
    SqliteCredentialStore, StoredTokenProvider, TokenProvider,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn CredentialStore>,
    // Only set in the user-delegated OAuth mode
    pub oauth: Option<OAuthClient>,
    pub demos: DemosService,
    pub coordinator: DeferredResponseCoordinator,
    pub verifier: SignatureVerifier,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        let store: Arc<dyn CredentialStore> = Arc::new(SqliteCredentialStore::new(db));
        let oauth = OAuthClient::from_config(http.clone(), &config);

        let tokens: Arc<dyn TokenProvider> = match (&config.google_auth, &oauth) {
            (GoogleAuthConfig::ServiceAccount { key_base64 }, _) => {
                tracing::info!("Using a Google service account for calendar access");
                Arc::new(ServiceAccountTokenProvider::from_base64(
                    http.clone(),
                    key_base64,
                )?)
            }
            (GoogleAuthConfig::OAuth { .. }, Some(oauth)) => {
                Arc::new(StoredTokenProvider::new(store.clone(), oauth.clone()))
            }
            (GoogleAuthConfig::OAuth { .. }, None) => {
                anyhow::bail!("OAuth client missing for the OAuth auth mode")
            }
        };

        let fetcher = CalendarFetcher::new(
            http.clone(),
            &config.google_calendar_api_url,
            &config.calendar_id,
            tokens,
        );
        let demos = DemosService::new(
            Arc::new(fetcher),
            oauth.as_ref().map(OAuthClient::authorization_url),
        );
        let coordinator = DeferredResponseCoordinator::new(DiscordClient::new(
            http,
            &config.discord_api_url,
            &config.discord_application_id,
        ));
        let verifier = SignatureVerifier::from_hex(&config.discord_public_key)?;

        Ok(Self {
            config,
            store,
            oauth,
            demos,
            coordinator,
            verifier,
        })
    }
}
