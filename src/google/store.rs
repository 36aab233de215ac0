//! Durable storage for the user-delegated Google credentials

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio_rusqlite::Connection;

/// Stored expiry value meaning "treat the access token as expired".
pub const EXPIRED_SENTINEL: &str = "-1";

/// Upper bound on the lifetime we accept from a token endpoint. Google
/// issues one hour, anything past a day is not believable.
const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    TokenExpiry,
}

impl CredentialKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "google_access_token",
            CredentialKey::RefreshToken => "google_refresh_token",
            CredentialKey::TokenExpiry => "google_token_expire",
        }
    }
}

/// Key-value access to the three credential fields. Writes are
/// independent, there is no transaction across keys.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>>;
    async fn put(&self, key: CredentialKey, value: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteCredentialStore {
    db: Connection,
}

impl SqliteCredentialStore {
    pub fn new(db: Connection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        let value = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
                let mut rows = stmt.query([key.as_str()])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get::<_, String>(0)?)),
                    None => Ok(None),
                }
            })
            .await
            .with_context(|| format!("Failed to read {} from the store", key.as_str()))?;
        Ok(value)
    }

    async fn put(&self, key: CredentialKey, value: &str) -> Result<()> {
        let value = value.to_string();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    (key.as_str(), &value),
                )?;
                Ok(())
            })
            .await
            .with_context(|| format!("Failed to write {} to the store", key.as_str()))?;
        Ok(())
    }
}

/// The persisted credential triple. Only exists when all three fields
/// are present in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self::issued_at(Utc::now(), access_token, refresh_token, expires_in)
    }

    /// `expires_in` is clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn issued_at(
        now: DateTime<Utc>,
        access_token: String,
        refresh_token: String,
        expires_in: i64,
    ) -> Self {
        let lifetime = expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        if lifetime != expires_in {
            tracing::warn!("Token lifetime of {}s clamped to {}s", expires_in, lifetime);
        }
        let expires_at = TimeDelta::try_seconds(lifetime)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(now);
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub async fn load(store: &dyn CredentialStore) -> Result<Option<Self>> {
        let access_token = store.get(CredentialKey::AccessToken).await?;
        let refresh_token = store.get(CredentialKey::RefreshToken).await?;
        let expiry = store.get(CredentialKey::TokenExpiry).await?;

        let (Some(access_token), Some(refresh_token), Some(expiry)) =
            (access_token, refresh_token, expiry)
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            access_token,
            refresh_token,
            expires_at: parse_expiry(&expiry),
        }))
    }

    pub async fn save(&self, store: &dyn CredentialStore) -> Result<()> {
        store
            .put(CredentialKey::AccessToken, &self.access_token)
            .await?;
        store
            .put(CredentialKey::RefreshToken, &self.refresh_token)
            .await?;
        store
            .put(
                CredentialKey::TokenExpiry,
                &self.expires_at.timestamp_millis().to_string(),
            )
            .await
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Mark the stored access token as expired without touching the
/// token itself.
pub async fn expire_access_token(store: &dyn CredentialStore) -> Result<()> {
    store
        .put(CredentialKey::TokenExpiry, EXPIRED_SENTINEL)
        .await
}

// Anything unparseable is treated as already expired so the next
// read refreshes instead of trusting a token we can't date.
fn parse_expiry(raw: &str) -> DateTime<Utc> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(|| {
            tracing::warn!("Unreadable token expiry {:?}, treating as expired", raw);
            DateTime::<Utc>::MIN_UTC
        })
}
