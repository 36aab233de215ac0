//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::Request,
};
use ed25519_dalek::{Signer, SigningKey};
use tempfile::TempDir;

use demos::api::{AppState, app};
use demos::core::db::{async_db, initialize_db};
use demos::core::{AppConfig, GoogleAuthConfig, ResponseMode};
use demos::google::CredentialRecord;

pub const APPLICATION_ID: &str = "test-app-id";
pub const CALENDAR_ID: &str = "demos";
pub const CLIENT_ID: &str = "test_client_id";
pub const INTERACTION_TOKEN: &str = "interaction-token";
const SIGNATURE_TIMESTAMP: &str = "1700000000";

/// Everything a test needs to drive the app and stub its upstreams.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    /// Stands in for both the Google token endpoint and Calendar API
    pub google: mockito::ServerGuard,
    pub discord: mockito::ServerGuard,
    // Keeps the db directory alive for the duration of the test
    _dir: TempDir,
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

/// Creates a test application router backed by a temporary db and
/// mock Google and Discord servers.
pub async fn test_app(response_mode: ResponseMode) -> TestApp {
    let google = mockito::Server::new_async().await;
    let discord = mockito::Server::new_async().await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("db");
    std::fs::create_dir_all(&db_path).expect("Failed to create db directory");
    let db_path = db_path.to_str().unwrap().to_string();

    let db = async_db(&db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = AppConfig {
        db_path,
        base_url: String::from("http://localhost:2222"),
        calendar_id: String::from(CALENDAR_ID),
        google_auth: GoogleAuthConfig::OAuth {
            client_id: String::from(CLIENT_ID),
            client_secret: String::from("test_client_secret"),
        },
        google_token_url: format!("{}/token", google.url()),
        google_auth_url: String::from("https://accounts.google.com/o/oauth2/v2/auth"),
        google_calendar_api_url: google.url(),
        discord_application_id: String::from(APPLICATION_ID),
        discord_public_key: hex::encode(signing_key().verifying_key().to_bytes()),
        discord_bot_token: None,
        discord_api_url: discord.url(),
        response_mode,
    };
    let state = Arc::new(AppState::new(db, app_config).expect("Failed to build app state"));

    TestApp {
        router: app(Arc::clone(&state)),
        state,
        google,
        discord,
        _dir: dir,
    }
}

/// Store credentials whose access token stays valid for an hour.
pub async fn seed_credentials(state: &AppState, access_token: &str) {
    CredentialRecord::new(
        access_token.to_string(),
        String::from("stored_refresh"),
        3600,
    )
    .save(state.store.as_ref())
    .await
    .unwrap();
}

/// An interactions request signed with the test key.
pub fn signed_request(body: &str) -> Request<Body> {
    let mut message = SIGNATURE_TIMESTAMP.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    let signature = signing_key().sign(&message);

    Request::builder()
        .uri("/api/interactions")
        .method("POST")
        .header("content-type", "application/json")
        .header("x-signature-ed25519", hex::encode(signature.to_bytes()))
        .header("x-signature-timestamp", SIGNATURE_TIMESTAMP)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Body of a `/demos` slash command, with an optional `days` option.
pub fn demos_command(days: Option<f64>) -> String {
    let options = match days {
        Some(days) => serde_json::json!([{"name": "days", "type": 10, "value": days}]),
        None => serde_json::json!([]),
    };
    serde_json::json!({
        "type": 2,
        "token": INTERACTION_TOKEN,
        "data": {"name": "demos", "options": options},
    })
    .to_string()
}

/// A calendar event in the shape the Calendar API returns.
pub fn event(id: &str, summary: &str, color_id: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "summary": summary,
        "colorId": color_id,
        "start": {"dateTime": "2026-10-20T15:00:00-07:00"},
        "htmlLink": format!("https://calendar.google.com/event?eid={}", id),
    })
}

pub fn followup_path() -> String {
    format!(
        "/webhooks/{}/{}/messages/@original",
        APPLICATION_ID, INTERACTION_TOKEN
    )
}

pub fn events_path() -> String {
    format!("/calendars/{}/events", CALENDAR_ID)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
