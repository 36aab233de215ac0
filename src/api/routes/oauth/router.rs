//! Router for the Google OAuth API

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Query;

use super::public::CallbackQuery;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::google::CredentialRecord;

type SharedState = Arc<AppState>;

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Send the operator to Google's consent screen
async fn authorize_handler(State(state): State<SharedState>) -> Response {
    match &state.oauth {
        Some(oauth) => Redirect::temporary(&oauth.authorization_url()).into_response(),
        None => not_found(),
    }
}

/// Exchange the one-time code for tokens and persist them
async fn callback_handler(
    State(state): State<SharedState>,
    Query(params): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let Some(oauth) = &state.oauth else {
        return Ok(not_found());
    };

    if let Some(error) = params.error {
        tracing::warn!("Google consent was not granted: {}", error);
        return Ok((
            StatusCode::BAD_REQUEST,
            format!("Authorization failed: {}", error),
        )
            .into_response());
    }
    let Some(code) = params.code else {
        return Ok((StatusCode::BAD_REQUEST, "Missing code").into_response());
    };

    let granted = oauth.exchange_code_for_token(&code).await?;
    let refresh_token = granted
        .refresh_token
        .ok_or_else(|| anyhow!("Google did not return a refresh token"))?;

    CredentialRecord::new(granted.access_token, refresh_token, granted.expires_in)
        .save(state.store.as_ref())
        .await?;
    tracing::info!("Stored new Google credentials");

    Ok((StatusCode::OK, "Calendar access authorized. You can close this tab.").into_response())
}

/// Create the OAuth router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/google", axum::routing::get(authorize_handler))
        .route("/google/callback", axum::routing::get(callback_handler))
}
