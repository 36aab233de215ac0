//! Router for the Discord interactions API

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use super::public::InteractionError;
use crate::api::deferred::{SYNC_DEADLINE, respond_now};
use crate::api::state::AppState;
use crate::core::ResponseMode;
use crate::discord::commands::{DAYS_OPTION, DEMOS_COMMAND, PING_COMMAND};
use crate::discord::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::discord::{Interaction, InteractionKind, InteractionResponse, WebhookMessage};
use crate::google::LookaheadDays;

type SharedState = Arc<AppState>;

fn unknown_type() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(InteractionError::unknown_type()),
    )
        .into_response()
}

/// Check the request signature over the raw body before anything
/// else looks at it.
fn verified_interaction(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Interaction, Response> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok());
    let valid = match (signature, timestamp) {
        (Some(signature), Some(timestamp)) => state.verifier.verify(timestamp, body, signature),
        _ => false,
    };
    if !valid {
        tracing::warn!("Rejected interaction with a bad signature");
        return Err((StatusCode::UNAUTHORIZED, "Bad request signature.").into_response());
    }

    serde_json::from_slice(body).map_err(|err| {
        tracing::warn!("Failed to parse interaction: {}", err);
        (StatusCode::BAD_REQUEST, "Invalid interaction body").into_response()
    })
}

async fn demos_command(state: SharedState, interaction: Interaction) -> Response {
    let lookahead = LookaheadDays::new(interaction.number_option(DAYS_OPTION));
    tracing::info!("Looking for demos in the next {} days", lookahead);

    match state.config.response_mode {
        ResponseMode::Deferred => {
            let demos = state.demos.clone();
            let (ack, _) = state
                .coordinator
                .defer(interaction.token, async move { demos.report(lookahead).await });
            ack.into_response()
        }
        ResponseMode::Immediate => {
            Json(respond_now(state.demos.report(lookahead), SYNC_DEADLINE).await).into_response()
        }
    }
}

/// Handle every interaction Discord posts to the bot
async fn interactions_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let interaction = match verified_interaction(&state, &headers, &body) {
        Ok(interaction) => interaction,
        Err(response) => return response,
    };

    match interaction.kind() {
        InteractionKind::Ping => Json(InteractionResponse::pong()).into_response(),
        InteractionKind::ApplicationCommand => match interaction.command_name().as_deref() {
            Some(PING_COMMAND) => Json(InteractionResponse::message(WebhookMessage::ephemeral(
                "Pong!",
            )))
            .into_response(),
            Some(DEMOS_COMMAND) => demos_command(state, interaction).await,
            other => {
                tracing::error!("Unknown command: {:?}", other);
                unknown_type()
            }
        },
        InteractionKind::Other(kind) => {
            tracing::error!("Unknown interaction type: {}", kind);
            unknown_type()
        }
    }
}

/// Create the interactions router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::post(interactions_handler))
}
