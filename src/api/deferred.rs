//! Two-phase interaction replies.
//!
//! Discord expects an answer to an interaction within a few seconds,
//! while reading the calendar can take longer. The coordinator answers
//! right away with a "thinking..." placeholder and edits the original
//! response once the real message is ready.
//!
//! The background work is owned by a `TaskTracker` so shutdown can
//! wait for follow-ups that are still in flight instead of dropping
//! them.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::response::{IntoResponse, Response};
use futures_util::Stream;
use http::{StatusCode, header};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::demos::report::FAILURE_NOTICE;
use crate::discord::{DiscordClient, InteractionResponse, WebhookMessage};

/// How long the immediate variant may spend before answering.
pub const SYNC_DEADLINE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Received,
    Acknowledged,
    Delivered,
    /// The follow-up could not be sent. Only visible in the logs.
    Failed,
}

/// The deferred acknowledgement for an interaction. The background
/// work is released once the response body has been handed over to the
/// connection, not when the handler returns.
pub struct Acknowledgement {
    acked: oneshot::Sender<()>,
}

impl IntoResponse for Acknowledgement {
    fn into_response(self) -> Response {
        let payload = match serde_json::to_vec(&InteractionResponse::deferred()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!("Failed to serialize acknowledgement: {}", err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        let length = payload.len();
        let body = Body::from_stream(AckBody {
            payload: Some(Bytes::from(payload)),
            acked: Some(self.acked),
        });

        (
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (header::CONTENT_LENGTH, length.to_string()),
            ],
            body,
        )
            .into_response()
    }
}

/// Single chunk body that signals once it has been read to the end or
/// dropped by the server after writing it.
struct AckBody {
    payload: Option<Bytes>,
    acked: Option<oneshot::Sender<()>>,
}

impl AckBody {
    fn release(&mut self) {
        if let Some(acked) = self.acked.take() {
            let _ = acked.send(());
        }
    }
}

impl Stream for AckBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.payload.take() {
            Some(payload) => Poll::Ready(Some(Ok(payload))),
            None => {
                self.release();
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for AckBody {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Clone)]
pub struct DeferredResponseCoordinator {
    discord: DiscordClient,
    tracker: TaskTracker,
}

impl DeferredResponseCoordinator {
    pub fn new(discord: DiscordClient) -> Self {
        Self {
            discord,
            tracker: TaskTracker::new(),
        }
    }

    /// Schedule `work` to run once the returned acknowledgement has
    /// been written out and send its message as the follow-up for the
    /// interaction identified by `interaction_token`.
    ///
    /// `work` is not polled before the acknowledgement body has been
    /// consumed, so no upstream call can start ahead of it.
    pub fn defer<F>(
        &self,
        interaction_token: String,
        work: F,
    ) -> (Acknowledgement, JoinHandle<InteractionState>)
    where
        F: Future<Output = WebhookMessage> + Send + 'static,
    {
        let (acked_tx, acked_rx) = oneshot::channel();
        let discord = self.discord.clone();
        tracing::debug!(state = ?InteractionState::Received, "Deferring interaction");

        let handle = self.tracker.spawn(async move {
            if acked_rx.await.is_err() {
                tracing::warn!(
                    state = ?InteractionState::Received,
                    "Interaction was never acknowledged, skipping follow-up"
                );
                return InteractionState::Received;
            }
            tracing::debug!(state = ?InteractionState::Acknowledged, "Interaction acknowledged");

            let message = work.await;
            match discord
                .edit_original_response(&interaction_token, &message)
                .await
            {
                Ok(()) => {
                    tracing::info!(state = ?InteractionState::Delivered, "Follow-up delivered");
                    InteractionState::Delivered
                }
                Err(err) => {
                    tracing::error!(state = ?InteractionState::Failed, "{}", err);
                    InteractionState::Failed
                }
            }
        });

        (Acknowledgement { acked: acked_tx }, handle)
    }

    /// Number of follow-ups still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every follow-up scheduled so far, then keep accepting
    /// new ones.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stop accepting work and wait for what is in flight.
    pub async fn shutdown(&self) {
        tracing::info!("Waiting for {} in-flight follow-ups", self.tracker.len());
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// The single-response variant: do all the work inside the request,
/// bounded by `deadline`, and answer with the finished message.
pub async fn respond_now<F>(work: F, deadline: Duration) -> InteractionResponse
where
    F: Future<Output = WebhookMessage>,
{
    match tokio::time::timeout(deadline, work).await {
        Ok(message) => InteractionResponse::message(message),
        Err(_) => {
            tracing::error!("Interaction work missed the {:?} deadline", deadline);
            InteractionResponse::message(WebhookMessage::text(FAILURE_NOTICE))
        }
    }
}
