//! The `/demos` pipeline: read the calendar, keep the interesting
//! events and turn the result into a message.

pub mod filter;
pub mod report;

use std::sync::Arc;

use crate::core::CalendarError;
use crate::discord::WebhookMessage;
use crate::google::{CalendarEvent, CalendarFetcher, CalendarWindow, LookaheadDays};

pub use filter::is_relevant;

/// What a run of the pipeline produced. Each variant gets its own
/// message so "nothing scheduled" never reads like "can't log in".
#[derive(Debug)]
pub enum DemosOutcome {
    Found(Vec<CalendarEvent>),
    NoEvents,
    Unauthenticated,
    Failed(anyhow::Error),
}

impl From<Result<Vec<CalendarEvent>, CalendarError>> for DemosOutcome {
    fn from(result: Result<Vec<CalendarEvent>, CalendarError>) -> Self {
        match result {
            Ok(events) if events.is_empty() => DemosOutcome::NoEvents,
            Ok(events) => DemosOutcome::Found(events),
            Err(CalendarError::Unauthenticated) => DemosOutcome::Unauthenticated,
            Err(CalendarError::Upstream(err)) => DemosOutcome::Failed(err),
        }
    }
}

#[derive(Clone)]
pub struct DemosService {
    fetcher: Arc<CalendarFetcher>,
    authorization_url: Option<String>,
}

impl DemosService {
    /// `authorization_url` is where an operator re-authorizes Google
    /// access. There is none in service account mode.
    pub fn new(fetcher: Arc<CalendarFetcher>, authorization_url: Option<String>) -> Self {
        Self {
            fetcher,
            authorization_url,
        }
    }

    pub async fn events_of_interest(
        &self,
        lookahead: LookaheadDays,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let window = CalendarWindow::from_now(lookahead);
        let events = self.fetcher.fetch_events(&window).await?;
        let total = events.len();
        let relevant: Vec<CalendarEvent> = events.into_iter().filter(is_relevant).collect();
        tracing::debug!("{} of {} events are of interest", relevant.len(), total);
        Ok(relevant)
    }

    pub async fn outcome(&self, lookahead: LookaheadDays) -> DemosOutcome {
        let outcome = DemosOutcome::from(self.events_of_interest(lookahead).await);
        match &outcome {
            DemosOutcome::Unauthenticated => {
                tracing::warn!("Calendar access needs to be authorized again")
            }
            DemosOutcome::Failed(err) => tracing::error!("Failed to fetch demos: {:#}", err),
            _ => {}
        }
        outcome
    }

    pub async fn report(&self, lookahead: LookaheadDays) -> WebhookMessage {
        let outcome = self.outcome(lookahead).await;
        report::render(&outcome, lookahead, self.authorization_url.as_deref())
    }
}
