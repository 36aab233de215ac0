//! Google Calendar events client

use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::token::TokenProvider;
use crate::core::CalendarError;

pub const DEFAULT_LOOKAHEAD_DAYS: f64 = 7.0;
const MAX_LOOKAHEAD_DAYS: f64 = 365.0;

/// Either a whole-day date or a specific instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventStart {
    pub date: Option<NaiveDate>,
    pub date_time: Option<DateTime<FixedOffset>>,
}

impl EventStart {
    /// The start as an instant. All-day events start at midnight UTC.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        if let Some(date_time) = self.date_time {
            return Some(date_time.with_timezone(&Utc));
        }
        self.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub color_id: Option<String>,
    #[serde(default)]
    pub start: EventStart,
    #[serde(default)]
    pub html_link: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    next_page_token: Option<String>,
}

/// Number of days to look ahead. Values that make no sense fall back
/// to the default and long windows are capped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookaheadDays(f64);

impl LookaheadDays {
    pub fn new(days: Option<f64>) -> Self {
        match days {
            Some(d) if d.is_finite() && d > 0.0 => Self(d.min(MAX_LOOKAHEAD_DAYS)),
            _ => Self(DEFAULT_LOOKAHEAD_DAYS),
        }
    }

    pub fn days(&self) -> f64 {
        self.0
    }
}

impl Default for LookaheadDays {
    fn default() -> Self {
        Self(DEFAULT_LOOKAHEAD_DAYS)
    }
}

impl std::fmt::Display for LookaheadDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarWindow {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
}

impl CalendarWindow {
    pub fn starting_at(now: DateTime<Utc>, lookahead: LookaheadDays) -> Self {
        let millis = (lookahead.days() * 24.0 * 60.0 * 60.0 * 1000.0) as i64;
        Self {
            time_min: now,
            time_max: now + Duration::milliseconds(millis),
        }
    }

    pub fn from_now(lookahead: LookaheadDays) -> Self {
        Self::starting_at(Utc::now(), lookahead)
    }
}

fn iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct CalendarFetcher {
    http: Client,
    api_url: String,
    calendar_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl CalendarFetcher {
    pub fn new(
        http: Client,
        api_url: &str,
        calendar_id: &str,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            tokens,
        }
    }

    /// List the single events in `window` ordered by start time, with
    /// one retry after a forced token refresh when Google answers 401.
    pub async fn fetch_events(
        &self,
        window: &CalendarWindow,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        self.fetch_events_with_retries(window, 1).await
    }

    /// The retry budget covers the whole listing, across pages.
    pub async fn fetch_events_with_retries(
        &self,
        window: &CalendarWindow,
        mut retry_budget: u32,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.api_url,
            urlencoding::encode(&self.calendar_id)
        );
        let time_min = iso8601(&window.time_min);
        let time_max = iso8601(&window.time_max);

        let mut force_refresh = false;
        let mut page_token: Option<String> = None;
        let mut events = Vec::new();

        loop {
            let token = self.tokens.access_token(force_refresh).await?;

            let mut query = vec![
                ("orderBy", "startTime"),
                ("singleEvents", "true"),
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
            ];
            if let Some(page_token) = &page_token {
                query.push(("pageToken", page_token.as_str()));
            }

            let res = self
                .http
                .get(&url)
                .query(&query)
                .bearer_auth(&token)
                .send()
                .await
                .context("Failed to send calendar events request")?;
            let status = res.status();
            let text = res.text().await.unwrap_or_default();

            if status == StatusCode::UNAUTHORIZED {
                if retry_budget == 0 {
                    if force_refresh {
                        tracing::error!("Calendar rejected a freshly refreshed token: {}", text);
                    } else {
                        tracing::error!("Calendar rejected the token, no retries left: {}", text);
                    }
                    return Err(CalendarError::Unauthenticated);
                }
                // The token looked valid locally but Google disagrees,
                // usually clock skew or an early revocation.
                tracing::warn!("Token expired early, forcing a refresh and retrying");
                self.tokens.invalidate().await?;
                retry_budget -= 1;
                force_refresh = true;
                continue;
            }
            if !status.is_success() {
                return Err(anyhow!("Calendar events fetch failed: {} ({})", status, text).into());
            }

            let page: EventsResponse =
                serde_json::from_str(&text).context("Failed to parse calendar events")?;
            events.extend(page.items);
            force_refresh = false;

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        tracing::debug!("Fetched {} calendar events", events.len());
        Ok(events)
    }
}
