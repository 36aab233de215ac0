//! Turns a pipeline outcome into the message users see

use chrono::{DateTime, SecondsFormat, Utc};

use super::DemosOutcome;
use crate::discord::{Embed, EmbedFooter, WebhookMessage};
use crate::google::{CalendarEvent, LookaheadDays};

pub const EMBED_TITLE: &str = "Upcoming Demos";
const EMBED_COLOR: u32 = 0x03fcfc;
// Discord rejects embed descriptions longer than this
const DESCRIPTION_LIMIT: usize = 4096;
const OVERFLOW_RESERVE: usize = 32;

pub const FAILURE_NOTICE: &str =
    "Something went wrong while fetching the calendar. Please try again later.";

pub fn render(
    outcome: &DemosOutcome,
    lookahead: LookaheadDays,
    authorization_url: Option<&str>,
) -> WebhookMessage {
    render_at(outcome, lookahead, authorization_url, Utc::now())
}

pub fn render_at(
    outcome: &DemosOutcome,
    lookahead: LookaheadDays,
    authorization_url: Option<&str>,
    now: DateTime<Utc>,
) -> WebhookMessage {
    match outcome {
        DemosOutcome::Found(events) => WebhookMessage::embed(Embed {
            title: EMBED_TITLE.to_string(),
            description: describe(events),
            color: EMBED_COLOR,
            footer: EmbedFooter {
                text: format!(
                    "Found {} events of interest in the next {} days",
                    events.len(),
                    lookahead
                ),
            },
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
        DemosOutcome::NoEvents => {
            WebhookMessage::text(&format!("No events in the next {} days!", lookahead))
        }
        DemosOutcome::Unauthenticated => match authorization_url {
            Some(url) => WebhookMessage::text(&format!(
                "I can't read the calendar: Google access is missing or has expired. \
                 An operator needs to authorize it again here: {}",
                url
            )),
            None => WebhookMessage::text(
                "I can't read the calendar: Google rejected the service account. \
                 An operator needs to check its key and calendar sharing.",
            ),
        },
        DemosOutcome::Failed(_) => WebhookMessage::text(FAILURE_NOTICE),
    }
}

fn event_line(event: &CalendarEvent) -> String {
    let title = event
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Untitled event");
    let heading = if event.html_link.is_empty() {
        format!("**{}**", title)
    } else {
        format!("**[{}]({})**", title, event.html_link)
    };
    let when = match event.start.timestamp() {
        // Rendered by the client in the reader's timezone
        Some(start) => format!("<t:{0}:F> (<t:{0}:R>)", start.timestamp()),
        None => "Time to be announced".to_string(),
    };
    format!("{}\n{}", heading, when)
}

fn describe(events: &[CalendarEvent]) -> String {
    let mut description = String::new();
    for (i, event) in events.iter().enumerate() {
        let line = event_line(event);
        let separator = if description.is_empty() { "" } else { "\n\n" };
        if description.len() + separator.len() + line.len() > DESCRIPTION_LIMIT - OVERFLOW_RESERVE
        {
            description.push_str(&format!("\n\n…and {} more", events.len() - i));
            break;
        }
        description.push_str(separator);
        description.push_str(&line);
    }
    description
}
