//! Decides which calendar events are worth announcing

use crate::google::CalendarEvent;

/// Calendar color id Google labels "Tangerine".
const HIGHLIGHT_COLOR_ID: &str = "6";
const EXCLUDE_KEYWORD: &str = "ignore";
const INCLUDE_KEYWORDS: &[&str] = &["demo", "pitch"];

fn mentions(event: &CalendarEvent, keyword: &str) -> bool {
    [&event.summary, &event.description]
        .into_iter()
        .map(|field| field.as_deref().unwrap_or_default().to_lowercase())
        .any(|text| text.contains(keyword))
}

/// An event is relevant when it is highlighted or mentions a demo or
/// pitch, unless it mentions "ignore" anywhere, which always wins.
pub fn is_relevant(event: &CalendarEvent) -> bool {
    if mentions(event, EXCLUDE_KEYWORD) {
        return false;
    }

    event.color_id.as_deref() == Some(HIGHLIGHT_COLOR_ID)
        || INCLUDE_KEYWORDS.iter().any(|k| mentions(event, k))
}
