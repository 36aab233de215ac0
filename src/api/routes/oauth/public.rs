//! Public types for the OAuth API
use serde::Deserialize;

/// Query string Google appends when redirecting back after consent
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}
