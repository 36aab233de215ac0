//! Public types for the interactions API
use serde::{Deserialize, Serialize};

/// Body returned for interactions the bot does not handle
#[derive(Debug, Deserialize, Serialize)]
pub struct InteractionError {
    pub error: String,
}

impl InteractionError {
    pub fn unknown_type() -> Self {
        Self {
            error: String::from("Unknown Type"),
        }
    }
}
