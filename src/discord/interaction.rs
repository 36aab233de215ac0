//! Interaction payloads received from, and responses sent back to, Discord

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Only visible to the user who ran the command.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Ping,
    ApplicationCommand,
    Other(u8),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    /// Capability for editing the original response, valid for about
    /// 15 minutes after the interaction arrives.
    #[serde(default)]
    pub token: String,
    pub data: Option<CommandData>,
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        match self.kind {
            1 => InteractionKind::Ping,
            2 => InteractionKind::ApplicationCommand,
            other => InteractionKind::Other(other),
        }
    }

    pub fn command_name(&self) -> Option<String> {
        self.data.as_ref().map(|d| d.name.to_lowercase())
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)?
            .value
            .as_ref()
    }

    pub fn number_option(&self, name: &str) -> Option<f64> {
        self.option(name).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Pong = 1,
    ChannelMessageWithSource = 4,
    DeferredChannelMessageWithSource = 5,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<super::WebhookMessage>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: ResponseKind::Pong as u8,
            data: None,
        }
    }

    pub fn deferred() -> Self {
        Self {
            kind: ResponseKind::DeferredChannelMessageWithSource as u8,
            data: None,
        }
    }

    pub fn message(message: super::WebhookMessage) -> Self {
        Self {
            kind: ResponseKind::ChannelMessageWithSource as u8,
            data: Some(message),
        }
    }
}
