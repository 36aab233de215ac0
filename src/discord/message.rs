//! Message bodies for interaction responses and follow-ups

use serde::Serialize;

use super::interaction::EPHEMERAL_FLAG;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: EmbedFooter,
    /// ISO8601 timestamp shown next to the footer
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl WebhookMessage {
    pub fn text(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub fn ephemeral(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            flags: Some(EPHEMERAL_FLAG),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }
}
