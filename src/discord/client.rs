//! Outbound calls to the Discord REST API

use anyhow::{Context, Result, anyhow};
use reqwest::Client;

use super::commands::CommandDefinition;
use super::message::WebhookMessage;
use crate::core::DeliveryFailure;

#[derive(Clone)]
pub struct DiscordClient {
    http: Client,
    api_url: String,
    application_id: String,
}

impl DiscordClient {
    pub fn new(http: Client, api_url: &str, application_id: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            application_id: application_id.to_string(),
        }
    }

    /// Replace the placeholder left by a deferred acknowledgement. The
    /// interaction token is the only credential needed.
    pub async fn edit_original_response(
        &self,
        interaction_token: &str,
        message: &WebhookMessage,
    ) -> Result<(), DeliveryFailure> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_url, self.application_id, interaction_token
        );
        let res = self
            .http
            .patch(&url)
            .json(message)
            .send()
            .await
            .context("Failed to send follow-up message")?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("Follow-up rejected: {} ({})", status, text).into());
        }
        Ok(())
    }

    /// Overwrite the application's global slash commands.
    pub async fn register_commands(
        &self,
        bot_token: &str,
        commands: &[CommandDefinition],
    ) -> Result<()> {
        let url = format!(
            "{}/applications/{}/commands",
            self.api_url, self.application_id
        );
        let res = self
            .http
            .put(&url)
            .header("Authorization", format!("Bot {}", bot_token))
            .json(commands)
            .send()
            .await
            .context("Failed to send command registration")?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Command registration failed: {} ({})", status, text);
        }
        Ok(())
    }
}
