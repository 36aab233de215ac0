use anyhow::{Result, anyhow};

use crate::core::AppConfig;
use crate::discord::DiscordClient;
use crate::discord::commands::command_definitions;

pub async fn run(config: &AppConfig) -> Result<()> {
    let bot_token = config
        .discord_bot_token
        .as_deref()
        .ok_or_else(|| anyhow!("Set DEMOS_DISCORD_BOT_TOKEN to register commands"))?;

    let commands = command_definitions();
    let client = DiscordClient::new(
        reqwest::Client::new(),
        &config.discord_api_url,
        &config.discord_application_id,
    );
    client.register_commands(bot_token, &commands).await?;

    let names: Vec<&str> = commands.iter().map(|c| c.name).collect();
    println!("Registered commands: {}", names.join(", "));
    Ok(())
}
