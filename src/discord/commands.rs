//! Slash command definitions registered with Discord

use serde::Serialize;

pub const PING_COMMAND: &str = "ping";
pub const DEMOS_COMMAND: &str = "demos";
pub const DAYS_OPTION: &str = "days";

/// Discord's option type for a double precision number.
const NUMBER_OPTION_TYPE: u8 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CommandOptionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: u8,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionDefinition>,
}

pub fn command_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: PING_COMMAND,
            description: "Replies with Pong!",
            options: vec![],
        },
        CommandDefinition {
            name: DEMOS_COMMAND,
            description: "Lists upcoming demos. Don't break prod!",
            options: vec![CommandOptionDefinition {
                name: DAYS_OPTION,
                description: "Number of days to look ahead (default: 7)",
                kind: NUMBER_OPTION_TYPE,
                required: false,
            }],
        },
    ]
}
