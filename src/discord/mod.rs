pub mod client;
pub mod commands;
pub mod interaction;
pub mod message;
pub mod signature;

pub use client::DiscordClient;
pub use interaction::{Interaction, InteractionKind, InteractionResponse};
pub use message::{Embed, EmbedFooter, WebhookMessage};
pub use signature::SignatureVerifier;
