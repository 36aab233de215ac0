use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod auth;
pub mod init;
pub mod register;
pub mod serve;

use crate::core::{AppConfig, DEFAULT_HOST, DEFAULT_PORT};

#[derive(Subcommand)]
enum Command {
    /// Create the storage directory and db schema
    Init {},
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Set the server port
        #[arg(long, default_value = DEFAULT_PORT)]
        port: String,
    },
    /// Authorize Google Calendar access and store the tokens
    Auth {},
    /// Register the slash commands with Discord
    Register {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            init::run(&AppConfig::from_env()?).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Auth {}) => {
            auth::run(&AppConfig::from_env()?).await?;
        }
        Some(Command::Register {}) => {
            register::run(&AppConfig::from_env()?).await?;
        }
        None => {}
    }

    Ok(())
}
