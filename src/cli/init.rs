use anyhow::{Context, Result};
use std::fs;

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

pub async fn run(config: &AppConfig) -> Result<()> {
    println!("Initializing db...");
    fs::create_dir_all(&config.db_path)
        .with_context(|| format!("Failed to create {}", config.db_path))?;

    let db = async_db(&config.db_path).await?;
    db.call(|conn| Ok(initialize_db(conn)?)).await?;
    println!("Finished initializing db");

    Ok(())
}
