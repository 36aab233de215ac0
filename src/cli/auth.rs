use anyhow::{Result, anyhow};
use std::io::{self, Write};

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};
use crate::google::{CredentialRecord, OAuthClient, SqliteCredentialStore};

/// Walk through the consent flow from the terminal. Useful when the
/// server is not reachable from the browser doing the consent.
pub async fn run(config: &AppConfig) -> Result<()> {
    let oauth = OAuthClient::from_config(reqwest::Client::new(), config)
        .ok_or_else(|| anyhow!("Running with a service account, nothing to authorize"))?;

    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        oauth.authorization_url()
    );
    print!("Paste the `code` parameter from the URL you were redirected to: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin().read_line(&mut code)?;
    let code = code.trim();

    let granted = oauth.exchange_code_for_token(code).await?;
    let refresh_token = granted
        .refresh_token
        .ok_or(anyhow!("No refresh token in response"))?;

    // Store the tokens and refresh the access token from now on
    let db = async_db(&config.db_path).await?;
    db.call(|conn| Ok(initialize_db(conn)?)).await?;
    let store = SqliteCredentialStore::new(db);
    CredentialRecord::new(granted.access_token, refresh_token, granted.expires_in)
        .save(&store)
        .await?;
    println!("Google credentials saved to DB.");

    Ok(())
}
