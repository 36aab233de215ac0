use anyhow::Result;
use demos::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
