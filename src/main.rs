use anyhow::Result;
use toolbox::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
