use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    fastfill_cli::cli::run().await
}
