//! pressmark - WordPress fingerprint scanner

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    pressmark_cli::run().await
}
