use anyhow::Result;

#[tokio::main]
pub async fn main() -> Result<()> {
    token_scanner::run().await
}
