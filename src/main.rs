#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bugbounty::bootstrapper::run().await
}
