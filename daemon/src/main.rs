#[tokio::main]
async fn main() -> anyhow::Result<()> {
    klaval_daemon::run().await
}
