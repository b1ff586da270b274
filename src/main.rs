#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ucp_oauth::app::run().await
}
