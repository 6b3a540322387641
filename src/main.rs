#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pixelmagic::run().await
}
