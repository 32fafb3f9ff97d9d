#[tokio::main]
async fn main() -> anyhow::Result<()> {
    urisnap_lib::run().await
}
