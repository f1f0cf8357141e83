use domainpulse::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::start().await
}
