use clap::Parser;

use dayabase_server::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    dayabase_core::config::load_dotenv();
    let config = dayabase_core::Config::from_env();

    let cli = Cli::parse();
    cli::dispatch(&config, cli.command).await
}
