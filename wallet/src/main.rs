use anyhow::Result;
use clap::Parser;
use wallet_ui::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config_logged(std::io::stderr)?;

    tracing_subscriber::fmt()
        .with_env_filter(cli::log_filter(&config.log_level))
        .with_writer(std::io::stderr)
        .init();

    cli::run_cli(cli, config).await
}
