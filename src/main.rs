use clap::Parser;

use healthmonitor_lib::cli::{run_cli, Cli};
use healthmonitor_lib::configuration::AppConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    if let Err(e) = run_cli(cli, config).await {
        eprintln!("CLI Error: {:#}", e);
        std::process::exit(1);
    }
}
