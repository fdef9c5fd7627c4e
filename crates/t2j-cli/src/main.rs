use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use t2j_cli::commands::{serve, sync};
use t2j_cli::{Cli, Commands, Config};

fn load_config(cli: &Cli) -> Result<Config> {
    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Sync { days_back }) => {
            let config = load_config(&cli)?;
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            sync::run(&mut writer, &config, *days_back).await?;
        }
        Some(Commands::Serve { bind }) => {
            let config = load_config(&cli)?;
            serve::run(config, *bind).await?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
