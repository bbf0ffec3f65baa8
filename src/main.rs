//! webfile CLI application
//!
//! Reference host for the download coordinator: issues requests, runs the
//! main-context tick loop and reports each result.

use std::process;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use webfile::cli::{handle_clear, handle_config, handle_get, Cli, Commands};
use webfile::config::AppConfig;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone())
        .await
        .context("Failed to load configuration")?;

    init_logging(&cli, &config);

    info!("webfile v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Get(args) => handle_get(args, &config).await?,
        Commands::Clear => handle_clear(&config).await?,
        Commands::Config(args) => handle_config(args, &config).await?,
    }
    Ok(())
}

/// Initialize logging from CLI flags, falling back to the config file level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let mut filter = EnvFilter::from_default_env();
    let directive = format!("webfile={}", level);
    match directive.parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    }
}
