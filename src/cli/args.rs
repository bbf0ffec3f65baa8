//! Command-line argument parsing for webfile
//!
//! clap derive definitions for the reference host binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// webfile - de-duplicated concurrent downloads
#[derive(Parser, Debug)]
#[command(
    name = "webfile",
    version,
    about = "Download files concurrently, sharing transfers for the same destination",
    long_about = "Runs every requested download on a background task. Requests for a destination that is
already downloading join that transfer, and every result is reported from the main loop."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download one or more files
    Get(GetArgs),

    /// Clear storage and wait for confirmation
    Clear,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the get command
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// URL to download
    pub url: String,

    /// Destination file
    pub dest: PathBuf,

    /// Additional downloads issued together, as URL=DEST
    #[arg(long = "also", value_name = "URL=DEST", value_parser = parse_download_pair)]
    pub also: Vec<(String, PathBuf)>,
}

impl GetArgs {
    /// Every (url, destination) pair requested, in command-line order
    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        let mut downloads = vec![(self.url.clone(), self.dest.clone())];
        downloads.extend(self.also.iter().cloned());
        downloads
    }
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file if none exists
    Init {
        /// Where to write it (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

/// Parse `URL=DEST`, splitting on the last `=` so query strings survive
fn parse_download_pair(raw: &str) -> Result<(String, PathBuf), String> {
    let (url, dest) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected URL=DEST, got '{}'", raw))?;
    if url.is_empty() || dest.is_empty() {
        return Err(format!("expected URL=DEST, got '{}'", raw));
    }
    Ok((url.to_string(), PathBuf::from(dest)))
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level requested by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}
