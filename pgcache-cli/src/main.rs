//! pgcache CLI - runs the result cache next to a proxy host.
//!
//! # Architecture
//!
//! The CLI is organized into:
//! - `Cli` / `Commands`: Argument parsing (clap)
//! - `serve`: The line-delimited JSON hook loop on stdio
//! - `CliError`: Centralized error handling with user-friendly messages
//!
//! # Configuration
//!
//! Settings are loaded from `~/.pgcache/config.ini` on startup; the
//! `--config` flag points at an alternate file.

mod error;
mod serve;

use clap::{Parser, Subcommand};
use error::CliError;
use pgcache::config::ConfigFile;
use pgcache::logging::{default_log_dir, default_log_file, init_logging};
use pgcache::service::{PgCacheService, ServiceConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pgcache")]
#[command(version = pgcache::VERSION)]
#[command(about = "Transparent result cache for PostgreSQL proxies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file at ~/.pgcache/config.ini
    Init,

    /// Run the cache service and serve plugin hooks on stdio
    Serve {
        /// Configuration file (default: ~/.pgcache/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => run_init(),
        Commands::Serve { config } => run_serve(config),
    };

    if let Err(e) = result {
        e.exit();
    }
}

/// Initialize configuration file.
fn run_init() -> Result<(), CliError> {
    let path = ConfigFile::ensure_exists().map_err(|e| CliError::Config(e.to_string()))?;
    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize pgcache settings.");
    Ok(())
}

/// Run the cache service and the hook loop until the host disconnects.
fn run_serve(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config_file = match config_path {
        Some(path) => ConfigFile::load_from(&path),
        None => ConfigFile::load(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;
    let service_config = ServiceConfig::from(&config_file);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let _guard = init_logging(default_log_dir(), default_log_file())
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        eprintln!("pgcache v{}", pgcache::VERSION);
        eprintln!("Store:   {}", service_config.store_url);
        eprintln!(
            "Sweeper: {}",
            if service_config.sweeper.enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        eprintln!();

        let service = PgCacheService::start(service_config).await?;

        serve::run_hook_loop(service.plugin()).await?;

        service.shutdown().await;
        Ok(())
    })
}
