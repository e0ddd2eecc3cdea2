// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plexus - plugin discovery and data exchange over an async message bus.
//!
//! Binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod demo;
mod lifecycle;
mod prefs;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plexus_config::PlexusConfig;

/// Plexus - plugin discovery and data exchange over an async message bus.
#[derive(Parser, Debug)]
#[command(name = "plexus", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a host with built-in sample plugins.
    Demo,
    /// Inspect or edit persisted plugin preferences.
    Prefs {
        #[command(subcommand)]
        command: prefs::PrefsCommand,
    },
    /// Validate and print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => plexus_config::load_and_validate_path(path),
        None => plexus_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            plexus_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.host.log_level);

    let result = match cli.command {
        Some(Commands::Demo) => demo::run_demo(&config).await,
        Some(Commands::Prefs { command }) => prefs::run_prefs(&config, command).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("plexus: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("plexus: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &PlexusConfig) -> Result<(), plexus_core::PlexusError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| plexus_core::PlexusError::Config(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plexus={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
