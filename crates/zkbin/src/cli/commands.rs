//! # CLI Layer
//!
//! The only place that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs the log subscriber
//! - Decides which data directory and config file are used
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: via clap, see `setup.rs`
//! 2. **Context Setup**: load [`StoreConfig`], apply overrides, open the store
//! 3. **Dispatch**: route each subcommand to its handler
//! 4. **Output**: print what the handler returns

use super::handlers::{self, AppState};
use super::setup::{Cli, Commands, ValueCommands};
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zkbinapp::config::StoreConfig;
use zkbinapp::store::fs::FileStore;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let state = create_app_state(&cli)?;
    let store = &state.store;
    let output = match cli.command {
        Commands::Purge { batch } => {
            handlers::purge(store, batch.unwrap_or(state.config.purge_batch_size))
        }
        Commands::List => handlers::list(store),
        Commands::Show { id } => handlers::show(store, &id)?,
        Commands::Delete { id } => handlers::delete(store, &id)?,
        Commands::Value { action } => match action {
            ValueCommands::Get { namespace } => handlers::value_get(store, &namespace),
            ValueCommands::Set { namespace, value } => {
                handlers::value_set(store, &namespace, &value)?
            }
        },
        Commands::Salt => handlers::salt(store)?,
        Commands::Classify {
            method,
            accept,
            body,
            uri,
        } => handlers::classify(&method, accept.as_deref(), body.as_deref(), &uri)?,
    };

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The config file to read: the explicit one, else `zkbin.toml` in the OS
/// config directory. Missing files are skipped by the loader.
fn config_file(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(|| {
        ProjectDirs::from("com", "zkbin", "zkbin").map(|dirs| dirs.config_dir().join("zkbin.toml"))
    })
}

fn create_app_state(cli: &Cli) -> Result<AppState> {
    let file = config_file(cli);
    let mut config = StoreConfig::load(file.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.dir = dir.clone();
    }
    tracing::debug!(dir = %config.dir.display(), "using data directory");

    let store = FileStore::open(&config.dir);
    Ok(AppState { store, config })
}
