use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ayn::config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_STORAGE_FILE, default_home};
use ayn::{AppState, KeyRing, SqliteStore, run};

#[derive(Parser)]
struct Args {
    /// Config file path, defaults to <home>/config.toml
    #[clap(long, env = "AYN_CONFIG")]
    config: Option<PathBuf>,
    /// Application base path, defaults to ~/.ayn
    #[clap(long, env = "AYN_HOME")]
    home: Option<PathBuf>,
    /// Post storage path, defaults to <home>/storage.db
    #[clap(long, env = "AYN_STORAGE")]
    storage: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ayn=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let home = match args.home {
        Some(home) => home,
        None => default_home().context("cannot determine the home directory, pass --home")?,
    };
    let config_path = args.config.unwrap_or_else(|| home.join(DEFAULT_CONFIG_FILE));
    let storage_path = args.storage.unwrap_or_else(|| home.join(DEFAULT_STORAGE_FILE));

    let config = Config::load(&config_path)?;
    info!(config = %config_path.display(), keys = config.keys.len(), "loaded configuration");

    if let Some(parent) = storage_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = SqliteStore::open(&storage_path)
        .with_context(|| format!("opening post store {}", storage_path.display()))?;

    let keys = KeyRing::load(&config.keys);
    if keys.is_empty() {
        warn!("no signing keys loaded, every sign request will fail");
    }

    let state = AppState {
        keys: Arc::new(keys),
        store: Arc::new(store),
    };
    run(&config.sign_endpoint, state).await
}
