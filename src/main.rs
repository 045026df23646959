//! steam-presenced relays the running Steam game to the chat client's
//! local IPC socket as a "Playing ..." status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};

use steam_presenced::bridge::Bridge;
use steam_presenced::catalog::cache::{CatalogCache, default_cache_path};
use steam_presenced::catalog::fetch::{LoadOptions, load_catalog};
use steam_presenced::catalog::CatalogError;
use steam_presenced::config::{Config, ConfigError};
use steam_presenced::distro;
use steam_presenced::ipc::locator::SocketLocator;
use steam_presenced::ipc::session::Session;
use steam_presenced::scanner::ProcScanner;
use steam_presenced::scanner::ignore::IgnoreSet;

#[derive(Debug, Parser)]
#[command(version, about = "Show the running Steam game as chat client presence")]
struct Cli {
    /// Config file (default: ~/.config/steam-presenced/config.json).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Catalog cache file (default: ~/.cache/steam-presenced/games.json).
    #[arg(long, value_name = "PATH")]
    catalog_cache: Option<PathBuf>,

    /// Re-download the game catalog even if the cache is fresh.
    #[arg(long)]
    refresh_catalog: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}

/// Startup failures. Anything after startup is handled per tick.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load game catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("cannot install signal handler: {0}")]
    Signal(std::io::Error),
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting steam-presenced");

    let config = match cli.config.or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    tracing::debug!(?config, "configuration");

    let cache_path = match cli.catalog_cache {
        Some(path) => path,
        None => default_cache_path()?,
    };
    let catalog = load_catalog(
        &CatalogCache::new(cache_path),
        &LoadOptions {
            api_version: config.api_version,
            ttl: config.catalog_ttl(),
            force_refresh: cli.refresh_catalog,
        },
    )
    .await?;

    let distro = distro::current_label();
    let ignore = IgnoreSet::with_extra(config.ignored_games.iter().cloned());
    tracing::info!(
        distro = %distro,
        ignored = ignore.len(),
        interval = ?config.scan_interval(),
        "ready"
    );

    let locator = SocketLocator::for_current_user();
    let session = Session::new(locator, config.socket_timeout());
    if session.socket_path().is_none() {
        tracing::info!("chat client IPC socket not found yet, will keep probing");
    }

    let mut sigterm = signal(SignalKind::terminate()).map_err(StartupError::Signal)?;
    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        }
    };

    Bridge::new(ProcScanner::live(ignore), catalog, session, distro)
        .clear_on_disconnect(config.clear_on_disconnect)
        .run(config.scan_interval(), shutdown)
        .await;
    Ok(())
}
