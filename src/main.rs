//! Docvault Server
//!
//! Document management REST API with per-object permissions.

use anyhow::Context;
use clap::{Arg, Command};
use docvault::{api::start_server, core::Config, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new("docvault")
        .version(docvault::VERSION)
        .about("Document management service with per-object permissions.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory path"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .help("Number of worker threads"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("storage-type")
                .long("storage-type")
                .value_name("TYPE")
                .help("Storage backend type (memory, disk)"),
        )
        .arg(
            Arg::new("eager")
                .long("eager")
                .action(clap::ArgAction::SetTrue)
                .help("Process uploads inside the request"),
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides()?;
            config
        }
        None => Config::load()?,
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    docvault::init(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.optimal_worker_threads())
        .enable_all()
        .build()
        .context("failed to build the Tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting Docvault v{}", docvault::VERSION);

    // Validate system requirements
    validate_system_requirements(&config)?;

    let state = Arc::new(AppState::new(config).context("failed to initialize services")?);
    info!(
        "Storage initialized: {:?}",
        state.config.storage.storage_type
    );

    start_server(state, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> docvault::Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .map_err(|e| docvault::Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.storage.data_dir = data_dir.into();
    }

    if let Some(workers) = matches.get_one::<String>("workers") {
        config.server.worker_threads = workers
            .parse()
            .map_err(|e| docvault::Error::config(format!("Invalid worker count: {}", e)))?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if let Some(storage_type) = matches.get_one::<String>("storage-type") {
        config.storage.storage_type = storage_type.parse()?;
    }

    if matches.get_flag("eager") {
        config.ingest.eager = true;
    }

    Ok(())
}

/// Validate system requirements and configuration
fn validate_system_requirements(config: &Config) -> docvault::Result<()> {
    // Check if data directory exists or can be created
    if config.storage.storage_type == docvault::core::config::StorageType::Disk
        && !config.storage.data_dir.exists()
    {
        std::fs::create_dir_all(&config.storage.data_dir).map_err(|e| {
            docvault::Error::config(format!(
                "Cannot create data directory {:?}: {}",
                config.storage.data_dir, e
            ))
        })?;
        info!("Created data directory: {:?}", config.storage.data_dir);
    }

    if config.security.users.is_empty() {
        warn!("No users configured; every API call except health and info will answer 401");
    }

    Ok(())
}

/// Resolve when the process is asked to stop
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
    warn!("Received shutdown signal, initiating graceful shutdown...");
}
