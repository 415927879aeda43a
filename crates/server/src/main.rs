mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaforge_core::{
    load_config, validate_config, FfmpegTranscoder, JobSupervisor, LibrqbitEngine, TaskRegistry,
    Transcoder, TransferEngine,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MEDIAFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Download directory: {:?}", config.storage.download_dir);
    info!("Convert directory: {:?}", config.storage.convert_dir);

    // Create the managed directories; safe to repeat across restarts.
    tokio::fs::create_dir_all(&config.storage.download_dir)
        .await
        .context("Failed to create download directory")?;
    tokio::fs::create_dir_all(&config.storage.convert_dir)
        .await
        .context("Failed to create convert directory")?;

    // Task registry: both job slots start Idle; state is in-memory only
    // and resets on restart.
    let registry = Arc::new(TaskRegistry::new());

    // Embedded torrent engine
    let engine: Arc<dyn TransferEngine> = Arc::new(
        LibrqbitEngine::new(&config.transfer, &config.storage.download_dir)
            .await
            .context("Failed to initialize transfer engine")?,
    );

    // FFmpeg transcoder
    let transcoder_impl = FfmpegTranscoder::new(config.transcode.clone());
    if let Err(e) = transcoder_impl.validate().await {
        warn!("ffmpeg validation failed, conversions will error: {}", e);
    }
    let transcoder: Arc<dyn Transcoder> = Arc::new(transcoder_impl);

    // Job supervisor
    let supervisor = Arc::new(JobSupervisor::new(
        Arc::clone(&registry),
        engine,
        transcoder,
        config.storage.clone(),
        config.transfer.poll_policy(),
        config.transcode.clone(),
    ));
    info!("Job supervisor initialized");

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), registry, supervisor));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
