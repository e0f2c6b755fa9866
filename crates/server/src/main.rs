use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assetor_core::{
    load_config, validate_config, DownloadService, Downloader, Reporter, WebhookReporter,
    YtDlpDownloader,
};
use assetor_server::{api::create_router, state::AppState, VERSION};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Environment from .env, if present
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Assetor v{}", VERSION);
    match dotenv {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => info!("No .env file found"),
        Err(e) => return Err(e).context("Failed to load .env file"),
    }

    // Determine config path
    let config_path = std::env::var("ASSETOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("yt-dlp path: {:?}", config.downloader.tool_path);
    info!("Output directory: {:?}", config.downloader.output_dir);
    if config.reporter.default_url.is_none() {
        info!("No default report URL configured; jobs must carry their own");
    }

    // Ensure the output directory exists
    tokio::fs::create_dir_all(&config.downloader.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory {:?}",
                config.downloader.output_dir
            )
        })?;

    // Create downloader and reporter
    let downloader: Arc<dyn Downloader> = Arc::new(
        YtDlpDownloader::new(config.downloader.clone()).context("Failed to create downloader")?,
    );
    let reporter: Arc<dyn Reporter> = Arc::new(
        WebhookReporter::new(config.reporter.clone()).context("Failed to create reporter")?,
    );
    info!("Using downloader: {}", downloader.name());

    let service = DownloadService::new(downloader, reporter);

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), service.clone()));

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
    let interrupted = service.shutdown(config.server.shutdown_grace()).await;
    if interrupted > 0 {
        info!("Interrupted {} job(s) and reported them as failed", interrupted);
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
