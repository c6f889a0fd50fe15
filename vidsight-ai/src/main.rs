//! vidsight-ai - Video Analysis microservice
//!
//! Accepts video uploads, runs the multi-modal analysis pipeline and streams
//! per-session progress over SSE.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidsight_ai::collaborators::{FfmpegDecoder, OpenAiProvider};
use vidsight_ai::config::ServiceConfig;
use vidsight_ai::AppState;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "vidsight-ai")]
#[command(about = "Video analysis microservice for VidSight")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3001", env = "VIDSIGHT_PORT")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0", env = "VIDSIGHT_BIND")]
    bind: String,

    /// TOML configuration file
    #[arg(short, long, env = "VIDSIGHT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidsight_ai=info,vidsight_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting vidsight-ai (Video Analysis) microservice");
    info!(
        "Version: {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let config = ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    config
        .ensure_directories()
        .context("Failed to create data directories")?;
    info!("Data directory: {}", config.data_dir.display());

    let decoder = FfmpegDecoder::new(&config.ffmpeg_path, &config.ffprobe_path);
    if !decoder.is_available().await {
        tracing::warn!(
            ffmpeg = %config.ffmpeg_path,
            ffprobe = %config.ffprobe_path,
            "ffmpeg/ffprobe not found; only demo requests will succeed"
        );
    }

    let provider = OpenAiProvider::new(&config).context("Failed to build inference client")?;
    let state = AppState::new(config, Arc::new(provider));
    let app = vidsight_ai::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.bind, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("vidsight-ai stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
