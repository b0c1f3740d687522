use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use platematch::config::Config;
use platematch::engine::MatchEngine;
use platematch::notifications::MatchFeed;
use platematch::AppState;

#[derive(Parser, Debug)]
#[command(name = "platematch")]
#[command(author, version, about = "Group restaurant matching service", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "platematch.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting platematch v{}", env!("CARGO_PKG_VERSION"));

    // Ensure data directory exists
    std::fs::create_dir_all(&config.server.data_dir)?;

    // Initialize database
    let db = platematch::db::init(&config.server.data_dir).await?;

    // Match feed: the notification sink WebSocket clients subscribe to
    let feed = Arc::new(MatchFeed::new());

    // Evaluation trigger channel
    let (eval_tx, eval_rx) = mpsc::channel(100);

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), db.clone(), eval_tx, feed.clone()));

    // Start the match engine
    let engine = MatchEngine::new(db, feed, eval_rx);
    tokio::spawn(async move {
        engine.run().await;
    });

    // Create API router
    let app = platematch::api::create_router(state);

    // Start API server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
