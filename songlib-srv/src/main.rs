//! songlib-srv - Song library HTTP service
//!
//! Startup order: `.env`, command line, config file, tracing, database,
//! metadata client, then the HTTP server with graceful shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use songlib_common::config::{load_config_or_default, ConfigOverrides, ServiceConfig};
use songlib_common::db::init_database;
use songlib_srv::services::{MetadataClient, MetadataSource};
use songlib_srv::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for songlib-srv
#[derive(Parser, Debug)]
#[command(name = "songlib-srv")]
#[command(about = "Song library HTTP service")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/songlib/config.toml)
    #[arg(short, long, env = "SONGLIB_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long, env = "SONGLIB_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SONGLIB_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "SONGLIB_DATABASE")]
    database: Option<PathBuf>,

    /// Base URL of the external metadata service
    #[arg(long, env = "SONGLIB_METADATA_URL")]
    metadata_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be applied before clap reads the environment
    let dotenv_path = dotenvy::dotenv().ok();

    let args = Args::parse();

    let toml_config =
        load_config_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    let config = ServiceConfig::resolve(
        ConfigOverrides {
            bind: args.bind,
            port: args.port,
            database_path: args.database,
            metadata_url: args.metadata_url,
        },
        toml_config,
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting songlib-srv v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    let metadata: Option<Arc<dyn MetadataSource>> = match &config.metadata_url {
        Some(url) => {
            let client = MetadataClient::new(url, config.metadata_timeout)
                .context("Failed to create metadata client")?;
            info!(
                url = %client.info_url(),
                timeout_secs = config.metadata_timeout.as_secs(),
                "Metadata enrichment enabled"
            );
            Some(Arc::new(client))
        }
        None => {
            warn!("No metadata service configured, enrichment disabled");
            None
        }
    };

    let app = build_router(AppState::new(pool.clone(), metadata));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("songlib-srv listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
