//! Fastbreak Platform Server
//!
//! Serves the events and auth REST APIs, health probes and Swagger UI.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FB_API_PORT` | `8080` | HTTP API port |
//! | `FB_DEV_MODE` | `false` | Use in-memory store, storage and auth |
//! | `FB_DATABASE_URL` | - | PostgreSQL URL (required unless dev mode) |
//! | `FB_DATABASE_MAX_CONNECTIONS` | `5` | Pool size |
//! | `FB_PLATFORM_URL` | - | Hosted backend base URL (required unless dev mode) |
//! | `FB_PLATFORM_ANON_KEY` | - | Identity provider API key |
//! | `FB_PLATFORM_SERVICE_KEY` | - | Object storage key |
//! | `FB_POSTER_BUCKET` | `event-posters` | Poster bucket |
//! | `FB_POSTER_UPLOAD` | `server` | `server` or `client` poster upload |
//! | `FB_POSTER_MAX_BYTES` | `5242880` | Poster size limit |
//! | `FB_PUBLIC_BASE_URL` | `http://localhost:{port}` | Poster URL base in dev mode |
//! | `FB_LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use fb_common::init_tracing;
use fb_platform::api::{create_router, PlatformServices};
use fb_platform::repository::{InMemoryEventRepository, PostgresEventRepository};
use fb_platform::service::{HttpAuthConfig, HttpAuthGateway, InMemoryAuthGateway};
use fb_platform::storage::{HttpPosterStorage, HttpStorageConfig, InMemoryPosterStorage};
use fb_platform::PlatformConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = PlatformConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Fastbreak Platform Server");

    let services = if config.dev_mode {
        dev_services(&config)
    } else {
        production_services(&config).await?
    };

    let app = create_router(services);

    let api_addr = format!("0.0.0.0:{}", config.api_port);
    let listener = TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind {}", api_addr))?;
    info!("API server listening on http://{}", api_addr);
    info!("Swagger UI at http://{}/swagger-ui", api_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Fastbreak Platform Server shutdown complete");
    Ok(())
}

fn dev_services(config: &PlatformConfig) -> PlatformServices {
    warn!("FB_DEV_MODE enabled: events, posters and users are kept in memory");
    PlatformServices {
        event_repo: Arc::new(InMemoryEventRepository::new()),
        poster_storage: Arc::new(InMemoryPosterStorage::new(
            config.public_base_url.clone(),
            config.poster_bucket.clone(),
        )),
        auth_gateway: Arc::new(InMemoryAuthGateway::new()),
        create_config: config.create_event_config(),
    }
}

async fn production_services(config: &PlatformConfig) -> Result<PlatformServices> {
    let database_url = config.database_url.as_deref().context("FB_DATABASE_URL is not set")?;
    let backend = config.backend.as_ref().context("FB_PLATFORM_URL is not set")?;

    info!(max_connections = config.database_max_connections, "Connecting to PostgreSQL");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    let event_repo = PostgresEventRepository::new(pool);
    event_repo.init_schema().await?;

    let poster_storage = HttpPosterStorage::new(HttpStorageConfig {
        base_url: backend.url.clone(),
        service_key: backend.service_key.clone(),
        bucket: config.poster_bucket.clone(),
    });
    let auth_gateway = HttpAuthGateway::new(HttpAuthConfig {
        base_url: backend.url.clone(),
        anon_key: backend.anon_key.clone(),
    });
    info!(bucket = %config.poster_bucket, upload_mode = ?config.poster_upload_mode, "Adapters initialized");

    Ok(PlatformServices {
        event_repo: Arc::new(event_repo),
        poster_storage: Arc::new(poster_storage),
        auth_gateway: Arc::new(auth_gateway),
        create_config: config.create_event_config(),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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
    info!("Shutdown signal received...");
}
