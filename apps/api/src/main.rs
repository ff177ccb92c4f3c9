mod config;
mod db;
mod errors;
mod lessons;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::lessons::service::ContentService;
use crate::lessons::store::{LessonStore, NoopLessonStore, PgLessonStore};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EasyLesson API v{}", env!("CARGO_PKG_VERSION"));

    // Storage: Postgres when configured, otherwise a no-op stand-in
    let store = build_store(&config).await?;
    info!("Lesson store: {}", store.backend());

    // Initialize LLM client
    let llm = LlmClient::from_config(&config);
    if config.openrouter_api_key.is_none() {
        warn!("OPENROUTER_API_KEY is not set; generation requests will fail");
    }
    info!("LLM client initialized (model: {})", llm.model());

    let lessons = Arc::new(
        ContentService::new(Arc::new(llm), store.clone())
            .with_vocabulary_limit(config.vocabulary_limit),
    );

    // Build app state
    let state = AppState {
        lessons,
        store: store.clone(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn LessonStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set; lessons will not be persisted");
        return Ok(Arc::new(NoopLessonStore));
    };

    let pool = create_pool(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    ensure_schema(&pool).await?;
    Ok(Arc::new(PgLessonStore::new(pool)))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
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

    info!("Shutdown signal received");
}
