mod config;
mod db;
mod errors;
mod extraction;
mod models;
mod resumes;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ExtractorKind, StorageConfig};
use crate::extraction::{Extractor, LoggingExtractor};
use crate::resumes::repository::PgResumeRepository;
use crate::resumes::store::ResumeStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{FileStorage, LocalStorage, S3Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resumedesk v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL + schema
    let db = db::connect(&config).await?;

    let storage = build_storage(&config).await?;
    info!("File storage initialized (backend: {})", storage.backend());

    let extractor: Option<Arc<dyn Extractor>> = match config.extractor {
        ExtractorKind::Log => Some(Arc::new(LoggingExtractor)),
        ExtractorKind::None => None,
    };
    info!(
        "Extraction hook: {:?} (timeout {:?})",
        config.extractor, config.extraction_timeout
    );

    let store = ResumeStore::new(
        Arc::new(PgResumeRepository::new(db)),
        storage.clone(),
        extractor,
        config.extraction_timeout,
    );

    let state = AppState {
        store,
        storage,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the HR frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_storage(config: &Config) -> Result<Arc<dyn FileStorage>> {
    let storage: Arc<dyn FileStorage> = match &config.storage {
        StorageConfig::Local { media_root } => {
            Arc::new(LocalStorage::new(media_root.clone()).await?)
        }
        StorageConfig::S3(settings) => Arc::new(S3Storage::new(settings).await),
    };
    Ok(storage)
}
