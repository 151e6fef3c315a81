mod config;
mod errors;
mod llm_client;
mod pipeline;
mod research;
mod routes;
mod state;
mod storage;
mod synthesis;
mod topic_map;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageConfig};
use crate::llm_client::LlmClient;
use crate::research::TavilyClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{S3Uploader, Uploader};
use crate::topic_map::session::SessionStore;

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

    info!("Starting Topic Map API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let generator = LlmClient::new(config.anthropic_api_key.clone())
        .context("Failed to build LLM HTTP client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize search client
    let search = TavilyClient::new(config.tavily_api_key.clone())
        .context("Failed to build search HTTP client")?;
    info!(
        "Search client initialized (inter-query delay: {}ms)",
        config.research_delay.as_millis()
    );

    // Initialize S3 uploader when storage is configured
    let uploader: Option<Arc<dyn Uploader>> = match &config.storage {
        Some(storage) => {
            let client = build_s3_client(storage).await;
            info!("S3 upload enabled (bucket: {})", storage.s3_bucket);
            Some(Arc::new(S3Uploader::new(client, storage.s3_bucket.clone())))
        }
        None => {
            info!("S3 upload disabled: S3_BUCKET or AWS credentials not set");
            None
        }
    };

    // Build app state
    let state = AppState {
        config: config.clone(),
        generator: Arc::new(generator),
        search: Arc::new(search),
        uploader,
        sessions: SessionStore::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once a web client exists

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for AWS, or for an S3-compatible store when an endpoint is set.
async fn build_s3_client(storage: &StorageConfig) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &storage.aws_access_key_id,
        &storage.aws_secret_access_key,
        None,
        None,
        "topicmap-static",
    );

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(storage.s3_region.clone()))
        .credentials_provider(credentials);
    if let Some(endpoint) = &storage.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    // Path-style addressing keeps MinIO-style endpoints working.
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(storage.s3_endpoint.is_some())
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
