use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_RESEARCH_DELAY_MS: u64 = 500;
const DEFAULT_S3_REGION: &str = "us-east-1";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub tavily_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Pause between consecutive research queries.
    pub research_delay: Duration,
    /// Present only when cloud upload is fully configured.
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub s3_bucket: String,
    /// Custom endpoint for S3-compatible stores (MinIO); AWS when unset.
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            tavily_api_key: require_env("TAVILY_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            research_delay: Duration::from_millis(match optional_env("RESEARCH_DELAY_MS") {
                Some(ms) => ms
                    .parse::<u64>()
                    .context("RESEARCH_DELAY_MS must be a whole number of milliseconds")?,
                None => DEFAULT_RESEARCH_DELAY_MS,
            }),
            storage: StorageConfig::from_env(),
        })
    }
}

impl StorageConfig {
    /// `None` unless the bucket and both credentials are set.
    fn from_env() -> Option<Self> {
        Some(StorageConfig {
            s3_bucket: optional_env("S3_BUCKET")?,
            s3_endpoint: optional_env("S3_ENDPOINT"),
            s3_region: optional_env("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Set and non-blank.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
