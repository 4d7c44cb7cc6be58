use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default environment variable holding the content-store bearer token.
pub const DEFAULT_CONTENT_TOKEN_ENV: &str = "CONTENT_API_TOKEN";
/// Default environment variable holding the KV-store bearer token.
pub const DEFAULT_KV_TOKEN_ENV: &str = "KV_API_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub content: ContentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Blob-store content source settings.
///
/// The directory allow-list is configuration, not inferred from the store:
/// only `.md` objects under `allowed_dirs` (plus the standalone
/// `extra_files`) are indexed.
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Base URL of the blob-store file API (`/list`, `/get`).
    pub endpoint: String,
    #[serde(default = "default_allowed_dirs")]
    pub allowed_dirs: Vec<String>,
    #[serde(default = "default_extra_files")]
    pub extra_files: Vec<String>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Name of the environment variable carrying the bearer token.
    #[serde(default = "default_content_token_env")]
    pub token_env: String,
}

fn default_allowed_dirs() -> Vec<String> {
    vec![
        "blog".to_string(),
        "portfolio".to_string(),
        "projects".to_string(),
    ]
}

fn default_extra_files() -> Vec<String> {
    vec!["about.md".to_string()]
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

fn default_content_token_env() -> String {
    DEFAULT_CONTENT_TOKEN_ENV.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// `"memory"` or `"http"`.
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    /// Base URL of the KV REST API; required for the `http` backend.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_kv_token_env")]
    pub token_env: String,
    /// Generation time-to-live. Fixed at load time, never per request.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            endpoint: None,
            token_env: default_kv_token_env(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_cache_backend() -> String {
    "memory".to_string()
}

fn default_kv_token_env() -> String {
    DEFAULT_KV_TOKEN_ENV.to_string()
}

fn default_ttl_secs() -> u64 {
    1800
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexerConfig {
    /// Number of in-flight fetches per batch; batches run sequentially.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.content.endpoint.trim().is_empty() {
        anyhow::bail!("content.endpoint must not be empty");
    }

    if config.cache.ttl_secs == 0 {
        anyhow::bail!("cache.ttl_secs must be >= 1");
    }

    if config.indexer.batch_size == 0 {
        anyhow::bail!("indexer.batch_size must be >= 1");
    }

    match config.cache.backend.as_str() {
        "memory" => {}
        "http" => {
            if config.cache.endpoint.is_none() {
                anyhow::bail!("cache.endpoint must be set when cache.backend is 'http'");
            }
        }
        other => anyhow::bail!("Unknown cache backend: '{}'. Must be memory or http.", other),
    }

    Ok(())
}
