//! Generation-stamped KV cache for the content index.
//!
//! One index generation lives under three logical keys: the serialized
//! item list, a metadata record, and the build timestamp. A generation is
//! valid while `now - last_update < ttl`; it is replaced wholesale by the
//! next full index pass — there are no partial updates.
//!
//! Write order matters: items and metadata are written before the
//! timestamp, so a concurrent reader can never observe a valid timestamp
//! with missing items.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::models::{CacheStats, ContentItem};

const ITEMS_KEY: &str = "content:items";
const LAST_UPDATE_KEY: &str = "content:last-update";
const META_KEY: &str = "content:meta";

/// Minimal key-value store interface, shaped like the KV APIs this worker
/// runs against: string values, optional per-key TTL.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

// ============ In-memory backend ============

struct MemoryEntry {
    value: String,
    expires_at: Option<std::time::Instant>,
}

/// In-memory [`KvStore`] for tests and single-process deployments.
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|entry| {
            match entry.expires_at {
                Some(deadline) if std::time::Instant::now() >= deadline => None,
                _ => Some(entry.value.clone()),
            }
        }))
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: ttl.map(|d| std::time::Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

// ============ HTTP backend ============

/// [`KvStore`] over a KV REST API:
/// `GET/PUT/DELETE {endpoint}/values/{key}`, `?ttl_secs=` on PUT,
/// bearer token from the environment.
pub struct HttpKvStore {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpKvStore {
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("cache.endpoint not set".to_string()))?;
        let token = std::env::var(&config.token_env).map_err(|_| {
            Error::Config(format!("{} environment variable not set", config.token_env))
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn value_url(&self, key: &str) -> String {
        format!("{}/values/{}", self.endpoint, key)
    }
}

#[async_trait]
impl KvStore for HttpKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(self.value_url(key))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Error::Cache(format!(
                "get '{}' failed (HTTP {})",
                key,
                resp.status()
            )));
        }
        Ok(Some(resp.text().await?))
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut req = self
            .client
            .put(self.value_url(key))
            .bearer_auth(&self.token)
            .body(value);
        if let Some(d) = ttl {
            req = req.query(&[("ttl_secs", d.as_secs().to_string())]);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(Error::Cache(format!(
                "put '{}' failed (HTTP {})",
                key,
                resp.status()
            )));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.value_url(key))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Cache(format!(
                "delete '{}' failed (HTTP {})",
                key,
                resp.status()
            )));
        }
        Ok(())
    }
}

// ============ Index cache ============

#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    item_count: usize,
    ttl_secs: u64,
}

/// The generation-stamped index cache over a [`KvStore`].
pub struct IndexCache {
    kv: Box<dyn KvStore>,
    ttl: Duration,
}

impl IndexCache {
    pub fn new(kv: Box<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Return the cached generation only while it is fresh.
    ///
    /// A valid timestamp with missing items counts as a miss; under the
    /// write-order contract that state only occurs mid-replacement.
    pub async fn get(&self) -> Result<Option<Vec<ContentItem>>> {
        let Some(ts) = self.last_update().await? else {
            return Ok(None);
        };

        let age_ms = chrono::Utc::now().timestamp_millis().saturating_sub(ts);
        if age_ms < 0 || age_ms as u128 >= self.ttl.as_millis() {
            return Ok(None);
        }

        self.read_items().await
    }

    /// Return whatever generation is stored, regardless of TTL. Error-path
    /// fallback only.
    pub async fn get_stale(&self) -> Result<Option<Vec<ContentItem>>> {
        self.read_items().await
    }

    /// Replace the stored generation. Items and metadata land before the
    /// timestamp.
    pub async fn put(&self, items: &[ContentItem]) -> Result<()> {
        let serialized = serde_json::to_string(items)?;
        let meta = serde_json::to_string(&CacheMeta {
            item_count: items.len(),
            ttl_secs: self.ttl.as_secs(),
        })?;

        // Keys outlive the generation TTL so stale-serve fallback works;
        // only the timestamp drives freshness.
        let kv_ttl = Some(self.ttl * 4);
        self.kv.put(ITEMS_KEY, serialized, kv_ttl).await?;
        self.kv.put(META_KEY, meta, kv_ttl).await?;
        self.kv
            .put(
                LAST_UPDATE_KEY,
                chrono::Utc::now().timestamp_millis().to_string(),
                kv_ttl,
            )
            .await?;
        Ok(())
    }

    /// Read-only introspection; never triggers a rebuild.
    pub async fn stats(&self) -> Result<CacheStats> {
        let size = match self.kv.get(META_KEY).await? {
            Some(raw) => serde_json::from_str::<CacheMeta>(&raw)
                .map(|m| m.item_count)
                .unwrap_or(0),
            None => 0,
        };
        Ok(CacheStats {
            size,
            last_update: self.last_update().await?,
            ttl_secs: self.ttl.as_secs(),
        })
    }

    /// Clear all cache keys; subsequent `get()` calls miss until the next
    /// `put()`.
    pub async fn invalidate(&self) -> Result<()> {
        self.kv.delete(ITEMS_KEY).await?;
        self.kv.delete(META_KEY).await?;
        self.kv.delete(LAST_UPDATE_KEY).await?;
        Ok(())
    }

    async fn last_update(&self) -> Result<Option<i64>> {
        Ok(self
            .kv
            .get(LAST_UPDATE_KEY)
            .await?
            .and_then(|s| s.trim().parse::<i64>().ok()))
    }

    async fn read_items(&self) -> Result<Option<Vec<ContentItem>>> {
        match self.kv.get(ITEMS_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    #[cfg(test)]
    pub(crate) async fn force_last_update(&self, ts_millis: i64) {
        self.kv
            .put(LAST_UPDATE_KEY, ts_millis.to_string(), None)
            .await
            .unwrap();
    }
}
