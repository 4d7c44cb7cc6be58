//! Orchestration: cache-first index access and the read-path operations.
//!
//! `SearchService` ties the pipeline together. Every read goes through
//! [`SearchService::all_items`]:
//!
//! ```text
//!   cache fresh? ──yes──▶ serve cached generation
//!        │no
//!        ▼
//!   rebuild from source ──ok──▶ store + serve new generation
//!        │source down
//!        ▼
//!   stale generation in cache? ──yes──▶ serve it (logged)
//!        │no
//!        ▼
//!   propagate the source error
//! ```
//!
//! The stale-serve step means a flaky content store degrades search
//! freshness, not availability.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::IndexCache;
use crate::error::{Error, Result};
use crate::indexer;
use crate::models::{CacheStats, ContentItem, SearchHit, SearchRequest};
use crate::query;
use crate::store::ObjectStore;

pub struct SearchService {
    store: Arc<dyn ObjectStore>,
    cache: IndexCache,
    batch_size: usize,
}

impl SearchService {
    pub fn new(store: Arc<dyn ObjectStore>, cache: IndexCache, batch_size: usize) -> Self {
        Self {
            store,
            cache,
            batch_size,
        }
    }

    /// The current index: cached generation when fresh, otherwise a full
    /// rebuild, falling back to a stale generation when the source is
    /// unreachable.
    pub async fn all_items(&self) -> Result<Vec<ContentItem>> {
        if let Some(items) = self.cache.get().await? {
            return Ok(items);
        }

        match self.refresh().await {
            Ok(items) => Ok(items),
            Err(Error::SourceUnavailable(msg)) => {
                warn!(error = %msg, "content source unavailable, trying stale cache");
                match self.cache.get_stale().await? {
                    Some(items) => {
                        info!(count = items.len(), "serving stale index");
                        Ok(items)
                    }
                    None => Err(Error::SourceUnavailable(msg)),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Rebuild the index from source and replace the cached generation.
    pub async fn refresh(&self) -> Result<Vec<ContentItem>> {
        let items = indexer::build_index(self.store.as_ref(), self.batch_size).await?;
        info!(count = items.len(), "index rebuilt");
        if let Err(e) = self.cache.put(&items).await {
            // A dead cache should not take down a successful rebuild.
            warn!(error = %e, "failed to store index in cache");
        }
        Ok(items)
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let items = self.all_items().await?;
        query::search(request, &items)
    }

    pub async fn recommend(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let items = self.all_items().await?;
        Ok(query::recommend(request, &items))
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        self.cache.stats().await
    }

    pub async fn invalidate(&self) -> Result<()> {
        self.cache.invalidate().await
    }

    /// Kick off a background rebuild and return immediately. The caller
    /// learns nothing about the outcome beyond the logs.
    pub fn prewarm(self: &Arc<Self>) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            match service.refresh().await {
                Ok(items) => info!(count = items.len(), "prewarm complete"),
                Err(e) => warn!(error = %e, "prewarm failed"),
            }
        });
    }
}

/// Convenience constructor used by both the CLI and tests: memory-backed
/// cache with the given TTL.
pub fn with_memory_cache(
    store: Arc<dyn ObjectStore>,
    ttl: Duration,
    batch_size: usize,
) -> SearchService {
    use crate::cache::MemoryKvStore;
    SearchService::new(
        store,
        IndexCache::new(Box::new(MemoryKvStore::new()), ttl),
        batch_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectMeta;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FlakyStore {
        down: AtomicBool,
        list_calls: AtomicUsize,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                down: AtomicBool::new(false),
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FlakyStore {
        async fn list(&self) -> Result<Vec<ObjectMeta>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(Error::SourceUnavailable("store down".to_string()));
            }
            Ok(vec![ObjectMeta {
                path: "blog/rust-post.md".to_string(),
                sha: "sha1".to_string(),
            }])
        }

        async fn fetch_raw(&self, _path: &str) -> Result<String> {
            if self.down.load(Ordering::SeqCst) {
                return Err(Error::SourceUnavailable("store down".to_string()));
            }
            Ok("---\ntitle: Rust Post\ntags: [rust]\n---\n# Rust\n\nBody text.".to_string())
        }
    }

    fn service(store: Arc<FlakyStore>) -> SearchService {
        with_memory_cache(store, Duration::from_secs(1800), 10)
    }

    #[tokio::test]
    async fn test_first_read_builds_index() {
        let store = Arc::new(FlakyStore::new());
        let svc = service(Arc::clone(&store));
        let items = svc.all_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Rust Post");
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_read_served_from_cache() {
        let store = Arc::new(FlakyStore::new());
        let svc = service(Arc::clone(&store));
        svc.all_items().await.unwrap();
        svc.all_items().await.unwrap();
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_serve_when_source_down() {
        let store = Arc::new(FlakyStore::new());
        let svc = service(Arc::clone(&store));
        svc.all_items().await.unwrap();

        // Invalidate only the freshness stamp by clearing everything and
        // re-warming, then kill the store: a plain invalidate would also
        // drop the stale copy, so instead expire the generation.
        svc.cache.force_last_update(0).await;
        store.down.store(true, Ordering::SeqCst);

        let items = svc.all_items().await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_source_error_propagates_without_stale_copy() {
        let store = Arc::new(FlakyStore::new());
        store.down.store(true, Ordering::SeqCst);
        let svc = service(Arc::clone(&store));
        let err = svc.all_items().await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_search_through_service() {
        let store = Arc::new(FlakyStore::new());
        let svc = service(store);
        let req = SearchRequest {
            query: "rust".to_string(),
            ..Default::default()
        };
        let hits = svc.search(&req).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "/blog/rust-post");
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let store = Arc::new(FlakyStore::new());
        let svc = service(Arc::clone(&store));
        svc.all_items().await.unwrap();
        svc.invalidate().await.unwrap();
        svc.all_items().await.unwrap();
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    }
}
