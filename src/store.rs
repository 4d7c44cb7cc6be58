//! Blob-store content source adapter.
//!
//! Lists and fetches raw markdown objects from the site's file API. The
//! adapter is read-only; it never mutates the store. Listing follows
//! cursor pagination until exhausted, and results are filtered to `.md`
//! objects under the configured directory allow-list (plus standalone
//! extras), with optional include/exclude glob patterns on top.
//!
//! # Authentication
//!
//! The bearer token is read from the environment variable named by
//! `content.token_env` (default `CONTENT_API_TOKEN`). Constructing the
//! store without it fails immediately so every request path can reject
//! before doing any work.
//!
//! # Wire protocol (consumed)
//!
//! - `GET {endpoint}/list?prefix=&cursor=` →
//!   `{ "items": [{"path": "...", "sha": "..."}], "nextCursor": "..."? }`
//! - `GET {endpoint}/get?path=...` → `{ "base64Content": "..." }`,
//!   404 when the object is absent.

use async_trait::async_trait;
use base64::Engine as _;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::config::ContentConfig;
use crate::error::{Error, Result};

/// Listing entry for one source object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Path-like object key (e.g. `blog/post.md`).
    pub path: String,
    /// Stable content identifier (sha/etag) from the store.
    pub sha: String,
}

/// Read-only source of raw markdown documents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all indexable objects: `.md` files under the allowed
    /// directories plus the configured standalone files.
    async fn list(&self) -> Result<Vec<ObjectMeta>>;

    /// Fetch one object decoded to UTF-8 text. [`Error::NotFound`] when
    /// the object is absent, [`Error::Transport`] on remote failure.
    async fn fetch_raw(&self, path: &str) -> Result<String>;
}

/// HTTP implementation of [`ObjectStore`] against the site's file API.
#[derive(Debug)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    config: ContentConfig,
    include: GlobSet,
    exclude: GlobSet,
}

impl HttpObjectStore {
    /// Build the store from config, reading the bearer token from the
    /// configured environment variable. Fails fast when it is missing.
    pub fn from_config(config: &ContentConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).map_err(|_| {
            Error::Config(format!(
                "{} environment variable not set",
                config.token_env
            ))
        })?;

        let include = build_globset(&config.include_globs)?;
        let exclude = build_globset(&config.exclude_globs)?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token,
            config: config.clone(),
            include,
            exclude,
        })
    }

    /// Whether a listed path belongs in the index.
    fn is_indexable(&self, path: &str) -> bool {
        if !path.ends_with(".md") {
            return false;
        }
        let allowed = self
            .config
            .allowed_dirs
            .iter()
            .any(|dir| path.starts_with(&format!("{}/", dir.trim_end_matches('/'))))
            || self.config.extra_files.iter().any(|f| f == path);
        if !allowed {
            return false;
        }
        if self.exclude.is_match(path) {
            return false;
        }
        self.include.is_match(path)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    items: Vec<ListEntry>,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    path: String,
    #[serde(default)]
    sha: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetResponse {
    base64_content: String,
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn list(&self) -> Result<Vec<ObjectMeta>> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = format!("{}/list", self.endpoint);
            let mut req = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[("prefix", "")]);
            if let Some(ref c) = cursor {
                req = req.query(&[("cursor", c.as_str())]);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| Error::SourceUnavailable(format!("list request failed: {e}")))?;

            if !resp.status().is_success() {
                return Err(Error::SourceUnavailable(format!(
                    "list failed (HTTP {})",
                    resp.status()
                )));
            }

            let page: ListResponse = resp
                .json()
                .await
                .map_err(|e| Error::SourceUnavailable(format!("list response invalid: {e}")))?;

            objects.extend(
                page.items
                    .into_iter()
                    .filter(|entry| self.is_indexable(&entry.path))
                    .map(|entry| ObjectMeta {
                        path: entry.path,
                        sha: entry.sha,
                    }),
            );

            match page.next_cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn fetch_raw(&self, path: &str) -> Result<String> {
        let url = format!("{}/get", self.endpoint);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("path", path)])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }

        let body: GetResponse = resp.error_for_status()?.json().await?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body.base64_content.trim())
            .map_err(|e| Error::Other(format!("invalid base64 for '{path}': {e}")))?;

        Ok(String::from_utf8_lossy(&bytes).to_string())
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern)
                .map_err(|e| Error::Config(format!("invalid glob '{pattern}': {e}")))?,
        );
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("invalid glob set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentConfig;

    fn test_config() -> ContentConfig {
        ContentConfig {
            endpoint: "https://content.example.com/api/files".to_string(),
            allowed_dirs: vec![
                "blog".to_string(),
                "portfolio".to_string(),
                "projects".to_string(),
            ],
            extra_files: vec!["about.md".to_string()],
            include_globs: vec!["**/*.md".to_string()],
            exclude_globs: vec!["**/drafts/**".to_string()],
            token_env: "FOLIO_TEST_CONTENT_TOKEN".to_string(),
        }
    }

    fn test_store() -> HttpObjectStore {
        std::env::set_var("FOLIO_TEST_CONTENT_TOKEN", "t");
        HttpObjectStore::from_config(&test_config()).unwrap()
    }

    #[test]
    fn test_missing_token_fails_fast() {
        let mut cfg = test_config();
        cfg.token_env = "FOLIO_TEST_UNSET_TOKEN".to_string();
        std::env::remove_var("FOLIO_TEST_UNSET_TOKEN");
        let err = HttpObjectStore::from_config(&cfg).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_is_indexable_allow_list() {
        let store = test_store();
        assert!(store.is_indexable("blog/post.md"));
        assert!(store.is_indexable("projects/cli.md"));
        assert!(store.is_indexable("about.md"));
        // Not in the allow-list.
        assert!(!store.is_indexable("secrets/keys.md"));
        assert!(!store.is_indexable("resume.md"));
        // Wrong extension.
        assert!(!store.is_indexable("blog/image.png"));
        // Excluded by glob.
        assert!(!store.is_indexable("blog/drafts/wip.md"));
    }

    async fn fake_get(
        axum::extract::Query(params): axum::extract::Query<
            std::collections::HashMap<String, String>,
        >,
    ) -> axum::response::Response {
        use axum::response::IntoResponse;
        match params.get("path").map(String::as_str) {
            Some("blog/ok.md") => axum::Json(serde_json::json!({
                "base64Content": base64::engine::general_purpose::STANDARD.encode("# Hello")
            }))
            .into_response(),
            Some("blog/missing.md") => axum::http::StatusCode::NOT_FOUND.into_response(),
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    #[tokio::test]
    async fn test_fetch_raw_status_taxonomy() {
        let app = axum::Router::new().route("/get", axum::routing::get(fake_get));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        std::env::set_var("FOLIO_TEST_CONTENT_TOKEN", "t");
        let mut cfg = test_config();
        cfg.endpoint = format!("http://{addr}");
        let store = HttpObjectStore::from_config(&cfg).unwrap();

        assert_eq!(store.fetch_raw("blog/ok.md").await.unwrap(), "# Hello");
        assert!(matches!(
            store.fetch_raw("blog/missing.md").await,
            Err(Error::NotFound(_))
        ));
        // Any other upstream failure is a transport error, not `Other`.
        assert!(matches!(
            store.fetch_raw("blog/broken.md").await,
            Err(Error::Transport(_))
        ));
    }
}
