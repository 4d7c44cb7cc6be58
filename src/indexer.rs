//! Batched index construction.
//!
//! One pass over all discoverable source files: list, then fetch and parse
//! in fixed-size batches. Fetches inside a batch run concurrently and are
//! joined with a settle-all policy — a single bad file is logged and
//! omitted, never failing the pass. Only a failure of the listing call
//! itself aborts the whole build.
//!
//! The returned order is whatever batch completion produced; callers that
//! need a stable presentation order must sort explicitly.

use futures::future::join_all;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::ContentItem;
use crate::parser;
use crate::store::{ObjectMeta, ObjectStore};

/// Build the full content index.
///
/// # Errors
///
/// [`Error::SourceUnavailable`] when the listing call fails. Per-file
/// fetch/parse failures are logged and skipped.
pub async fn build_index(store: &dyn ObjectStore, batch_size: usize) -> Result<Vec<ContentItem>> {
    let metas = store.list().await.map_err(|e| match e {
        Error::SourceUnavailable(m) => Error::SourceUnavailable(m),
        other => Error::SourceUnavailable(other.to_string()),
    })?;

    let batch_size = batch_size.max(1);
    let mut items = Vec::with_capacity(metas.len());

    for batch in metas.chunks(batch_size) {
        let fetched = join_all(batch.iter().map(|meta| process_object(store, meta))).await;
        for (meta, result) in batch.iter().zip(fetched) {
            match result {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(path = %meta.path, error = %e, "skipping source file");
                }
            }
        }
    }

    Ok(items)
}

/// Fetch and parse one source object into a [`ContentItem`].
async fn process_object(store: &dyn ObjectStore, meta: &ObjectMeta) -> Result<ContentItem> {
    let raw = store.fetch_raw(&meta.path).await?;
    Ok(item_from_raw(&meta.path, &meta.sha, &raw))
}

/// Pure assembly of a [`ContentItem`] from a raw document.
pub fn item_from_raw(path: &str, sha: &str, raw: &str) -> ContentItem {
    let (attributes, body) = parser::parse_frontmatter(raw);

    let tags: Vec<String> = attributes
        .get("tags")
        .cloned()
        .map(|v| {
            v.into_list()
                .into_iter()
                .map(|t| parser::clean_content_string(&t))
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let content_type = parser::content_type_from_path(path);
    let url = parser::url_from_path(path, content_type);
    let headings = parser::extract_headings(&body);
    let category = parser::derive_category(&attributes, &tags);

    let title = attributes
        .get("title")
        .map(|v| parser::clean_content_string(&v.as_scalar()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_path(path));

    let description = attributes
        .get("description")
        .map(|v| parser::clean_content_string(&v.as_scalar()))
        .unwrap_or_default();

    let search_keywords =
        parser::generate_search_keywords(&tags, category.as_deref(), &headings, &body);

    let id = if sha.is_empty() {
        content_hash(path, raw)
    } else {
        sha.to_string()
    };

    ContentItem {
        id,
        title,
        description,
        display_content: parser::clean_markdown_content(&body),
        content: body,
        tags,
        url,
        content_type,
        category,
        headings,
        search_keywords,
        last_modified: sha.to_string(),
    }
}

/// Fallback identifier when the store gives no sha: hash of path + content.
fn content_hash(path: &str, raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Derive a readable title from the file name: `blog/my-post.md` → `My Post`.
fn title_from_path(path: &str) -> String {
    let stem = path
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .strip_suffix(".md")
        .unwrap_or(path);
    stem.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
