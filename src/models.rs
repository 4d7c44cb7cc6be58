//! Core data models for the indexing and search pipeline.
//!
//! Wire-facing types serialize with camelCase field names to match the
//! site's existing JSON protocol.

use serde::{Deserialize, Serialize};

/// The kind of source document, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Portfolio,
    Project,
    Page,
}

impl ContentType {
    /// Wire label for this content type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Portfolio => "portfolio",
            Self::Project => "project",
            Self::Page => "page",
        }
    }
}

/// One indexed document.
///
/// `search_keywords` is always derived from the other fields by the parser;
/// it is regenerated on every index pass and never hand-edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Stable identifier: the source object's sha/etag, or a content hash.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Full body text; the source of truth for search. Never returned to
    /// clients.
    pub content: String,
    /// Normalized, truncated (≤400 chars), emoji-free preview of `content`.
    pub display_content: String,
    pub tags: Vec<String>,
    /// Site-relative path, a pure function of the source path.
    pub url: String,
    pub content_type: ContentType,
    pub category: Option<String>,
    /// Heading strings extracted from the body, in document order.
    pub headings: Vec<String>,
    /// Derived lowercase tokens used to boost matches.
    pub search_keywords: Vec<String>,
    /// Opaque version reference from the source store.
    pub last_modified: String,
}

/// Display-safe projection of a [`ContentItem`] returned by the query
/// engine: the full `content` field (and any internal score) is stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub description: String,
    pub display_content: String,
    pub tags: Vec<String>,
    pub url: String,
    pub content_type: ContentType,
    pub category: Option<String>,
    pub headings: Vec<String>,
    pub last_modified: String,
}

impl From<&ContentItem> for SearchHit {
    fn from(item: &ContentItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            display_content: item.display_content.clone(),
            tags: item.tags.clone(),
            url: item.url.clone(),
            content_type: item.content_type,
            category: item.category.clone(),
            headings: item.headings.clone(),
            last_modified: item.last_modified.clone(),
        }
    }
}

/// A search or recommendation request. Not persisted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    /// `"all"` (or absent) means no type filter.
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Drop the item with this exact url from the candidate set.
    #[serde(default)]
    pub exclude_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Read-only cache introspection, returned by `GET /api/cache/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of items in the stored generation (0 when empty).
    pub size: usize,
    /// Epoch milliseconds of the last full index pass, if any.
    pub last_update: Option<i64>,
    pub ttl_secs: u64,
}

/// A frontmatter value: scalars and lists both occur in the wild (`tags`
/// is sometimes a string, sometimes an array). Normalized to `Vec<String>`
/// at the parser boundary so downstream code never branches on shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FrontmatterValue {
    /// Normalize to a list: a scalar becomes a single-element list, unless
    /// it is empty.
    #[must_use]
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::Scalar(s) if s.is_empty() => Vec::new(),
            Self::Scalar(s) => vec![s],
            Self::List(v) => v,
        }
    }

    /// Scalar view; lists render as their comma-joined form.
    #[must_use]
    pub fn as_scalar(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::List(v) => v.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_wire_labels() {
        assert_eq!(ContentType::Blog.as_str(), "blog");
        assert_eq!(
            serde_json::to_string(&ContentType::Portfolio).unwrap(),
            "\"portfolio\""
        );
        let ct: ContentType = serde_json::from_str("\"project\"").unwrap();
        assert_eq!(ct, ContentType::Project);
    }

    #[test]
    fn test_search_request_camel_case() {
        let req: SearchRequest = serde_json::from_str(
            r#"{"query":"ai","contentType":"blog","maxResults":3,"excludeUrl":"/blog/x","tags":["rust"]}"#,
        )
        .unwrap();
        assert_eq!(req.query, "ai");
        assert_eq!(req.content_type.as_deref(), Some("blog"));
        assert_eq!(req.max_results, Some(3));
        assert_eq!(req.exclude_url.as_deref(), Some("/blog/x"));
        assert_eq!(req.tags, Some(vec!["rust".to_string()]));
    }

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.query, "");
        assert!(req.content_type.is_none());
        assert!(req.tags.is_none());
    }

    #[test]
    fn test_frontmatter_value_into_list() {
        assert_eq!(
            FrontmatterValue::Scalar("devops".to_string()).into_list(),
            vec!["devops".to_string()]
        );
        assert!(FrontmatterValue::Scalar(String::new())
            .into_list()
            .is_empty());
        assert_eq!(
            FrontmatterValue::List(vec!["a".to_string(), "b".to_string()]).into_list(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_hit_strips_content() {
        let json = serde_json::to_value(SearchHit {
            id: "x".into(),
            title: "t".into(),
            description: "d".into(),
            display_content: "dc".into(),
            tags: vec![],
            url: "/blog/x".into(),
            content_type: ContentType::Blog,
            category: None,
            headings: vec![],
            last_modified: "abc".into(),
        })
        .unwrap();
        assert!(json.get("content").is_none());
        assert!(json.get("score").is_none());
        assert!(json.get("displayContent").is_some());
        assert!(json.get("lastModified").is_some());
    }
}
