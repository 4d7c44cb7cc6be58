//! Keyword search and recommendation scoring.
//!
//! Both operations are pure functions of `(request, items)` — no hidden
//! state beyond the index passed in. The scoring model is an intentional
//! heuristic weighted-term match, not TF-IDF; the two modes carry their
//! own independently tuned constants.
//!
//! `search` enforces a minimum query length and a positive-score
//! threshold; `recommend` enforces neither, so "related content" panels
//! always get candidates even when nothing matches well.

use crate::error::{Error, Result};
use crate::models::{ContentItem, SearchHit, SearchRequest};

/// Default result limit for keyword search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Default result limit for recommendations.
pub const DEFAULT_RECOMMEND_LIMIT: usize = 5;
/// Minimum trimmed query length for keyword search (inclusive).
pub const MIN_QUERY_LEN: usize = 2;

// Additive keyword-search weights.
const TITLE_WEIGHT: i64 = 100;
const DESCRIPTION_WEIGHT: i64 = 50;
const TAG_WEIGHT: i64 = 30;
const KEYWORD_WEIGHT: i64 = 20;
const HEADING_WEIGHT: i64 = 25;
const CONTENT_WEIGHT: i64 = 10;

// Recommendation weights (fractions scale these; clamped to 100 total).
const REC_TAG_WEIGHT: f64 = 50.0;
const REC_QUERY_WEIGHT: f64 = 30.0;
const REC_CATEGORY_WEIGHT: f64 = 20.0;
const REC_MAX_SCORE: f64 = 100.0;

/// Rank items against a free-text query.
///
/// # Errors
///
/// [`Error::Validation`] when the trimmed query is shorter than
/// [`MIN_QUERY_LEN`] characters.
pub fn search(request: &SearchRequest, items: &[ContentItem]) -> Result<Vec<SearchHit>> {
    let query = request.query.trim().to_lowercase();
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(Error::Validation(format!(
            "query must be at least {MIN_QUERY_LEN} characters"
        )));
    }

    let requested_tags = request.tags.as_deref().unwrap_or(&[]);

    let mut scored: Vec<(i64, &ContentItem)> = items
        .iter()
        .filter(|item| matches_content_type(item, request.content_type.as_deref()))
        .filter(|item| matches_tag_filter(item, requested_tags))
        .filter(|item| !is_excluded(item, request.exclude_url.as_deref()))
        .map(|item| (score_item(item, &query), item))
        .filter(|(score, _)| *score > 0)
        .collect();

    // Stable sort keeps input order on ties.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(request.max_results.unwrap_or(DEFAULT_SEARCH_LIMIT));

    Ok(scored.into_iter().map(|(_, item)| item.into()).collect())
}

/// Rank items for a related-content panel. No minimum query length and no
/// score threshold: even zero-score items are returned up to the limit.
pub fn recommend(request: &SearchRequest, items: &[ContentItem]) -> Vec<SearchHit> {
    let query = request.query.trim().to_lowercase();
    let requested_tags: Vec<String> = request
        .tags
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|t| t.to_lowercase())
        .collect();

    let mut scored: Vec<(f64, &ContentItem)> = items
        .iter()
        .filter(|item| matches_content_type(item, request.content_type.as_deref()))
        .filter(|item| !is_excluded(item, request.exclude_url.as_deref()))
        .map(|item| (similarity_score(item, &query, &requested_tags), item))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(request.max_results.unwrap_or(DEFAULT_RECOMMEND_LIMIT));

    scored.into_iter().map(|(_, item)| item.into()).collect()
}

// ============ Filters ============

fn matches_content_type(item: &ContentItem, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(f) if f.eq_ignore_ascii_case("all") || f.is_empty() => true,
        Some(f) => item.content_type.as_str().eq_ignore_ascii_case(f),
    }
}

/// Symmetric case-insensitive substring containment: the item passes when
/// any requested tag contains (or is contained by) any item tag.
fn matches_tag_filter(item: &ContentItem, requested: &[String]) -> bool {
    if requested.is_empty() {
        return true;
    }
    requested.iter().any(|req| {
        let req = req.to_lowercase();
        item.tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            tag.contains(&req) || req.contains(&tag)
        })
    })
}

fn is_excluded(item: &ContentItem, exclude_url: Option<&str>) -> bool {
    exclude_url.is_some_and(|url| item.url == url)
}

// ============ Keyword scoring ============

/// Additive weighted-term score of one item against a lowercased query.
fn score_item(item: &ContentItem, query: &str) -> i64 {
    let mut score = 0i64;

    if item.title.to_lowercase().contains(query) {
        score += TITLE_WEIGHT;
    }
    if item.description.to_lowercase().contains(query) {
        score += DESCRIPTION_WEIGHT;
    }
    for tag in &item.tags {
        if tag.to_lowercase().contains(query) {
            score += TAG_WEIGHT;
        }
    }
    for keyword in &item.search_keywords {
        if keyword.contains(query) {
            score += KEYWORD_WEIGHT;
        }
    }
    for heading in &item.headings {
        if heading.to_lowercase().contains(query) {
            score += HEADING_WEIGHT;
        }
    }
    if item.content.to_lowercase().contains(query) {
        score += CONTENT_WEIGHT;
    }

    score
}

// ============ Similarity scoring ============

/// Fraction-based similarity for recommendations:
/// `tag_fraction * 50 + query_word_fraction * 30 + category_match * 20`,
/// clamped to 100. Denominators are floored at 1 so empty inputs
/// contribute zero rather than dividing by zero.
fn similarity_score(item: &ContentItem, query: &str, requested_tags: &[String]) -> f64 {
    let item_tags: Vec<String> = item.tags.iter().map(|t| t.to_lowercase()).collect();

    let matched_tags = requested_tags
        .iter()
        .filter(|req| {
            item_tags
                .iter()
                .any(|tag| tag.contains(req.as_str()) || req.contains(tag.as_str()))
        })
        .count();
    let tag_fraction = matched_tags as f64 / requested_tags.len().max(1) as f64;

    let haystack = format!(
        "{} {} {}",
        item.title.to_lowercase(),
        item.description.to_lowercase(),
        item.content.to_lowercase()
    );
    let query_words: Vec<&str> = query
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();
    let matched_words = query_words
        .iter()
        .filter(|w| haystack.contains(**w))
        .count();
    let word_fraction = matched_words as f64 / query_words.len().max(1) as f64;

    let category_match = item.category.as_deref().is_some_and(|cat| {
        let cat = cat.to_lowercase();
        requested_tags
            .iter()
            .any(|tag| cat.contains(tag.as_str()) || tag.contains(&cat))
    });

    let score = tag_fraction * REC_TAG_WEIGHT
        + word_fraction * REC_QUERY_WEIGHT
        + if category_match { REC_CATEGORY_WEIGHT } else { 0.0 };

    score.min(REC_MAX_SCORE)
}
