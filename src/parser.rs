//! Frontmatter and markdown content parsing.
//!
//! Pure functions, no I/O. Splits a raw document into structured metadata
//! and a body string, extracts headings, strips quote noise and emoji, and
//! derives the lowercase keyword set used to boost search matches.
//!
//! Frontmatter here is the simple `key: value` dialect used by the site's
//! markdown files, not full YAML: one pair per line, optional quoting,
//! `[a, b, c]` bracket lists. Anything the parser cannot make sense of is
//! treated as body text rather than an error.

use std::collections::BTreeMap;

use crate::models::{ContentType, FrontmatterValue};

/// Maximum preview length produced by [`clean_markdown_content`].
const DISPLAY_CONTENT_MAX_CHARS: usize = 400;

/// Number of leading body characters scanned for keyword candidates.
const KEYWORD_SCAN_CHARS: usize = 1000;

/// Maximum number of body-derived keywords.
const KEYWORD_BODY_LIMIT: usize = 20;

/// Split a raw document into frontmatter attributes and body.
///
/// Recognizes a leading `---` block delimited by `---` lines. Without a
/// well-formed leading block the entire input is the body and the
/// attribute map is empty.
pub fn parse_frontmatter(raw: &str) -> (BTreeMap<String, FrontmatterValue>, String) {
    let mut attributes = BTreeMap::new();

    let Some(rest) = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n")) else {
        return (attributes, raw.to_string());
    };

    let Some(end) = find_closing_delimiter(rest) else {
        return (attributes, raw.to_string());
    };

    let block = &rest[..end.block_len];
    let body = &rest[end.body_start..];

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(colon) = line.find(':') else { continue };
        let key = line[..colon].trim();
        if key.is_empty() {
            continue;
        }
        let value = line[colon + 1..].trim();
        attributes.insert(key.to_string(), parse_value(value));
    }

    (attributes, body.to_string())
}

struct DelimiterMatch {
    block_len: usize,
    body_start: usize,
}

/// Find the closing `---` line of a frontmatter block already stripped of
/// its opening delimiter. The closing line may end the input or be
/// followed by the body.
fn find_closing_delimiter(rest: &str) -> Option<DelimiterMatch> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            return Some(DelimiterMatch {
                block_len: offset,
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }
    // Closing delimiter with no trailing newline.
    if rest[offset..].is_empty() && rest.ends_with("---") {
        return Some(DelimiterMatch {
            block_len: rest.len() - 3,
            body_start: rest.len(),
        });
    }
    None
}

/// Parse a single frontmatter value: bracket lists become `List`, anything
/// else is an unquoted `Scalar`.
fn parse_value(value: &str) -> FrontmatterValue {
    if value.starts_with('[') && value.ends_with(']') {
        return FrontmatterValue::List(parse_bracket_list(value));
    }
    FrontmatterValue::Scalar(unquote(value).to_string())
}

/// Parse `[a, b, c]` into a string list. Tries strict JSON first so quoted
/// entries with embedded commas survive; falls back to a plain comma split
/// when the bracket contents are not valid structured data.
fn parse_bracket_list(value: &str) -> Vec<String> {
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(value) {
        return items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect();
    }

    let inner = &value[1..value.len() - 1];
    inner
        .split(',')
        .map(|s| unquote(s.trim()).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Strip one layer of matching single or double quotes.
fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
        {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Extract ATX headings (`#` through `######`) in document order, with
/// their text cleaned of quotes and emoji.
pub fn extract_headings(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            let hashes = trimmed.chars().take_while(|c| *c == '#').count();
            if !(1..=6).contains(&hashes) {
                return None;
            }
            let rest = &trimmed[hashes..];
            if !rest.starts_with(' ') && !rest.starts_with('\t') {
                return None;
            }
            let text = clean_content_string(&strip_emoji(rest));
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
        .collect()
}

/// Remove quote characters and trim surrounding whitespace.
///
/// Idempotent: applying it twice yields the same string.
pub fn clean_content_string(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Produce the display preview for a body: emoji stripped, whitespace
/// collapsed, truncated to 400 chars with an ellipsis marker. Markdown
/// syntax (bold, links) is left intact; rendering is the display layer's
/// job.
pub fn clean_markdown_content(body: &str) -> String {
    let stripped = strip_emoji(body);
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= DISPLAY_CONTENT_MAX_CHARS {
        return collapsed;
    }

    let truncated: String = collapsed.chars().take(DISPLAY_CONTENT_MAX_CHARS).collect();
    format!("{}...", truncated.trim_end())
}

/// Drop characters in the common emoji/pictograph Unicode ranges.
fn strip_emoji(s: &str) -> String {
    s.chars().filter(|c| !is_emoji(*c)).collect()
}

fn is_emoji(c: char) -> bool {
    matches!(u32::from(c),
        0x1F300..=0x1F5FF   // symbols & pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport & map
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1FA70..=0x1FAFF // extended-A
        | 0x1F1E6..=0x1F1FF // regional indicators
        | 0x2600..=0x26FF   // misc symbols
        | 0x2700..=0x27BF   // dingbats
        | 0xFE0E..=0xFE0F   // variation selectors
        | 0x200D            // zero-width joiner
    )
}

/// Derive the lowercase keyword set for an item: tags, category, heading
/// words longer than 3 chars, and the first ~20 distinct body words of 4+
/// chars from the first 1000 characters. Deterministic for fixed inputs;
/// insertion order is preserved, duplicates dropped.
pub fn generate_search_keywords(
    tags: &[String],
    category: Option<&str>,
    headings: &[String],
    body: &str,
) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    let mut push = |kw: String| {
        if !keywords.contains(&kw) {
            keywords.push(kw);
        }
    };

    for tag in tags {
        let t = tag.trim().to_lowercase();
        if !t.is_empty() {
            push(t);
        }
    }

    if let Some(cat) = category {
        let c = cat.trim().to_lowercase();
        if !c.is_empty() {
            push(c);
        }
    }

    for heading in headings {
        for word in heading.split_whitespace() {
            let w = normalize_word(word);
            if w.chars().count() > 3 {
                push(w);
            }
        }
    }

    let scan: String = body.chars().take(KEYWORD_SCAN_CHARS).collect();
    let mut body_words = 0usize;
    for word in scan.split_whitespace() {
        if body_words >= KEYWORD_BODY_LIMIT {
            break;
        }
        let w = normalize_word(word);
        if w.chars().count() >= 4 && !keywords.contains(&w) {
            keywords.push(w);
            body_words += 1;
        }
    }

    keywords
}

/// Lowercase a token and strip non-alphanumeric edges (punctuation,
/// markdown markers).
fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Map a source path to its content type per the directory convention.
pub fn content_type_from_path(path: &str) -> ContentType {
    if path.starts_with("blog/") {
        ContentType::Blog
    } else if path.starts_with("portfolio/") {
        ContentType::Portfolio
    } else if path.starts_with("projects/") {
        ContentType::Project
    } else {
        ContentType::Page
    }
}

/// Map a source path to its site-relative URL. Pure function of the path
/// and content type.
pub fn url_from_path(path: &str, content_type: ContentType) -> String {
    let stem = path.strip_suffix(".md").unwrap_or(path);
    match content_type {
        ContentType::Blog | ContentType::Portfolio | ContentType::Project => format!("/{stem}"),
        ContentType::Page => {
            let name = stem.rsplit('/').next().unwrap_or(stem);
            format!("/{name}")
        }
    }
}

/// Category heuristic: an explicit `category` attribute wins; otherwise
/// the first tag, title-cased; otherwise none.
pub fn derive_category(
    attributes: &BTreeMap<String, FrontmatterValue>,
    tags: &[String],
) -> Option<String> {
    if let Some(value) = attributes.get("category") {
        let c = clean_content_string(&value.as_scalar());
        if !c.is_empty() {
            return Some(c);
        }
    }
    tags.first().map(|t| title_case(t))
}

fn title_case(s: &str) -> String {
    s.split(['-', '_', ' '])
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

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\ntitle: \"Military Leadership: Be Know Do\"\ndescription: Lessons from the field\ntags: [leadership, military]\ncategory: Leadership\ndate: 2024-05-01\n---\n# Be, Know, Do 🎖️\n\nLeadership is about character and competence.\n\n## The Be\n\nCharacter first.\n";

    #[test]
    fn test_parse_frontmatter_basic() {
        let (attrs, body) = parse_frontmatter(DOC);
        assert_eq!(
            attrs.get("title"),
            Some(&FrontmatterValue::Scalar(
                "Military Leadership: Be Know Do".to_string()
            ))
        );
        assert_eq!(
            attrs.get("tags"),
            Some(&FrontmatterValue::List(vec![
                "leadership".to_string(),
                "military".to_string()
            ]))
        );
        assert!(body.starts_with("# Be, Know, Do"));
    }

    #[test]
    fn test_parse_frontmatter_missing_block_is_body() {
        let raw = "# Just a heading\n\nNo frontmatter here.";
        let (attrs, body) = parse_frontmatter(raw);
        assert!(attrs.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_parse_frontmatter_unclosed_block_is_body() {
        let raw = "---\ntitle: oops\nno closing delimiter";
        let (attrs, body) = parse_frontmatter(raw);
        assert!(attrs.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_parse_frontmatter_quoted_json_list() {
        let raw = "---\ntags: [\"ai, ml\", \"rust\"]\n---\nbody";
        let (attrs, _) = parse_frontmatter(raw);
        assert_eq!(
            attrs.get("tags"),
            Some(&FrontmatterValue::List(vec![
                "ai, ml".to_string(),
                "rust".to_string()
            ]))
        );
    }

    #[test]
    fn test_parse_frontmatter_comma_split_fallback() {
        // Unquoted entries are not valid JSON; fall back to comma split.
        let raw = "---\ntags: [devops, cloud infra]\n---\nbody";
        let (attrs, _) = parse_frontmatter(raw);
        assert_eq!(
            attrs.get("tags"),
            Some(&FrontmatterValue::List(vec![
                "devops".to_string(),
                "cloud infra".to_string()
            ]))
        );
    }

    #[test]
    fn test_parse_frontmatter_scalar_tags_normalize() {
        let raw = "---\ntags: devops\n---\nbody";
        let (attrs, _) = parse_frontmatter(raw);
        let tags = attrs.get("tags").cloned().unwrap().into_list();
        assert_eq!(tags, vec!["devops".to_string()]);
    }

    #[test]
    fn test_extract_headings_in_order() {
        let headings = extract_headings(
            "# First 🚀\nbody\n## Second\n### \"Third\"\nnot # a heading\n####### too many\n",
        );
        assert_eq!(headings, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_clean_content_string_idempotent() {
        let cases = [
            "\"quoted\"",
            "'single'",
            "  mixed \"inner\" quotes  ",
            "plain",
            "",
            "\"\"",
        ];
        for s in cases {
            let once = clean_content_string(s);
            let twice = clean_content_string(&once);
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_clean_content_string_strips_embedded_quotes() {
        assert_eq!(clean_content_string("a \"b\" c"), "a b c");
        assert_eq!(clean_content_string("'wrapped'"), "wrapped");
    }

    #[test]
    fn test_clean_markdown_content_collapses_and_truncates() {
        let long = "word ".repeat(200);
        let cleaned = clean_markdown_content(&long);
        assert!(cleaned.ends_with("..."));
        // 400 chars + "..."
        assert!(cleaned.chars().count() <= 403);
        assert!(!cleaned.contains('\n'));
    }

    #[test]
    fn test_clean_markdown_content_keeps_markdown_syntax() {
        let cleaned = clean_markdown_content("Some **bold** and [a link](https://x) 🎉\n\nmore");
        assert!(cleaned.contains("**bold**"));
        assert!(cleaned.contains("[a link](https://x)"));
        assert!(!cleaned.contains('🎉'));
        assert_eq!(cleaned, "Some **bold** and [a link](https://x) more");
    }

    #[test]
    fn test_clean_markdown_content_short_input_untouched() {
        assert_eq!(clean_markdown_content("short body"), "short body");
    }

    #[test]
    fn test_generate_search_keywords_deterministic() {
        let tags = vec!["DevOps".to_string(), "cloud".to_string()];
        let headings = vec!["Pipeline Design".to_string()];
        let body = "Automation pipelines deploy code quickly and safely every day.";
        let a = generate_search_keywords(&tags, Some("Engineering"), &headings, body);
        let b = generate_search_keywords(&tags, Some("Engineering"), &headings, body);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_search_keywords_contents() {
        let tags = vec!["devops".to_string()];
        let headings = vec!["CI and CD".to_string()];
        let body = "Automation is key. Ship ship ship.";
        let kws = generate_search_keywords(&tags, Some("Ops"), &headings, body);
        assert!(kws.contains(&"devops".to_string()));
        assert!(kws.contains(&"ops".to_string()));
        assert!(kws.contains(&"automation".to_string()));
        // "CI" and "and" are too short for heading words (>3 chars).
        assert!(!kws.contains(&"ci".to_string()));
        assert!(!kws.contains(&"and".to_string()));
        // "key" has 3 chars, below the 4-char body threshold.
        assert!(!kws.contains(&"key".to_string()));
        // No duplicates.
        let mut dedup = kws.clone();
        dedup.dedup();
        assert_eq!(kws, dedup);
    }

    #[test]
    fn test_generate_search_keywords_body_limit() {
        let body = (0..50)
            .map(|i| format!("uniqueword{i:02}"))
            .collect::<Vec<_>>()
            .join(" ");
        let kws = generate_search_keywords(&[], None, &[], &body);
        assert_eq!(kws.len(), 20);
    }

    #[test]
    fn test_content_type_from_path() {
        assert_eq!(content_type_from_path("blog/post.md"), ContentType::Blog);
        assert_eq!(
            content_type_from_path("portfolio/site.md"),
            ContentType::Portfolio
        );
        assert_eq!(
            content_type_from_path("projects/cli.md"),
            ContentType::Project
        );
        assert_eq!(content_type_from_path("about.md"), ContentType::Page);
    }

    #[test]
    fn test_url_from_path() {
        assert_eq!(url_from_path("blog/post.md", ContentType::Blog), "/blog/post");
        assert_eq!(
            url_from_path("projects/cli.md", ContentType::Project),
            "/projects/cli"
        );
        assert_eq!(url_from_path("about.md", ContentType::Page), "/about");
    }

    #[test]
    fn test_derive_category_attribute_wins() {
        let (attrs, _) = parse_frontmatter("---\ncategory: \"Deep Dives\"\n---\nx");
        let cat = derive_category(&attrs, &["rust".to_string()]);
        assert_eq!(cat.as_deref(), Some("Deep Dives"));
    }

    #[test]
    fn test_derive_category_falls_back_to_first_tag() {
        let attrs = BTreeMap::new();
        let cat = derive_category(&attrs, &["ai-automation".to_string()]);
        assert_eq!(cat.as_deref(), Some("Ai Automation"));
        assert_eq!(derive_category(&attrs, &[]), None);
    }
}
