//! Path utilities: normalization, joining and placeholder handling
//!
//! All functions are pure: same input, same output, no side effects.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)(\?)?\}").unwrap());

/// A segment of a compiled route path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Literal text: `blog`
    Static(String),
    /// Required parameter: `{article}`
    Required(String),
    /// Optional parameter: `{page?}`
    Optional(String),
}

/// Classifies a single path segment
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::path::{classify_segment, PatternSegment};
///
/// assert_eq!(classify_segment("blog"), PatternSegment::Static("blog".to_string()));
/// assert_eq!(classify_segment("{id}"), PatternSegment::Required("id".to_string()));
/// assert_eq!(classify_segment("{page?}"), PatternSegment::Optional("page".to_string()));
/// ```
pub fn classify_segment(segment: &str) -> PatternSegment {
    match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(inner) => match inner.strip_suffix('?') {
            Some(name) => PatternSegment::Optional(name.to_string()),
            None => PatternSegment::Required(inner.to_string()),
        },
        None => PatternSegment::Static(segment.to_string()),
    }
}

/// Splits a compiled path into classified segments
pub fn parse_pattern(path: &str) -> Vec<PatternSegment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(classify_segment)
        .collect()
}

/// Names of the required `{name}` segments in a path, in order
///
/// Optional placeholders (`{name?}`) are not required and left out.
pub fn required_parameters(path: &str) -> Vec<String> {
    parse_pattern(path)
        .into_iter()
        .filter_map(|segment| match segment {
            PatternSegment::Required(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Names of all placeholder segments in a path, required or optional
pub fn all_parameters(path: &str) -> Vec<String> {
    parse_pattern(path)
        .into_iter()
        .filter_map(|segment| match segment {
            PatternSegment::Required(name) | PatternSegment::Optional(name) => Some(name),
            PatternSegment::Static(_) => None,
        })
        .collect()
}

/// First segment mixing a placeholder with literal text, e.g. `page-{n}`
///
/// Placeholders must span a whole segment; such segments can be neither
/// matched nor filled.
pub fn find_embedded_placeholder(path: &str) -> Option<&str> {
    path.split('/').find(|segment| {
        matches!(classify_segment(segment), PatternSegment::Static(_))
            && PLACEHOLDER_REGEX.is_match(segment)
    })
}

/// Joins path parts with `/`, skipping empty parts
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::path::join_segments;
///
/// assert_eq!(join_segments(["de", "", "blog", "{article}"]), "de/blog/{article}");
/// assert_eq!(join_segments(["", ""]), "");
/// ```
pub fn join_segments<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter_map(|part| {
            let part = part.as_ref().trim_matches('/');
            if part.is_empty() {
                None
            } else {
                Some(part.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Matching priority of a compiled path (lower matches first)
///
/// Static paths come first, then paths with required parameters, then paths
/// with optional parameters. Deeper paths win within a class.
pub fn calculate_priority(segments: &[PatternSegment]) -> usize {
    let depth = segments.len();
    let required = segments
        .iter()
        .filter(|s| matches!(s, PatternSegment::Required(_)))
        .count();
    let optional = segments
        .iter()
        .filter(|s| matches!(s, PatternSegment::Optional(_)))
        .count();

    match (required, optional) {
        (0, 0) => 0,
        (_, 0) => 100 + required * 10 - depth.min(9),
        _ => 1000 + (required + optional) * 10 - depth.min(9),
    }
}

/// Validates if a request path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a request path to canonical form
///
/// Returns `Cow::Borrowed` when the input is already canonical.
///
/// - Trailing slashes: `/path/` → `/path`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/de/blog"), Cow::Borrowed("/de/blog")));
/// assert_eq!(normalize_path("de//blog/"), "/de/blog");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}
