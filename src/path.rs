//! Attribute paths.
//!
//! An attribute is a dotted field path that may carry one element filter:
//!
//! ```text
//! prices.currency                      - plain path
//! classifications[type:netbase].code   - `code` of the classifications element whose type is netbase
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CompileError, Result, StructuralReason};

static FILTERED_PATH: OnceLock<Regex> = OnceLock::new();

fn filtered_path_regex() -> &'static Regex {
    FILTERED_PATH.get_or_init(|| {
        Regex::new(r"^([^\[\]:]+)\[([^\[\]:.]+):([^\[\]]+)\]\.([^\[\]:]+)$").unwrap()
    })
}

/// `[key:value]` segment selecting one element of an array of objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFilter {
    pub key: String,
    pub value: String,
}

/// A parsed attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    /// Segments up to and including the filtered array, or the whole path
    /// when there is no filter
    head: Vec<String>,
    filter: Option<ElementFilter>,
    /// Segments after the filter
    tail: Vec<String>,
}

impl AttributePath {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || CompileError::structural(StructuralReason::InvalidPath(raw.to_string()));

        if let Some(captures) = filtered_path_regex().captures(raw) {
            let head = split_segments(&captures[1]).ok_or_else(invalid)?;
            let tail = split_segments(&captures[4]).ok_or_else(invalid)?;
            return Ok(AttributePath {
                head,
                filter: Some(ElementFilter {
                    key: captures[2].trim().to_string(),
                    value: captures[3].trim().to_string(),
                }),
                tail,
            });
        }

        if raw.contains(['[', ']']) {
            return Err(invalid());
        }

        Ok(AttributePath {
            head: split_segments(raw).ok_or_else(invalid)?,
            filter: None,
            tail: Vec::new(),
        })
    }

    /// The path with the filter segment removed; this is what the schema knows.
    pub fn schema_path(&self) -> String {
        self.head
            .iter()
            .chain(self.tail.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn filter(&self) -> Option<&ElementFilter> {
        self.filter.as_ref()
    }

    /// Path of the filtered array (`classifications`), if any.
    pub fn array_path(&self) -> Option<String> {
        self.filter.as_ref().map(|_| self.head.join("."))
    }

    /// Path after the filter, relative to the filtered array (`code`).
    pub fn element_path(&self) -> Option<String> {
        self.filter.as_ref().map(|_| self.tail.join("."))
    }
}

fn split_segments(path: &str) -> Option<Vec<String>> {
    let segments: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
    if segments.iter().any(String::is_empty) {
        None
    } else {
        Some(segments)
    }
}

/// Longest dot-segment prefix shared by all paths.
///
/// Returns `None` when nothing is shared, or when the shared prefix is itself
/// one of the paths (two clauses on the very same field are never grouped).
pub fn common_prefix(paths: &[&str]) -> Option<String> {
    let (first, rest) = paths.split_first()?;
    let mut shared: Vec<&str> = first.split('.').collect();

    for path in rest {
        let common = shared
            .iter()
            .zip(path.split('.'))
            .take_while(|(a, b)| **a == *b)
            .count();
        shared.truncate(common);
    }

    if shared.is_empty() {
        return None;
    }
    let prefix = shared.join(".");
    if paths.iter().any(|p| *p == prefix) {
        return None;
    }
    Some(prefix)
}

/// Strip the last segment: `a.b.c` -> `a.b`, `a` -> `None`.
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(head, _)| head)
}

/// Proper prefixes of `path`, longest first: `a.b.c` -> `a.b`, `a`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent(path), |p| parent(*p))
}

/// `path` with `ancestor.` removed from the front.
pub fn relative_to<'a>(path: &'a str, ancestor: &str) -> &'a str {
    path.strip_prefix(ancestor)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let path = AttributePath::parse("book.format").unwrap();
        assert_eq!(path.schema_path(), "book.format");
        assert!(path.filter().is_none());
        assert_eq!(path.array_path(), None);
    }

    #[test]
    fn test_filtered_path() {
        let path = AttributePath::parse("classifications[type:netbase].code").unwrap();
        assert_eq!(path.schema_path(), "classifications.code");
        assert_eq!(path.array_path().as_deref(), Some("classifications"));
        assert_eq!(path.element_path().as_deref(), Some("code"));
        let filter = path.filter().unwrap();
        assert_eq!(filter.key, "type");
        assert_eq!(filter.value, "netbase");
    }

    #[test]
    fn test_filter_inside_nested_head() {
        let path = AttributePath::parse("work.contributors[role:author].name.last").unwrap();
        assert_eq!(path.schema_path(), "work.contributors.name.last");
        assert_eq!(path.array_path().as_deref(), Some("work.contributors"));
        assert_eq!(path.element_path().as_deref(), Some("name.last"));
    }

    #[test]
    fn test_invalid_paths() {
        for raw in [
            "",
            "a..b",
            "a[b:c]",
            "a[b:c].d[e:f].g",
            "a[bc].d",
            "a]b",
        ] {
            assert!(AttributePath::parse(raw).is_err(), "expected '{}' to be rejected", raw);
        }
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(
            common_prefix(&["prices.price", "prices.currency"]).as_deref(),
            Some("prices")
        );
        assert_eq!(
            common_prefix(&["a.b.c", "a.b.d", "a.b.e.f"]).as_deref(),
            Some("a.b")
        );
        assert_eq!(common_prefix(&["type", "book.format"]), None);
        // identical paths never share a grouping root
        assert_eq!(common_prefix(&["subjects.code", "subjects.code"]), None);
        // prefix equal to one of the operands is not eligible
        assert_eq!(common_prefix(&["prices", "prices.price"]), None);
        // segment-wise, not character-wise
        assert_eq!(common_prefix(&["price.a", "prices.b"]), None);
    }

    #[test]
    fn test_ancestors_and_relative() {
        let found: Vec<&str> = ancestors("a.b.c").collect();
        assert_eq!(found, vec!["a.b", "a"]);
        assert_eq!(ancestors("a").count(), 0);
        assert_eq!(relative_to("prices.price", "prices"), "price");
        assert_eq!(relative_to("a.b.c", "a"), "b.c");
    }
}
