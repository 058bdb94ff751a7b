//! `next_results` cursor handling
//!
//! The search API hands back the next page as a literal query string such as
//! `?max_id=1266&q=rust&count=100&include_entities=1`. Before following it the
//! engine rewrites the embedded page size and applies its own upper-id bound.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::QueryParams;
use crate::{Error, Result};

static COUNT_TOKEN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

fn count_token() -> Result<&'static Regex> {
    COUNT_TOKEN
        .get_or_init(|| Regex::new(r"([?&])count=\d+"))
        .as_ref()
        .map_err(|e| Error::Internal {
            message: "count token pattern failed to compile".to_string(),
            source: anyhow::anyhow!(e.to_string()),
        })
}

/// Replace the `count=N` token in a cursor, appending one if absent
pub fn rewrite_count(cursor: &str, count: u32) -> Result<String> {
    let pattern = count_token()?;
    if pattern.is_match(cursor) {
        let replacement = format!("${{1}}count={}", count);
        return Ok(pattern.replace(cursor, replacement.as_str()).into_owned());
    }
    let separator = if cursor.is_empty() || cursor == "?" {
        ""
    } else {
        "&"
    };
    let prefix = if cursor.starts_with('?') { "" } else { "?" };
    Ok(format!("{}{}{}count={}", prefix, cursor, separator, count))
}

/// Decode a cursor fragment into ordered parameters
pub fn cursor_params(cursor: &str) -> QueryParams {
    let query = cursor.trim_start_matches('?');
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Parameters for the page a cursor points at.
///
/// Defaults missing from the cursor (the API drops `tweet_mode`) are
/// restored, and `max_id` is forced to `max_id` when the engine has one.
pub fn next_page_params(
    cursor: &str,
    count: u32,
    max_id: Option<u64>,
    defaults: &QueryParams,
) -> Result<QueryParams> {
    let rewritten = rewrite_count(cursor, count)?;
    let from_cursor = cursor_params(&rewritten);

    let mut params = defaults.clone();
    params.merge(&from_cursor);
    if let Some(max_id) = max_id {
        params.set("max_id", max_id);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_embedded_count() {
        let cursor = "?max_id=1266&q=%23rust&count=100&include_entities=1";
        assert_eq!(
            rewrite_count(cursor, 15).unwrap(),
            "?max_id=1266&q=%23rust&count=15&include_entities=1"
        );
    }

    #[test]
    fn test_rewrite_leading_count() {
        assert_eq!(rewrite_count("?count=100&q=a", 7).unwrap(), "?count=7&q=a");
    }

    #[test]
    fn test_rewrite_appends_missing_count() {
        assert_eq!(rewrite_count("?q=a", 3).unwrap(), "?q=a&count=3");
        assert_eq!(rewrite_count("", 3).unwrap(), "?count=3");
        // a longer key ending in count is not the page-size token
        assert_eq!(
            rewrite_count("?q=a&maxcount=9", 3).unwrap(),
            "?q=a&maxcount=9&count=3"
        );
    }

    #[test]
    fn test_cursor_params_decode() {
        let params = cursor_params("?max_id=10&q=%23rust+lang&count=5");
        assert_eq!(params.get("q"), Some("#rust lang"));
        assert_eq!(params.get_i64("max_id"), Some(10));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_next_page_params_restore_defaults_and_bound() {
        let defaults = QueryParams::new()
            .with("result_type", "recent")
            .with("tweet_mode", "extended");
        let params = next_page_params("?max_id=99&q=a&count=100", 20, Some(41), &defaults).unwrap();
        assert_eq!(params.get("tweet_mode"), Some("extended"));
        assert_eq!(params.get("count"), Some("20"));
        assert_eq!(params.get("max_id"), Some("41"));
        assert_eq!(params.get("q"), Some("a"));
    }

    #[test]
    fn test_next_page_params_keep_cursor_bound_without_own() {
        let params = next_page_params("?max_id=99&q=a", 5, None, &QueryParams::new()).unwrap();
        assert_eq!(params.get("max_id"), Some("99"));
        assert_eq!(params.get("count"), Some("5"));
    }
}
