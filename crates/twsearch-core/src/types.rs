//! Core data types for twsearch
//!
//! Tweets are kept as raw JSON so nothing the API returns is lost on the way
//! to the sinks; typed accessors cover the fields the engine and sinks read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{Error, Result};

/// A single tweet object as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tweet(Value);

impl Tweet {
    /// Wrap a raw tweet object
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Numeric tweet id, falling back to `id_str`
    pub fn id(&self) -> Option<u64> {
        self.0
            .get("id")
            .and_then(Value::as_u64)
            .or_else(|| self.0.get("id_str").and_then(Value::as_str)?.parse().ok())
    }

    /// Tweet id as a string
    pub fn id_str(&self) -> Option<String> {
        match self.0.get("id_str").and_then(Value::as_str) {
            Some(id) => Some(id.to_string()),
            None => self.id().map(|id| id.to_string()),
        }
    }

    pub fn created_at(&self) -> Option<&str> {
        self.0.get("created_at").and_then(Value::as_str)
    }

    /// Tweet body: `full_text` in extended mode, `text` otherwise
    pub fn text(&self) -> &str {
        self.0
            .get("full_text")
            .or_else(|| self.0.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Long-form text from compatibility-mode payloads
    pub fn extended_text(&self) -> Option<&str> {
        self.0
            .get("extended_tweet")
            .and_then(|ext| ext.get("full_text"))
            .and_then(Value::as_str)
    }

    /// Hashtag texts from `entities.hashtags`
    pub fn hashtags(&self) -> Vec<&str> {
        self.0
            .get("entities")
            .and_then(|e| e.get("hashtags"))
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn user_field(&self, key: &str) -> Option<&Value> {
        self.0.get("user").and_then(|user| user.get(key))
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_field("id").and_then(Value::as_u64)
    }

    pub fn user_id_str(&self) -> Option<&str> {
        self.user_field("id_str").and_then(Value::as_str)
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_field("name").and_then(Value::as_str)
    }

    pub fn screen_name(&self) -> Option<&str> {
        self.user_field("screen_name").and_then(Value::as_str)
    }

    /// Canonical link to the tweet on the web
    pub fn permalink(&self) -> Option<String> {
        let screen_name = self.screen_name()?;
        let id = self.id_str()?;
        Some(format!("https://twitter.com/{}/status/{}", screen_name, id))
    }

    /// Borrow the raw JSON object
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Tweet {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Page-level metadata attached to every search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_id: Option<u64>,
    /// Query-string fragment (starting with `?`) pointing at the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_results: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Any other fields the API sends
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchMetadata {
    pub fn has_next(&self) -> bool {
        self.next_results.is_some()
    }
}

/// One search response: tweets plus the page metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub statuses: Vec<Tweet>,
    pub metadata: SearchMetadata,
}

impl SearchPage {
    /// Parse a search response body.
    ///
    /// Returns `None` when the `search_metadata` envelope is missing or has
    /// the wrong shape, which the engine treats as a transient condition.
    pub fn from_body(body: &Value) -> Option<Self> {
        let metadata = body.get("search_metadata")?;
        let metadata: SearchMetadata = match serde_json::from_value(metadata.clone()) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::info!(error = %e, "'search_metadata' is malformed");
                return None;
            }
        };
        let statuses = body
            .get("statuses")
            .and_then(Value::as_array)
            .map(|items| items.iter().cloned().map(Tweet::new).collect())
            .unwrap_or_default();
        Some(Self { statuses, metadata })
    }
}

/// Insertion-ordered query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a parameter
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Overwrite an existing parameter; fails when the key is unknown
    pub fn replace(&mut self, key: &str, value: impl ToString) -> Result<()> {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => {
                entry.1 = value.to_string();
                Ok(())
            }
            None => Err(Error::config(format!("{} does not exist.", key))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a parameter as an integer
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.parse().ok()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Overlay `other` on top of these parameters
    pub fn merge(&mut self, other: &QueryParams) {
        for (key, value) in &other.entries {
            self.set(key.clone(), value);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs in the shape `reqwest::RequestBuilder::query` expects
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.entries
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.entries.iter())
            .finish();
        write!(f, "{}", encoded)
    }
}

/// Quota window for one API resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub limit: u64,
    pub remaining: u64,
    /// Unix epoch second at which the window resets
    pub reset: i64,
}

/// Body of the rate limit status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LimitStatus(Value);

impl LimitStatus {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up `resources.<family>.<resource>`
    pub fn window(&self, family: &str, resource: &str) -> Option<RateLimitWindow> {
        let entry = self.0.get("resources")?.get(family)?.get(resource)?;
        serde_json::from_value(entry.clone()).ok()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tweet() -> Tweet {
        Tweet::new(json!({
            "created_at": "Thu Jun 04 01:00:01 +0000 2020",
            "id": 1268346734951964672u64,
            "id_str": "1268346734951964672",
            "full_text": "logo #logo",
            "entities": {"hashtags": [{"text": "ロゴ"}, {"text": "logo"}]},
            "user": {"id": 14963504, "id_str": "14963504", "name": "Ika", "screen_name": "Ikarashi"}
        }))
    }

    #[test]
    fn test_tweet_accessors() {
        let tweet = sample_tweet();
        assert_eq!(tweet.id(), Some(1268346734951964672));
        assert_eq!(tweet.id_str().as_deref(), Some("1268346734951964672"));
        assert_eq!(tweet.text(), "logo #logo");
        assert_eq!(tweet.hashtags(), vec!["ロゴ", "logo"]);
        assert_eq!(tweet.user_id(), Some(14963504));
        assert_eq!(tweet.user_id_str(), Some("14963504"));
        assert_eq!(
            tweet.permalink().as_deref(),
            Some("https://twitter.com/Ikarashi/status/1268346734951964672")
        );
        assert_eq!(tweet.extended_text(), None);
    }

    #[test]
    fn test_text_falls_back_to_text_field() {
        let tweet = Tweet::new(json!({"id_str": "5", "text": "short"}));
        assert_eq!(tweet.text(), "short");
        assert_eq!(tweet.id(), Some(5));
    }

    #[test]
    fn test_search_page_requires_envelope() {
        let body = json!({"statuses": []});
        assert!(SearchPage::from_body(&body).is_none());

        let body = json!({
            "statuses": [{"id": 2}, {"id": 1}],
            "search_metadata": {"max_id": 2, "next_results": "?max_id=0&q=a&count=2", "refresh_url": "?since_id=2"}
        });
        let page = SearchPage::from_body(&body).unwrap();
        assert_eq!(page.statuses.len(), 2);
        assert!(page.metadata.has_next());
        assert_eq!(page.metadata.extra["refresh_url"], "?since_id=2");
    }

    #[test]
    fn test_search_page_rejects_malformed_metadata() {
        let body = json!({"statuses": [], "search_metadata": null});
        assert!(SearchPage::from_body(&body).is_none());

        let body = json!({"statuses": [{"id": 1}], "search_metadata": {"max_id": "oops"}});
        assert!(SearchPage::from_body(&body).is_none());
    }

    #[test]
    fn test_query_params_keep_order_and_overwrite() {
        let mut params = QueryParams::new().with("q", "rust").with("count", 100);
        params.set("result_type", "recent");
        params.set("count", 20);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["q", "count", "result_type"]);
        assert_eq!(params.get_i64("count"), Some(20));
    }

    #[test]
    fn test_query_params_replace_requires_key() {
        let mut params = QueryParams::new().with("count", 100);
        assert!(params.replace("count", 10).is_ok());
        assert!(matches!(
            params.replace("max_id", 5),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_query_params_merge_and_display() {
        let mut defaults = QueryParams::new().with("tweet_mode", "extended");
        let caller = QueryParams::new().with("q", "a b").with("tweet_mode", "compat");
        defaults.merge(&caller);
        assert_eq!(defaults.to_string(), "tweet_mode=compat&q=a+b");
    }

    #[test]
    fn test_limit_status_window() {
        let status = LimitStatus::new(json!({
            "resources": {"search": {"/search/tweets": {"limit": 450, "remaining": 447, "reset": 1591085881}}}
        }));
        let window = status.window("search", "/search/tweets").unwrap();
        assert_eq!(window.remaining, 447);
        assert_eq!(window.reset, 1591085881);
        assert!(status.window("statuses", "statuses/show").is_none());
    }
}
