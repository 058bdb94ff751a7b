//! What a fetch engine talks to: endpoint, quota resource, default parameters

use crate::http::Endpoints;
use crate::types::QueryParams;

pub const SEARCH_FAMILY: &str = "search";
pub const SEARCH_RESOURCE: &str = "/search/tweets";
pub const SHOW_FAMILY: &str = "statuses";
pub const SHOW_RESOURCE: &str = "statuses/show";

/// Endpoint plus the rate limit resource it is billed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub endpoint: String,
    pub resource_family: String,
    pub resource: String,
    /// Parameters sent unless the caller overrides them
    pub default_params: QueryParams,
}

impl FetchTarget {
    pub fn new(
        endpoint: impl Into<String>,
        resource_family: impl Into<String>,
        resource: impl Into<String>,
        default_params: QueryParams,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            resource_family: resource_family.into(),
            resource: resource.into(),
            default_params,
        }
    }

    /// Standard search, most recent first, untruncated text
    pub fn search(endpoints: &Endpoints) -> Self {
        Self::new(
            endpoints.search.clone(),
            SEARCH_FAMILY,
            SEARCH_RESOURCE,
            QueryParams::new()
                .with("result_type", "recent")
                .with("tweet_mode", "extended"),
        )
    }

    /// Single tweet by id
    pub fn show(endpoints: &Endpoints) -> Self {
        Self::new(
            endpoints.show.clone(),
            SHOW_FAMILY,
            SHOW_RESOURCE,
            QueryParams::new().with("tweet_mode", "extended"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_target() {
        let target = FetchTarget::search(&Endpoints::default());
        assert_eq!(target.resource_family, "search");
        assert_eq!(target.resource, "/search/tweets");
        assert_eq!(target.default_params.get("tweet_mode"), Some("extended"));
        assert_eq!(target.default_params.get("result_type"), Some("recent"));
    }

    #[test]
    fn test_show_target() {
        let target = FetchTarget::show(&Endpoints::default());
        assert!(target.endpoint.ends_with("/1.1/statuses/show.json"));
        assert_eq!(target.resource, "statuses/show");
        assert!(!target.default_params.contains("result_type"));
    }
}
