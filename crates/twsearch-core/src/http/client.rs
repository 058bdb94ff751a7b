//! API session: one reqwest client, one bearer token
//!
//! A [`Session`] is created once, exchanges credentials exactly once, and is
//! then shared by every fetch engine built on it. The token is never
//! refreshed; a 401 later in the run is fatal.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as ReqwestClient, Response};
use std::time::Duration;
use url::Url;

use crate::http::auth::{BearerToken, CredentialExchanger, Credentials, FORM_CONTENT_TYPE};
use crate::http::rate_limit::RateLimitInspector;
use crate::types::QueryParams;
use crate::{Error, Result};

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

pub const TOKEN_PATH: &str = "/oauth2/token";
pub const RATE_LIMIT_STATUS_PATH: &str = "/1.1/application/rate_limit_status.json";
pub const SEARCH_PATH: &str = "/1.1/search/tweets.json";
pub const SHOW_PATH: &str = "/1.1/statuses/show.json";

/// Absolute URLs of every endpoint the engine talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token: String,
    pub rate_limit_status: String,
    pub search: String,
    pub show: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::join(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    /// Derive all endpoints from a base URL such as `https://api.twitter.com`
    pub fn from_base_url(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| Error::Configuration {
            message: format!("Invalid API base URL '{}': {}", base_url, e),
            source: Some(e.into()),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Unsupported scheme '{}' in API base URL",
                parsed.scheme()
            )));
        }
        Ok(Self::join(base_url))
    }

    fn join(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            token: format!("{}{}", base, TOKEN_PATH),
            rate_limit_status: format!("{}{}", base, RATE_LIMIT_STATUS_PATH),
            search: format!("{}{}", base, SEARCH_PATH),
            show: format!("{}{}", base, SHOW_PATH),
        }
    }
}

/// Configuration for the API session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent on every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub endpoints: Endpoints,
    /// Safety margin added to rate limit reset waits
    pub reset_margin: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Twitter-Search 2.0".to_string(),
            timeout: Duration::from_secs(10),
            endpoints: Endpoints::default(),
            reset_margin: crate::http::rate_limit::DEFAULT_RESET_MARGIN,
        }
    }
}

impl ClientConfig {
    /// User agent built from an application name and version
    pub fn with_app(mut self, name: &str, version: &str) -> Self {
        self.user_agent = format!("{} {}", name, version);
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.endpoints = Endpoints::from_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reset_margin(mut self, margin: Duration) -> Self {
        self.reset_margin = margin;
        self
    }
}

/// Authenticated connection to the API
#[derive(Debug, Clone)]
pub struct Session {
    client: ReqwestClient,
    bearer: BearerToken,
    config: ClientConfig,
    inspector: RateLimitInspector,
}

impl Session {
    /// Build the HTTP client and exchange credentials for a bearer token
    pub async fn connect(config: ClientConfig, credentials: &Credentials) -> Result<Self> {
        let client = build_client(&config)?;
        let exchanger = CredentialExchanger::new(
            client.clone(),
            config.endpoints.token.clone(),
            config.user_agent.clone(),
        );
        let bearer = exchanger.exchange_credentials(credentials).await?;
        tracing::debug!(user_agent = %config.user_agent, "Bearer token acquired");
        Ok(Self::assemble(client, bearer, config))
    }

    /// Reuse a token obtained elsewhere
    pub fn with_bearer(config: ClientConfig, bearer: BearerToken) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self::assemble(client, bearer, config))
    }

    fn assemble(client: ReqwestClient, bearer: BearerToken, config: ClientConfig) -> Self {
        let inspector = RateLimitInspector::new(
            client.clone(),
            config.endpoints.rate_limit_status.clone(),
            config.user_agent.clone(),
        )
        .with_reset_margin(config.reset_margin);
        Self {
            client,
            bearer,
            config,
            inspector,
        }
    }

    pub fn bearer(&self) -> &BearerToken {
        &self.bearer
    }

    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.config.endpoints
    }

    pub fn rate_limits(&self) -> &RateLimitInspector {
        &self.inspector
    }

    /// Issue one authenticated GET
    pub async fn get(&self, url: &str, params: &QueryParams) -> std::result::Result<Response, reqwest::Error> {
        tracing::debug!(url, params = %params, "GET");
        self.client
            .get(url)
            .header(AUTHORIZATION, self.bearer.authorization())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(USER_AGENT, &self.config.user_agent)
            .query(params.as_pairs())
            .send()
            .await
    }
}

fn build_client(config: &ClientConfig) -> Result<ReqwestClient> {
    ReqwestClient::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::Http {
            message: format!("Failed to create HTTP client: {}", e),
            status_code: None,
            source: Some(e.into()),
        })
}
