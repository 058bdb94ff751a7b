//! Rate limit inspection and reset waits
//!
//! The API publishes a quota window per resource family. When a request is
//! throttled the engine asks for the window and, if it is spent, sleeps until
//! the reset epoch plus a safety margin.

use std::time::Duration;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use tokio_util::sync::CancellationToken;

use crate::http::auth::BearerToken;
use crate::http::error::{ApiFailure, ClassificationResult};
use crate::http::retry::sleep_or_cancel;
use crate::types::{LimitStatus, RateLimitWindow};
use crate::{Error, Result};

/// Added on top of the reported reset time
pub const DEFAULT_RESET_MARGIN: Duration = Duration::from_secs(10);

/// Queries the rate limit status endpoint
#[derive(Debug, Clone)]
pub struct RateLimitInspector {
    client: reqwest::Client,
    status_url: String,
    user_agent: String,
    reset_margin: Duration,
}

impl RateLimitInspector {
    pub fn new(client: reqwest::Client, status_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            status_url: status_url.into(),
            user_agent: user_agent.into(),
            reset_margin: DEFAULT_RESET_MARGIN,
        }
    }

    pub fn with_reset_margin(mut self, margin: Duration) -> Self {
        self.reset_margin = margin;
        self
    }

    pub fn reset_margin(&self) -> Duration {
        self.reset_margin
    }

    /// Fetch the status body for one resource family
    pub async fn get_limit_status(&self, bearer: &BearerToken, family: &str) -> Result<LimitStatus> {
        let response = self
            .client
            .get(&self.status_url)
            .header(AUTHORIZATION, bearer.authorization())
            .header(USER_AGENT, &self.user_agent)
            .query(&[("resources", family)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Timeout while getting limit status");
                Error::LimitStatusUnavailable {
                    message: e.to_string(),
                    source: Some(e.into()),
                }
            })?;

        if !response.status().is_success() {
            let failure = ApiFailure::from_response(response).await;
            failure.dump("Cannot get Limit Status");
            return Err(match failure.classification() {
                ClassificationResult::FatalExit(_) | ClassificationResult::Unclassified => {
                    failure.into_error()
                }
                _ => Error::LimitStatusUnavailable {
                    message: failure.to_string(),
                    source: None,
                },
            });
        }

        let status: LimitStatus = response.json().await.map_err(|e| Error::LimitStatusUnavailable {
            message: format!("invalid limit status body: {}", e),
            source: Some(e.into()),
        })?;
        tracing::info!(family, status = %status.as_value(), "Limit Status");
        Ok(status)
    }

    /// Quota window for `family`/`resource`
    pub async fn window(&self, bearer: &BearerToken, family: &str, resource: &str) -> Result<RateLimitWindow> {
        let status = self.get_limit_status(bearer, family).await?;
        status
            .window(family, resource)
            .ok_or_else(|| Error::LimitStatusUnavailable {
                message: format!("no rate limit entry for {}/{}", family, resource),
                source: None,
            })
    }

    /// Sleep until the window resets if no calls remain.
    ///
    /// Returns how long it slept. A status body without an entry for the
    /// resource sleeps only the safety margin.
    pub async fn wait_for_reset(
        &self,
        bearer: &BearerToken,
        family: &str,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        let status = self.get_limit_status(bearer, family).await?;
        let sleep = match status.window(family, resource) {
            Some(window) if window.remaining == 0 => {
                sleep_duration(window.reset, now_epoch(), self.reset_margin)
            }
            Some(window) => {
                tracing::debug!(remaining = window.remaining, "Quota left, retrying without waiting");
                return Ok(Duration::ZERO);
            }
            None => {
                tracing::warn!(family, resource, "No rate limit entry for resource");
                self.reset_margin
            }
        };

        tracing::info!(sleep_secs = sleep.as_secs(), "Waiting for rate limit reset");
        sleep_or_cancel(sleep, cancel).await?;
        Ok(sleep)
    }
}

/// `reset - now + margin`, never negative
pub fn sleep_duration(reset_epoch: i64, now_epoch: i64, margin: Duration) -> Duration {
    let margin = i64::try_from(margin.as_secs()).unwrap_or(i64::MAX);
    let secs = reset_epoch.saturating_sub(now_epoch).saturating_add(margin);
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}

/// Current Unix time rounded to the nearest second
pub fn now_epoch() -> i64 {
    (chrono::Utc::now().timestamp_millis() + 500).div_euclid(1000)
}
