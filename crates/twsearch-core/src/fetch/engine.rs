//! The tweet fetch engine
//!
//! One [`FetchEngine`] type serves both the search endpoint and the by-id
//! endpoint; the [`FetchTarget`] it is built with decides which. Every HTTP
//! attempt goes through [`FetchEngine::attempt`], so the single-tweet fetch
//! and the paginated fetch react to failures through the same classifier.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::fetch::pager::TweetPager;
use crate::fetch::target::FetchTarget;
use crate::http::error::{ApiFailure, ClassificationResult};
use crate::http::retry::{sleep_or_cancel, BackoffScale, RetryDecision, RetryPolicy};
use crate::http::Session;
use crate::types::{QueryParams, Tweet};
use crate::{Error, Result};

/// Knobs for one paginated fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub retry: RetryPolicy,
    /// Cap on tweets yielded; negative means unbounded
    pub dispcount: i64,
    /// Walk the retry loop without sending requests
    pub dry_run: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            dispcount: -1,
            dry_run: false,
        }
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_dispcount(mut self, dispcount: i64) -> Self {
        self.dispcount = dispcount;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Which transient condition triggered a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryKind {
    /// No response at all
    Transport,
    /// 5xx or a 403 without a fatal code
    Status(u16),
    /// 2xx whose body lacks the expected envelope
    MalformedPage,
    /// Search page without `next_results`
    MissingCursor,
}

impl RetryKind {
    pub(crate) fn scale(self) -> BackoffScale {
        match self {
            RetryKind::Transport | RetryKind::Status(_) => BackoffScale::Fixed,
            RetryKind::MalformedPage | RetryKind::MissingCursor => BackoffScale::Linear,
        }
    }
}

/// Result of one HTTP attempt after classification
#[derive(Debug)]
pub(crate) enum Outcome {
    Success(Value),
    Wait,
    Retry(RetryKind),
    Fatal(Error),
}

/// Sequential fetcher bound to one endpoint
#[derive(Debug, Clone)]
pub struct FetchEngine {
    session: Arc<Session>,
    target: FetchTarget,
}

impl FetchEngine {
    pub fn new(session: Arc<Session>, target: FetchTarget) -> Self {
        Self { session, target }
    }

    /// Engine for the search endpoint
    pub fn search(session: Arc<Session>) -> Self {
        let target = FetchTarget::search(session.endpoints());
        Self::new(session, target)
    }

    /// Engine for the by-id endpoint
    pub fn show(session: Arc<Session>) -> Self {
        let target = FetchTarget::show(session.endpoints());
        Self::new(session, target)
    }

    pub fn target(&self) -> &FetchTarget {
        &self.target
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch one tweet by id.
    ///
    /// Throttling waits for the quota reset and does not count against the
    /// retry budget; transient failures sleep `interval` and retry until
    /// `retry_max` is exceeded, which yields [`Error::RetryExhausted`].
    pub async fn get_one_tweet(
        &self,
        id: &str,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Tweet> {
        let mut params = self.target.default_params.clone();
        params.set("id", id);
        let mut retry = 0u32;

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.attempt(&params) => outcome,
            };
            match outcome {
                Outcome::Success(body) if body.is_object() => {
                    tracing::debug!(id, "Tweet received");
                    return Ok(Tweet::new(body));
                }
                Outcome::Success(_) => {
                    self.back_off(policy, &mut retry, RetryKind::MalformedPage, cancel)
                        .await?
                }
                Outcome::Wait => match self.wait_for_reset(cancel).await {
                    Ok(_) => retry = 0,
                    Err(Error::LimitStatusUnavailable { message, .. }) => {
                        tracing::warn!(%message, "Limit status unavailable while throttled");
                        self.back_off(policy, &mut retry, RetryKind::Transport, cancel)
                            .await?
                    }
                    Err(e) => return Err(e),
                },
                Outcome::Retry(kind) => self.back_off(policy, &mut retry, kind, cancel).await?,
                Outcome::Fatal(e) => return Err(e),
            }
        }
    }

    /// Start a paginated fetch.
    ///
    /// Caller parameters are laid over the target's defaults. Nothing is
    /// sent until the pager is first polled.
    pub fn generate(
        &self,
        params: QueryParams,
        options: FetchOptions,
        cancel: CancellationToken,
    ) -> TweetPager {
        TweetPager::new(self.clone(), params, options, cancel)
    }

    /// Issue one GET and classify what came back
    pub(crate) async fn attempt(&self, params: &QueryParams) -> Outcome {
        let response = match self.session.get(&self.target.endpoint, params).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(error = %e, "Request failed");
                return Outcome::Retry(RetryKind::Transport);
            }
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<Value>().await {
                Ok(body) => Outcome::Success(body),
                Err(e) => {
                    tracing::info!(error = %e, "Response body is not JSON");
                    Outcome::Retry(RetryKind::MalformedPage)
                }
            };
        }

        let failure = ApiFailure::from_response(response).await;
        match failure.classification() {
            ClassificationResult::WaitForReset => {
                tracing::info!(status_code = failure.status_code, message = %failure.message, "Rate limited");
                Outcome::Wait
            }
            ClassificationResult::Retry => {
                tracing::info!(status_code = failure.status_code, message = %failure.message, "Transient HTTP error");
                Outcome::Retry(RetryKind::Status(failure.status_code))
            }
            // Continue only covers 2xx, which never reaches here
            ClassificationResult::FatalExit(_)
            | ClassificationResult::Unclassified
            | ClassificationResult::Continue => {
                failure.dump("HTTP Error");
                Outcome::Fatal(failure.into_error())
            }
        }
    }

    /// Sleep until the target's quota window resets
    pub(crate) async fn wait_for_reset(&self, cancel: &CancellationToken) -> Result<Duration> {
        self.session
            .rate_limits()
            .wait_for_reset(
                self.session.bearer(),
                &self.target.resource_family,
                &self.target.resource,
                cancel,
            )
            .await
    }

    async fn back_off(
        &self,
        policy: &RetryPolicy,
        retry: &mut u32,
        kind: RetryKind,
        cancel: &CancellationToken,
    ) -> Result<()> {
        match policy.next_attempt(retry, kind.scale()) {
            RetryDecision::Retry { delay } => {
                tracing::info!(
                    retry = *retry,
                    retry_max = policy.retry_max,
                    delay_ms = delay.as_millis() as u64,
                    ?kind,
                    "retrying, sleep well..."
                );
                sleep_or_cancel(delay, cancel).await
            }
            RetryDecision::Exhausted => Err(Error::RetryExhausted { attempts: *retry }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{BearerToken, ClientConfig};

    #[test]
    fn test_default_options() {
        let options = FetchOptions::default();
        assert_eq!(options.dispcount, -1);
        assert!(!options.dry_run);
        assert_eq!(options.retry.retry_max, 5);
    }

    #[test]
    fn test_retry_kind_scale() {
        assert_eq!(RetryKind::Transport.scale(), BackoffScale::Fixed);
        assert_eq!(RetryKind::Status(503).scale(), BackoffScale::Fixed);
        assert_eq!(RetryKind::MalformedPage.scale(), BackoffScale::Linear);
        assert_eq!(RetryKind::MissingCursor.scale(), BackoffScale::Linear);
    }

    #[tokio::test]
    async fn test_transport_failure_uses_retry_budget() {
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        let session = Session::with_bearer(config, BearerToken::new("t")).unwrap();
        let engine = FetchEngine::show(Arc::new(session));
        let policy = RetryPolicy::new(1).with_interval(Duration::ZERO);

        let err = engine
            .get_one_tweet("1", &policy, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetryExhausted { attempts: 2 }), "{err:?}");
    }
}
