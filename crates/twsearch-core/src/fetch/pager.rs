//! Pull-based paginated fetch
//!
//! [`TweetPager`] is the explicit form of the fetch state machine. Each call
//! to [`TweetPager::next`] drives it through `Fetching`, `WaitingForReset`,
//! `RetryBackoff` and `AdvancingCursor` until a tweet is ready or the run
//! reaches `Done` or `Fatal`. A page is only requested once every tweet of
//! the previous page has been handed to the caller.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::fetch::cursor::next_page_params;
use crate::fetch::engine::{FetchEngine, FetchOptions, Outcome, RetryKind};
use crate::fetch::state::{FetchState, FetchStats};
use crate::http::retry::{sleep_or_cancel, RetryDecision};
use crate::types::{QueryParams, SearchMetadata, SearchPage, Tweet};
use crate::{Error, Result};

/// Where the state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchPhase {
    Fetching,
    WaitingForReset,
    RetryBackoff,
    AdvancingCursor,
    Done,
    Fatal,
}

impl FetchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchPhase::Done | FetchPhase::Fatal)
    }
}

/// Why the pager stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// `dispcount` tweets were yielded
    BudgetReached,
    /// Retries after a missing cursor ran out
    PagesExhausted,
    /// Retries after transient failures ran out
    RetriesExhausted,
    /// Dry run walked its retry loop
    DryRun,
    Fatal,
    Cancelled,
}

type Item = (Tweet, Arc<SearchMetadata>);

/// Lazy sequence of (tweet, page metadata) pairs
#[derive(Debug)]
pub struct TweetPager {
    engine: FetchEngine,
    options: FetchOptions,
    cancel: CancellationToken,
    /// Defaults merged with the caller's parameters
    base_params: QueryParams,
    /// Parameters of the next request
    params: QueryParams,
    state: FetchState,
    phase: FetchPhase,
    pending_delay: Duration,
    pending_retry: Option<RetryKind>,
    pending_cursor: Option<String>,
    buffer: VecDeque<Item>,
    stats: FetchStats,
    termination: Option<Termination>,
}

impl TweetPager {
    pub(crate) fn new(
        engine: FetchEngine,
        params: QueryParams,
        options: FetchOptions,
        cancel: CancellationToken,
    ) -> Self {
        let mut base_params = engine.target().default_params.clone();
        base_params.merge(&params);
        let requested_count = base_params
            .get_i64("count")
            .unwrap_or(i64::from(crate::fetch::state::MAX_COUNT));
        let state = FetchState::new(requested_count, options.dispcount);
        base_params.set("count", state.page_size());

        tracing::debug!(
            params = %base_params,
            retry_max = options.retry.retry_max,
            interval_secs = options.retry.interval.as_secs(),
            dispcount = options.dispcount,
            "Starting paginated fetch"
        );

        Self {
            engine,
            options,
            cancel,
            params: base_params.clone(),
            base_params,
            state,
            phase: FetchPhase::Fetching,
            pending_delay: Duration::ZERO,
            pending_retry: None,
            pending_cursor: None,
            buffer: VecDeque::new(),
            stats: FetchStats::default(),
            termination: None,
        }
    }

    /// Next (tweet, metadata) pair.
    ///
    /// `Ok(None)` ends the sequence, whether the budget was reached or
    /// retries ran out; check [`termination`](Self::termination) to tell
    /// them apart. A fatal classification is returned once as `Err`, after
    /// which the pager only yields `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<Item>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                self.stats.tweets += 1;
                return Ok(Some(item));
            }

            let step = match self.phase {
                FetchPhase::Done | FetchPhase::Fatal => return Ok(None),
                FetchPhase::Fetching => self.fetch_page().await,
                FetchPhase::WaitingForReset => self.wait_for_reset().await,
                FetchPhase::RetryBackoff => self.back_off().await,
                FetchPhase::AdvancingCursor => self.advance_cursor(),
            };
            if let Err(e) = step {
                return Err(self.fail(e));
            }
        }
    }

    /// Drain the remaining sequence into a vector
    pub async fn collect(mut self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub fn retry_count(&self) -> u32 {
        self.state.retry
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Parameters the next request will carry
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    async fn fetch_page(&mut self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let count = self.state.page_size();
        if count == 0 {
            tracing::debug!("Display budget spent");
            self.finish(Termination::BudgetReached);
            return Ok(());
        }
        self.params.set("count", count);

        if self.options.dry_run {
            tracing::info!(params = %self.params, retry = self.state.retry, "dryrun, skipping request");
            self.schedule_retry(RetryKind::Transport, Termination::DryRun);
            if !self.phase.is_terminal() {
                self.pending_delay = Duration::ZERO;
            }
            return Ok(());
        }

        self.stats.requests += 1;
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => None,
            outcome = self.engine.attempt(&self.params) => Some(outcome),
        };
        let Some(outcome) = outcome else {
            return Err(Error::Cancelled);
        };

        match outcome {
            Outcome::Success(body) => self.receive(&body),
            Outcome::Wait => {
                self.phase = FetchPhase::WaitingForReset;
                Ok(())
            }
            Outcome::Retry(kind) => {
                self.schedule_retry(kind, Termination::RetriesExhausted);
                Ok(())
            }
            Outcome::Fatal(e) => Err(e),
        }
    }

    /// Buffer a successful page and decide what follows it
    fn receive(&mut self, body: &Value) -> Result<()> {
        let Some(page) = SearchPage::from_body(body) else {
            tracing::info!(body = %body, "'search_metadata' is missing or malformed");
            self.schedule_retry(RetryKind::MalformedPage, Termination::RetriesExhausted);
            return Ok(());
        };

        self.stats.pages += 1;
        let metadata = Arc::new(page.metadata);
        for tweet in page.statuses {
            if self.state.admit(&tweet) {
                self.buffer.push_back((tweet, Arc::clone(&metadata)));
            }
        }
        tracing::debug!(
            buffered = self.buffer.len(),
            oldest_seen_id = ?self.state.oldest_seen_id,
            "Page received"
        );

        if self.state.budget.is_exhausted() {
            self.finish(Termination::BudgetReached);
            return Ok(());
        }

        match metadata.next_results.as_deref() {
            Some(cursor) => {
                tracing::debug!(next_results = cursor, "next_results exists");
                self.pending_cursor = Some(cursor.to_string());
                self.state.retry = 0;
                self.phase = FetchPhase::AdvancingCursor;
            }
            None => {
                // Re-issue the base query below everything already yielded
                self.params = self.base_params.clone();
                if let Some(max_id) = self.state.next_max_id() {
                    self.params.set("max_id", max_id);
                }
                self.schedule_retry(RetryKind::MissingCursor, Termination::PagesExhausted);
            }
        }
        Ok(())
    }

    fn advance_cursor(&mut self) -> Result<()> {
        let Some(cursor) = self.pending_cursor.take() else {
            self.phase = FetchPhase::Fetching;
            return Ok(());
        };
        let count = self.state.page_size();
        if count == 0 {
            self.finish(Termination::BudgetReached);
            return Ok(());
        }
        self.params = next_page_params(
            &cursor,
            count,
            self.state.next_max_id(),
            &self.engine.target().default_params,
        )?;
        tracing::debug!(params = %self.params, "Advancing cursor");
        self.phase = FetchPhase::Fetching;
        Ok(())
    }

    async fn wait_for_reset(&mut self) -> Result<()> {
        self.stats.rate_limit_waits += 1;
        match self.engine.wait_for_reset(&self.cancel).await {
            Ok(slept) => {
                self.stats.waited += slept;
                self.state.retry = 0;
                self.phase = FetchPhase::Fetching;
                Ok(())
            }
            Err(Error::LimitStatusUnavailable { message, .. }) => {
                tracing::warn!(%message, "Limit status unavailable while throttled");
                self.schedule_retry(RetryKind::Transport, Termination::RetriesExhausted);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn back_off(&mut self) -> Result<()> {
        let delay = std::mem::take(&mut self.pending_delay);
        if let Some(kind) = self.pending_retry.take() {
            tracing::info!(
                retry = self.state.retry,
                retry_max = self.options.retry.retry_max,
                delay_ms = delay.as_millis() as u64,
                ?kind,
                "retrying, sleep well..."
            );
        }
        sleep_or_cancel(delay, &self.cancel).await?;
        self.stats.waited += delay;
        self.phase = FetchPhase::Fetching;
        Ok(())
    }

    /// Count a transient failure; stop with `exhausted` once over budget
    fn schedule_retry(&mut self, kind: RetryKind, exhausted: Termination) {
        if !matches!(kind, RetryKind::MissingCursor) {
            self.stats.transient_failures += 1;
        }
        match self.options.retry.next_attempt(&mut self.state.retry, kind.scale()) {
            RetryDecision::Retry { delay } => {
                self.pending_delay = delay;
                self.pending_retry = Some(kind);
                self.phase = FetchPhase::RetryBackoff;
            }
            RetryDecision::Exhausted => {
                tracing::info!(retry = self.state.retry, ?kind, "Retry budget spent, stopping");
                self.state.retry = self.options.retry.retry_max;
                self.finish(exhausted);
            }
        }
    }

    fn finish(&mut self, termination: Termination) {
        tracing::debug!(?termination, stats = ?self.stats, "Fetch finished");
        self.phase = FetchPhase::Done;
        self.termination = Some(termination);
    }

    fn fail(&mut self, error: Error) -> Error {
        let termination = match error {
            Error::Cancelled => Termination::Cancelled,
            _ => Termination::Fatal,
        };
        self.phase = FetchPhase::Fatal;
        self.termination = Some(termination);
        self.buffer.clear();
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::auth::BearerToken;
    use crate::http::retry::RetryPolicy;
    use crate::http::{ClientConfig, Session};

    fn offline_engine() -> FetchEngine {
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .unwrap();
        let session = Session::with_bearer(config, BearerToken::new("t")).unwrap();
        FetchEngine::search(Arc::new(session))
    }

    #[test]
    fn test_count_clamped_at_construction() {
        let pager = offline_engine().generate(
            QueryParams::new().with("q", "rust").with("count", 500),
            FetchOptions::default(),
            CancellationToken::new(),
        );
        assert_eq!(pager.params().get("count"), Some("100"));
        assert_eq!(pager.params().get("tweet_mode"), Some("extended"));
        assert_eq!(pager.phase(), FetchPhase::Fetching);
    }

    #[tokio::test]
    async fn test_dry_run_never_sends() {
        let mut pager = offline_engine().generate(
            QueryParams::new().with("q", "rust"),
            FetchOptions::default()
                .with_dry_run(true)
                .with_retry(RetryPolicy::new(3)),
            CancellationToken::new(),
        );
        assert!(pager.next().await.unwrap().is_none());
        assert_eq!(pager.termination(), Some(Termination::DryRun));
        assert_eq!(pager.stats().requests, 0);
        assert_eq!(pager.retry_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_dispcount_ends_without_request() {
        let mut pager = offline_engine().generate(
            QueryParams::new().with("q", "rust"),
            FetchOptions::default().with_dispcount(0),
            CancellationToken::new(),
        );
        assert!(pager.next().await.unwrap().is_none());
        assert_eq!(pager.termination(), Some(Termination::BudgetReached));
        assert_eq!(pager.stats().requests, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut pager = offline_engine().generate(
            QueryParams::new().with("q", "rust"),
            FetchOptions::default(),
            cancel,
        );
        assert!(matches!(pager.next().await, Err(Error::Cancelled)));
        assert_eq!(pager.termination(), Some(Termination::Cancelled));
        assert!(pager.next().await.unwrap().is_none());
    }
}
