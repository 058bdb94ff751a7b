//! Fetch state threaded through every pagination step

use std::collections::HashSet;
use std::time::Duration;

use crate::types::Tweet;

/// API page-size ceiling
pub const MAX_COUNT: u32 = 100;

/// Clamp a requested page size into `[0, MAX_COUNT]`
pub fn clamp_count(count: i64) -> u32 {
    count.clamp(0, i64::from(MAX_COUNT)) as u32
}

/// Caller-imposed cap on tweets yielded in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayBudget {
    Unbounded,
    Remaining(u64),
}

impl DisplayBudget {
    /// Negative `dispcount` means unbounded
    pub fn from_dispcount(dispcount: i64) -> Self {
        match u64::try_from(dispcount) {
            Ok(n) => DisplayBudget::Remaining(n),
            Err(_) => DisplayBudget::Unbounded,
        }
    }

    /// Page size for the next request: clamped, then capped by what is left
    pub fn page_size(&self, requested: i64) -> u32 {
        let count = clamp_count(requested);
        match self {
            DisplayBudget::Unbounded => count,
            DisplayBudget::Remaining(left) => count.min(u32::try_from(*left).unwrap_or(u32::MAX)),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, DisplayBudget::Remaining(0))
    }

    fn consume(&mut self) {
        if let DisplayBudget::Remaining(left) = self {
            *left = left.saturating_sub(1);
        }
    }
}

/// Mutable state of one paginated fetch
#[derive(Debug, Clone)]
pub struct FetchState {
    /// Consecutive transient failures
    pub retry: u32,
    /// Lowest tweet id yielded so far; results arrive newest first
    pub oldest_seen_id: Option<u64>,
    pub budget: DisplayBudget,
    /// Page size the caller asked for, before clamping
    pub requested_count: i64,
    seen: HashSet<u64>,
}

impl FetchState {
    pub fn new(requested_count: i64, dispcount: i64) -> Self {
        Self {
            retry: 0,
            oldest_seen_id: None,
            budget: DisplayBudget::from_dispcount(dispcount),
            requested_count,
            seen: HashSet::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.budget.page_size(self.requested_count)
    }

    /// Accept a tweet for yielding.
    ///
    /// Rejects it when the budget is spent or its id was already yielded.
    pub fn admit(&mut self, tweet: &Tweet) -> bool {
        if self.budget.is_exhausted() {
            return false;
        }
        if let Some(id) = tweet.id() {
            if !self.seen.insert(id) {
                tracing::debug!(id, "Skipping tweet already yielded");
                return false;
            }
            self.oldest_seen_id = Some(self.oldest_seen_id.map_or(id, |old| old.min(id)));
        }
        self.budget.consume();
        true
    }

    /// Upper id bound for the next request
    pub fn next_max_id(&self) -> Option<u64> {
        self.oldest_seen_id.map(|id| id.saturating_sub(1))
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub requests: u64,
    pub pages: u64,
    pub tweets: u64,
    pub transient_failures: u64,
    pub rate_limit_waits: u64,
    pub waited: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn tweet(id: u64) -> Tweet {
        Tweet::new(json!({"id": id}))
    }

    #[test]
    fn test_negative_dispcount_is_unbounded() {
        assert_eq!(DisplayBudget::from_dispcount(-1), DisplayBudget::Unbounded);
        assert_eq!(DisplayBudget::from_dispcount(0), DisplayBudget::Remaining(0));
        assert!(DisplayBudget::from_dispcount(0).is_exhausted());
    }

    #[test]
    fn test_page_size_capped_by_budget() {
        assert_eq!(DisplayBudget::Remaining(30).page_size(100), 30);
        assert_eq!(DisplayBudget::Remaining(300).page_size(100), 100);
        assert_eq!(DisplayBudget::Unbounded.page_size(250), 100);
        assert_eq!(DisplayBudget::Unbounded.page_size(-4), 0);
    }

    #[test]
    fn test_admit_tracks_oldest_and_skips_duplicates() {
        let mut state = FetchState::new(100, -1);
        assert!(state.admit(&tweet(20)));
        assert!(state.admit(&tweet(15)));
        assert!(!state.admit(&tweet(20)));
        assert_eq!(state.oldest_seen_id, Some(15));
        assert_eq!(state.next_max_id(), Some(14));
    }

    #[test]
    fn test_admit_respects_budget() {
        let mut state = FetchState::new(100, 2);
        assert!(state.admit(&tweet(3)));
        assert!(state.admit(&tweet(2)));
        assert!(!state.admit(&tweet(1)));
        assert!(state.budget.is_exhausted());
        assert_eq!(state.page_size(), 0);
    }

    proptest! {
        #[test]
        fn prop_count_never_exceeds_ceiling(count in any::<i64>()) {
            prop_assert!(clamp_count(count) <= MAX_COUNT);
        }

        #[test]
        fn prop_large_counts_clamp_to_ceiling(count in 101i64..i64::MAX) {
            prop_assert_eq!(DisplayBudget::Unbounded.page_size(count), MAX_COUNT);
        }

        #[test]
        fn prop_admitted_never_exceeds_dispcount(dispcount in 0i64..50, n in 0u64..120) {
            let mut state = FetchState::new(100, dispcount);
            let admitted = (0..n).filter(|i| state.admit(&tweet(1000 - i))).count();
            prop_assert!(admitted as i64 <= dispcount);
        }
    }
}
