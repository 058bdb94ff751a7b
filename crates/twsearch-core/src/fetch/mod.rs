//! Tweet fetch engine
//!
//! - [`FetchEngine`]: single-tweet fetch and paginated search over one [`Session`](crate::http::Session)
//! - [`TweetPager`]: the paginated fetch as an explicit state machine
//! - [`FetchState`]: retry counter, upper-id bound and display budget

pub mod cursor;
pub mod engine;
pub mod pager;
pub mod state;
pub mod target;

pub use engine::{FetchEngine, FetchOptions};
pub use pager::{FetchPhase, Termination, TweetPager};
pub use state::{clamp_count, DisplayBudget, FetchState, FetchStats, MAX_COUNT};
pub use target::FetchTarget;
