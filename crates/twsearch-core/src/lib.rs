//! twsearch core - sequential tweet fetching over a paginated search API
//!
//! This crate exchanges consumer credentials for a bearer token, drives the
//! cursor-paginated search (or a single lookup by id) through retry and
//! rate-limit waits, and hands each tweet to a result sink.
//!
//! # Main Components
//!
//! - **HTTP layer**: credential exchange, error classification, rate limit inspection
//! - **Fetch engine**: single-tweet fetch and the [`TweetPager`] state machine
//! - **Sinks**: CSV and JSON writers plus the resume-marker store
//! - **Dates**: `created_at` conversions used by the sinks
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use twsearch_core::{ClientConfig, Credentials, FetchEngine, FetchOptions, QueryParams, Result, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() -> Result<()> {
//!     let session = Session::connect(ClientConfig::default(), &Credentials::new("key", "secret")).await?;
//!     let engine = FetchEngine::search(Arc::new(session));
//!     let mut pager = engine.generate(
//!         QueryParams::new().with("q", "#rust"),
//!         FetchOptions::default().with_dispcount(10),
//!         CancellationToken::new(),
//!     );
//!     while let Some((tweet, _metadata)) = pager.next().await? {
//!         println!("{}", tweet.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod dates;
pub mod error;
pub mod fetch;
pub mod http;
pub mod sink;
pub mod types;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use fetch::{FetchEngine, FetchOptions, FetchPhase, FetchStats, FetchTarget, Termination, TweetPager};
pub use http::{
    AuthError, BearerToken, ClassificationResult, ClientConfig, Credentials, Endpoints, RateLimitInspector,
    RetryPolicy, Session,
};
pub use sink::{CsvSink, JsonSink, OutputMode, OutputTarget, ResumeStore, ScriptTokenizer, Tokenizer, TweetSink};
pub use types::{LimitStatus, QueryParams, RateLimitWindow, SearchMetadata, SearchPage, Tweet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
