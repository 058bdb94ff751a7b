//! HTTP layer for the tweet fetch engine
//!
//! This module provides:
//! - Bearer token exchange from consumer credentials
//! - Error classification into continue / wait / retry / fatal
//! - Rate limit inspection and reset waits
//! - Linear retry back-off with cancellable sleeps
//! - The authenticated session shared by fetch engines

pub mod auth;
pub mod client;
pub mod error;
pub mod rate_limit;
pub mod retry;

pub use auth::{AuthError, BearerToken, CredentialExchanger, Credentials};
pub use client::{ClientConfig, Endpoints, Session};
pub use error::{classify, ApiFailure, ClassificationResult, FatalReason};
pub use rate_limit::RateLimitInspector;
pub use retry::{BackoffScale, RetryDecision, RetryPolicy};

// Re-export commonly used types
pub use reqwest::StatusCode;
