//! HTTP error classification
//!
//! Maps a failed response (status code plus parsed error body) to the action
//! the fetch engine should take. Both the single-tweet fetch and the
//! paginated fetch go through [`classify`], so they handle errors identically.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Missing or invalid url parameter
pub const INVALID_PARAMETER: u32 = 195;
/// No id was given to a by-id endpoint
pub const NO_ID_SPECIFIED: u32 = 8;
/// No status found with that id
pub const NO_STATUS_FOUND: u32 = 144;
/// `count` parameter is invalid
pub const INVALID_COUNT: u32 = 44;
/// Unable to verify credentials
pub const AUTH_FAILED: u32 = 99;
/// Rate limit exceeded
pub const RATE_LIMIT_EXCEEDED: u32 = 88;

/// Error codes that make a 403/404 non-recoverable
const FATAL_CODES: [u32; 3] = [INVALID_PARAMETER, NO_ID_SPECIFIED, NO_STATUS_FOUND];

/// Why a response was classified as fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatalReason {
    /// 400: the request parameters are wrong
    InvalidParameter,
    /// 401: the bearer token was refused
    Authentication,
    /// 403/404 carrying one of the known fatal error codes
    ApiCode(u32),
}

/// Action to take after a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationResult {
    /// Successful response, keep going
    Continue,
    /// Quota exhausted: wait for the window to reset, then retry the same request
    WaitForReset,
    /// Transient failure: retry within the retry budget
    Retry,
    /// Stop the run
    FatalExit(FatalReason),
    /// Not covered by the table; callers treat it as fatal by default
    Unclassified,
}

impl ClassificationResult {
    /// Check if this result should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retry | Self::WaitForReset)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalExit(_) | Self::Unclassified)
    }
}

/// Classify a response by status code and parsed error body.
///
/// Pure function of its inputs: the same pair always yields the same action.
pub fn classify(status: u16, body: Option<&Value>) -> ClassificationResult {
    match status {
        200..=299 => ClassificationResult::Continue,
        429 | 420 => ClassificationResult::WaitForReset,
        500 | 502 | 503 | 504 => ClassificationResult::Retry,
        400 => ClassificationResult::FatalExit(FatalReason::InvalidParameter),
        401 => ClassificationResult::FatalExit(FatalReason::Authentication),
        403 | 404 => match error_codes(body).into_iter().find(|c| FATAL_CODES.contains(c)) {
            Some(code) => ClassificationResult::FatalExit(FatalReason::ApiCode(code)),
            None if status == 403 => ClassificationResult::Retry,
            None => ClassificationResult::Unclassified,
        },
        _ => ClassificationResult::Unclassified,
    }
}

/// Codes found in the body's `errors` array, in order
pub fn error_codes(body: Option<&Value>) -> Vec<u32> {
    body.and_then(|b| b.get("errors"))
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("code").and_then(Value::as_u64))
                .filter_map(|c| u32::try_from(c).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// A non-success API response, read fully so it can be classified and logged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiFailure {
    pub status_code: u16,
    /// Parsed JSON body, if the body was JSON
    pub body: Option<Value>,
    /// First error message from the body, or the raw body
    pub message: String,
}

impl ApiFailure {
    /// Create from a reqwest Response
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status_code = response.status().as_u16();
        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, status_code, "Could not read error body");
                String::new()
            }
        };
        Self::from_parts(status_code, &raw)
    }

    pub fn from_parts(status_code: u16, raw: &str) -> Self {
        let body = serde_json::from_str::<Value>(raw).ok();
        let message = body
            .as_ref()
            .and_then(|b| b.get("errors"))
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string());
        Self {
            status_code,
            body,
            message,
        }
    }

    pub fn classification(&self) -> ClassificationResult {
        classify(self.status_code, self.body.as_ref())
    }

    /// Log the status and every entry of the `errors` array
    pub fn dump(&self, context: &str) {
        tracing::error!(
            status_code = self.status_code,
            body = %self.body.as_ref().map(serde_json::Value::to_string).unwrap_or_default(),
            "{}", context
        );
        if let Some(errors) = self.body.as_ref().and_then(|b| b.get("errors")).and_then(Value::as_array) {
            for err in errors {
                tracing::error!(error = %err, "errors");
            }
        }
    }

    /// Turn a fatal or unclassified failure into the crate error
    pub fn into_error(self) -> crate::Error {
        match self.classification() {
            ClassificationResult::FatalExit(reason) => {
                let codes = error_codes(self.body.as_ref());
                let error_code = match reason {
                    FatalReason::ApiCode(code) => Some(code),
                    FatalReason::InvalidParameter | FatalReason::Authentication => {
                        codes.first().copied()
                    }
                };
                crate::Error::Fatal {
                    status_code: self.status_code,
                    error_code,
                    message: self.message,
                }
            }
            _ => crate::Error::Http {
                message: self.message,
                status_code: Some(self.status_code),
                source: self.body.map(|b| anyhow::anyhow!("{}", b)),
            },
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP Error [{}]: {} (classification: {:?})",
            self.status_code,
            self.message,
            self.classification()
        )
    }
}

impl std::error::Error for ApiFailure {}
