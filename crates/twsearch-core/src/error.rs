//! Error types for the twsearch core library
//!
//! Transient failures (timeouts, 5xx, malformed pages) never reach this type:
//! the fetch engine retries them internally. What surfaces here is either a
//! fatal classification, an authentication failure before any fetch starts,
//! or a local problem (configuration, IO, parsing).

use thiserror::Error;

use crate::http::auth::AuthError;

/// Main error type for twsearch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bearer token exchange failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The API answered with a classification that must stop the run
    #[error("Fatal API error [{status_code}]: {message}")]
    Fatal {
        status_code: u16,
        error_code: Option<u32>,
        message: String,
    },

    /// HTTP failure that the classifier does not recognise
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Rate limit status endpoint could not be reached
    #[error("Cannot get limit status: {message}")]
    LimitStatusUnavailable {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Single-tweet fetch gave up after too many transient failures
    #[error("Retry budget exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// A cancellation token fired while waiting
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Tweet date strings that do not match the API format
    #[error("Invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without an underlying cause
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error came from a fatal API classification
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal { .. })
    }

    /// Upstream error code carried by a fatal classification, if any
    pub fn upstream_code(&self) -> Option<u32> {
        match self {
            Error::Fatal { error_code, .. } => *error_code,
            _ => None,
        }
    }

    /// Process exit code for a fatal classification.
    ///
    /// Uses the upstream error code when it fits in `1..=255`, otherwise
    /// maps the HTTP status (400 to 44, 401 to 99, anything else to 2).
    pub fn exit_code(&self) -> Option<i32> {
        let Error::Fatal { status_code, error_code, .. } = self else {
            return None;
        };
        match error_code {
            Some(code @ 1..=255) => Some(*code as i32),
            _ => Some(match status_code {
                400 => 44,
                401 => 99,
                _ => 2,
            }),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
