//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from twsearch-core library
    #[error("{0}")]
    Core(#[from] twsearch_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(core) => match core {
                twsearch_core::Error::Fatal { .. } => core.exit_code().unwrap_or(2),
                // Statuses the classifier does not cover stop the run like a fatal one
                twsearch_core::Error::Http { .. } => 2,
                twsearch_core::Error::Auth(_) => 99,
                twsearch_core::Error::Cancelled => 130,
                _ => 1,
            },
            Self::Io(_) => 1,
            Self::FileNotFound { .. } => 3,
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) | Self::Toml(_) => 5,
            Self::Logging(_) => 1,
        }
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}
