//! Console output for the CLI
//!
//! Status messages go to stderr so that stdout stays free for tweet data
//! when `--output -` is used. Structured values (rate limit status, resume
//! markers) are written to stdout.

use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::trace;

/// Output writer that handles colors, quiet mode and progress
pub struct OutputWriter {
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer over stdout and stderr
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
        }
    }

    /// Create an output writer with custom writers
    #[cfg(test)]
    pub fn with_writers(out: Box<dyn Write>, err: Box<dyn Write>, use_color: bool, quiet: bool) -> Self {
        Self {
            use_color,
            show_progress: false,
            quiet,
            out,
            err,
        }
    }

    /// Check if progress indicators should be shown
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    /// Write a line to stdout
    pub fn line(&mut self, content: &str) -> Result<()> {
        writeln!(self.out, "{}", content)?;
        self.out.flush()?;
        Ok(())
    }

    fn message(&mut self, content: &str) -> Result<()> {
        writeln!(self.err, "{}", content)?;
        self.err.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if self.use_color {
            self.message(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.message(message)
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if self.use_color {
            self.message(&message.green().to_string())
        } else {
            self.message(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.use_color {
            self.message(&message.yellow().to_string())
        } else {
            self.message(&format!("WARNING: {}", message))
        }
    }

    /// Write a value as pretty JSON to stdout
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);
        trace!(data = %value_json, "Outputting data");

        let formatted = serde_json::to_string_pretty(value)?;
        self.line(&formatted)
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests;
