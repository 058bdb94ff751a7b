//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.
//! Options left unset fall back to the configuration file.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// twsearch - fetch tweets from the search API into CSV or JSON
///
/// Pages through search results (or fetches a single tweet), waits out rate
/// limits, retries transient failures, and records resume markers so the next
/// run only fetches newer tweets.
#[derive(Parser, Debug)]
#[command(
    name = "twsearch",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TWSEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search tweets and write them to CSV or JSON
    Search(SearchArgs),

    /// Fetch one tweet by id
    Show(ShowArgs),

    /// Print the rate limit status of a resource
    Limits(LimitsArgs),

    /// Print the stored resume markers
    Resume(ResumeArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Output options shared by `search` and `show`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SinkArgs {
    /// Output file, or `-` for stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Truncate the output file instead of appending
    #[arg(short = 'O', long)]
    pub output_reset: bool,

    /// Write the CSV header row to a new file
    #[arg(short, long)]
    pub write_header: bool,

    /// Write JSON documents instead of CSV rows
    #[arg(short, long)]
    pub json: bool,

    /// Add space-separated tokens of the tweet text
    #[arg(long)]
    pub wakati: bool,
}

/// Arguments for the search command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Maximum tweets to fetch (-1 for no limit)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub dispcount: Option<i64>,

    /// Tweets requested per page (clamped to 100)
    #[arg(short = 'C', long)]
    pub count: Option<i64>,

    /// Only tweets newer than this id
    #[arg(short = 'S', long)]
    pub since_id: Option<u64>,

    /// Only tweets up to and including this id
    #[arg(short = 'M', long)]
    pub max_id: Option<u64>,

    /// Only tweets created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub since_date: Option<String>,

    /// Only tweets created before this date (YYYY-MM-DD)
    #[arg(long)]
    pub max_date: Option<String>,

    /// Retries allowed for transient failures
    #[arg(short = 't', long)]
    pub retry_max: Option<u32>,

    /// Seconds between retries
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Resume marker file
    #[arg(short = 'b', long, value_name = "FILE")]
    pub resume_file: Option<PathBuf>,

    /// Discard stored resume markers before starting
    #[arg(short = 'B', long)]
    pub resume_reset: bool,

    #[command(flatten)]
    pub sink: SinkArgs,

    /// Walk the fetch loop without sending requests
    #[arg(short, long)]
    pub dry_run: bool,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Tweet id
    #[arg(value_name = "ID")]
    pub id: String,

    /// Retries allowed for transient failures
    #[arg(short = 't', long)]
    pub retry_max: Option<u32>,

    /// Seconds between retries
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    #[command(flatten)]
    pub sink: SinkArgs,
}

/// Arguments for the limits command
#[derive(Parser, Debug)]
pub struct LimitsArgs {
    /// Resource family
    #[arg(long, default_value = "search")]
    pub family: String,

    /// Resource within the family
    #[arg(long, default_value = "/search/tweets")]
    pub resource: String,
}

/// Arguments for the resume command
#[derive(Parser, Debug)]
pub struct ResumeArgs {
    /// Resume marker file
    #[arg(short = 'b', long, value_name = "FILE")]
    pub resume_file: Option<PathBuf>,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stderr().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
