//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod limits;
mod resume;
mod search;
mod show;
mod utils;

pub use completions::handle_completions;
pub use limits::handle_limits;
pub use resume::handle_resume;
pub use search::handle_search;
pub use show::handle_show;
