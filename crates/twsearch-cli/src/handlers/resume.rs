//! Resume command handler

use crate::cli::ResumeArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use twsearch_core::ResumeStore;

/// Handle the resume command
pub fn handle_resume(args: ResumeArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let path = args.resume_file.unwrap_or_else(|| config.output.resume_file.clone());
    if !path.exists() {
        return Err(Error::FileNotFound { path });
    }

    let store = ResumeStore::open(&path)?;
    let markers = store.markers();
    output.line(&format!("Resume File: {}", path.display()))?;
    output.line(&format!(
        "since_id: {}",
        markers.since_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
    ))?;
    output.line(&format!("since_date: {}", markers.since_date.as_deref().unwrap_or("-")))?;
    Ok(())
}
