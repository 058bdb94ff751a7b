//! Limits command handler

use super::utils;
use crate::cli::LimitsArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use twsearch_core::dates::epoch_to_local_string;
use twsearch_core::{LimitStatus, RateLimitWindow};

/// Handle the limits command
pub async fn handle_limits(args: LimitsArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let session = utils::connect(config, false).await?;
    let status = session
        .rate_limits()
        .get_limit_status(session.bearer(), &args.family)
        .await?;

    output.data(status.as_value())?;
    match window_lines(&status, &args.family, &args.resource) {
        Some(lines) => lines.iter().try_for_each(|line| output.line(line)),
        None => output.warning(&format!("No rate limit entry for {}/{}", args.family, args.resource)),
    }
}

fn window_lines(status: &LimitStatus, family: &str, resource: &str) -> Option<Vec<String>> {
    let RateLimitWindow { limit, remaining, reset } = status.window(family, resource)?;
    Some(vec![
        format!("limit: {}", limit),
        format!("remaining: {}", remaining),
        format!("reset: {}", reset),
        format!("reset(epoch2datetime): {}", epoch_to_local_string(reset)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_window_lines() {
        let status = LimitStatus::new(json!({
            "resources": {"search": {"/search/tweets": {"limit": 450, "remaining": 449, "reset": 1591232401}}}
        }));

        let lines = window_lines(&status, "search", "/search/tweets").unwrap();
        assert_eq!(lines[0], "limit: 450");
        assert_eq!(lines[1], "remaining: 449");
        assert_eq!(lines[2], "reset: 1591232401");
        assert!(lines[3].starts_with("reset(epoch2datetime): 2020-06-0"));

        assert!(window_lines(&status, "statuses", "statuses/show").is_none());
    }
}
