//! Shared utilities for command handlers

use crate::cli::SinkArgs;
use crate::config::Config;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use twsearch_core::sink::OutputMode;
use twsearch_core::{
    BearerToken, CsvSink, JsonSink, OutputTarget, ResumeStore, ScriptTokenizer, Session, Tokenizer, TweetSink,
};

/// Open an authenticated session.
///
/// A dry run never talks to the API, so it skips the token exchange.
pub async fn connect(config: &Config, dry_run: bool) -> Result<Arc<Session>> {
    let client = config.client_config()?;
    let session = if dry_run {
        Session::with_bearer(client, BearerToken::new("dry-run"))?
    } else {
        Session::connect(client, &config.credentials()).await?
    };
    Ok(Arc::new(session))
}

/// Sink selected by the output flags, and the path it writes to
pub fn open_sink(args: &SinkArgs, config: &Config) -> Result<(Box<dyn TweetSink>, PathBuf)> {
    let path = args.output.clone().unwrap_or_else(|| config.default_output(args.json));
    let mode = if args.output_reset {
        OutputMode::Truncate
    } else {
        OutputMode::Append
    };
    let target = OutputTarget::open(&path, mode)?;
    tracing::debug!(path = %path.display(), ?mode, json = args.json, "Opened output");

    let tokenizer = if args.wakati {
        Some(Box::new(ScriptTokenizer::new()?) as Box<dyn Tokenizer>)
    } else {
        None
    };

    let sink: Box<dyn TweetSink> = if args.json {
        let sink = JsonSink::new(target);
        match tokenizer {
            Some(tokenizer) => Box::new(sink.with_tokenizer(tokenizer)),
            None => Box::new(sink),
        }
    } else {
        let sink = CsvSink::for_target(target, args.write_header)?;
        match tokenizer {
            Some(tokenizer) => Box::new(sink.with_tokenizer(tokenizer)),
            None => Box::new(sink),
        }
    };
    Ok((sink, path))
}

/// Resume store for a search run, if one was asked for.
///
/// `--resume-reset` without `--resume-file` resets the configured file.
pub fn open_resume(file: Option<&Path>, reset: bool, config: &Config) -> Result<Option<ResumeStore>> {
    if file.is_none() && !reset {
        return Ok(None);
    }
    let path = file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output.resume_file.clone());
    let store = if reset {
        ResumeStore::reset(path)?
    } else {
        ResumeStore::open(path)?
    };
    Ok(Some(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use twsearch_core::{SearchMetadata, Tweet};

    fn tweet() -> Tweet {
        Tweet::new(json!({
            "created_at": "Thu Jun 04 01:00:01 +0000 2020",
            "id": 1268346734951964672u64,
            "id_str": "1268346734951964672",
            "full_text": "ロゴ",
            "user": {"id": 14963504, "name": "Ika", "screen_name": "Ikarashi"}
        }))
    }

    #[test]
    fn test_csv_sink_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let args = SinkArgs {
            output: Some(dir.path().join("out.csv")),
            write_header: true,
            ..Default::default()
        };

        let (mut sink, path) = open_sink(&args, &Config::default()).unwrap();
        sink.write(&tweet(), &SearchMetadata::default()).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("\u{feff}\"created_at_exceltime\""));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_json_sink_with_wakati() {
        let dir = tempfile::tempdir().unwrap();
        let args = SinkArgs {
            output: Some(dir.path().join("out.json")),
            json: true,
            wakati: true,
            ..Default::default()
        };

        let (mut sink, path) = open_sink(&args, &Config::default()).unwrap();
        sink.write(&tweet(), &SearchMetadata::default()).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(document["wakati"]["text"], "ロゴ");
        assert_eq!(document["created_time"], 1591232401);
    }

    #[test]
    fn test_resume_store_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.resume_file = dir.path().join("configured.json");

        assert!(open_resume(None, false, &config).unwrap().is_none());

        let explicit = dir.path().join("explicit.json");
        let store = open_resume(Some(&explicit), false, &config).unwrap().unwrap();
        assert_eq!(store.path(), explicit.as_path());

        let store = open_resume(None, true, &config).unwrap().unwrap();
        assert_eq!(store.path(), config.output.resume_file.as_path());
        assert_eq!(store.markers().since_id, None);
    }

    #[tokio::test]
    async fn test_dry_run_session_skips_exchange() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9".to_string();
        let session = connect(&config, true).await.unwrap();
        assert_eq!(session.user_agent(), "Twitter-Search 2.0");
    }
}
