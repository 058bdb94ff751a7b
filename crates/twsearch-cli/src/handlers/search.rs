//! Search command handler

use super::utils;
use crate::cli::SearchArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use twsearch_core::{FetchEngine, FetchOptions, QueryParams, ResumeStore, SearchMetadata, Tweet, TweetSink};

/// Handle the search command
#[instrument(skip_all, fields(query = %args.query))]
pub async fn handle_search(
    args: SearchArgs,
    config: &Config,
    output: &mut OutputWriter,
    cancel: CancellationToken,
) -> Result<()> {
    let timer = Timer::new("search_command");

    let mut resume = utils::open_resume(args.resume_file.as_deref(), args.resume_reset, config)?;
    let params = search_params(&args, config, resume.as_ref());
    let options = FetchOptions::new()
        .with_retry(config.retry_policy(args.retry_max, args.interval))
        .with_dispcount(args.dispcount.unwrap_or(config.fetch.dispcount))
        .with_dry_run(args.dry_run);

    let session = utils::connect(config, args.dry_run).await?;
    let (mut sink, path) = utils::open_sink(&args.sink, config)?;
    info!(output = %path.display(), params = %params, "Starting search");

    let mut pager = FetchEngine::search(session).generate(params, options, cancel);
    let spinner = output.spinner("Searching...");
    let mut counter = 0u64;

    let result = loop {
        let (tweet, metadata) = match pager.next().await {
            Ok(Some(item)) => item,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        counter += 1;
        let line = format!("get tweet: {}: {}", counter, tweet.id_str().unwrap_or_default());
        match &spinner {
            Some(pb) => {
                pb.set_message(line.clone());
                pb.suspend(|| output.info(&line))?;
            }
            None => output.info(&line)?,
        }

        record(&mut sink, resume.as_mut(), &tweet, &metadata)?;
    };

    sink.flush()?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let stats = pager.stats();
    info!(
        termination = ?pager.termination(),
        requests = stats.requests,
        pages = stats.pages,
        transient_failures = stats.transient_failures,
        rate_limit_waits = stats.rate_limit_waits,
        waited_secs = stats.waited.as_secs(),
        "Search finished"
    );
    output.success(&format!("Total: {} items", counter))?;
    timer.finish();

    Ok(result?)
}

/// Write one tweet, then advance the resume markers.
///
/// The sink is flushed first so stored markers never point past rows that
/// are still sitting in the output buffer.
fn record(
    sink: &mut dyn TweetSink,
    resume: Option<&mut ResumeStore>,
    tweet: &Tweet,
    metadata: &SearchMetadata,
) -> Result<()> {
    sink.write(tweet, metadata)?;
    if let Some(store) = resume {
        sink.flush()?;
        store.observe(tweet)?;
    }
    Ok(())
}

/// Request parameters from the flags, with stored resume markers filling
/// in `since_id` and `since` when no flag gives them
fn search_params(args: &SearchArgs, config: &Config, resume: Option<&ResumeStore>) -> QueryParams {
    let (since_id, since_date) = match resume {
        Some(store) => (
            store.effective_since_id(args.since_id),
            store.effective_since_date(args.since_date.as_deref()),
        ),
        None => (args.since_id, args.since_date.clone()),
    };

    let mut params = QueryParams::new()
        .with("q", &args.query)
        .with("count", args.count.unwrap_or(config.fetch.count));
    if let Some(id) = since_id {
        params.set("since_id", id);
    }
    if let Some(id) = args.max_id {
        params.set("max_id", id);
    }
    if let Some(date) = since_date {
        params.set("since", date);
    }
    if let Some(date) = &args.max_date {
        params.set("until", date);
    }
    params
}
