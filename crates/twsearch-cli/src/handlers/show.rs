//! Show command handler

use super::utils;
use crate::cli::ShowArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use twsearch_core::{FetchEngine, SearchMetadata};

/// Handle the show command
#[instrument(skip_all, fields(id = %args.id))]
pub async fn handle_show(
    args: ShowArgs,
    config: &Config,
    output: &mut OutputWriter,
    cancel: CancellationToken,
) -> Result<()> {
    let policy = config.retry_policy(args.retry_max, args.interval);
    let session = utils::connect(config, false).await?;

    let spinner = output.spinner(&format!("Fetching tweet {}...", args.id));
    let fetched = FetchEngine::show(session).get_one_tweet(&args.id, &policy, &cancel).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let tweet = fetched?;

    let (mut sink, path) = utils::open_sink(&args.sink, config)?;
    sink.write(&tweet, &SearchMetadata::default())?;
    sink.flush()?;
    tracing::info!(output = %path.display(), "Tweet written");

    output.info(&format!("get tweet: 1: {}", tweet.id_str().unwrap_or_default()))?;
    output.success("Total: 1 items")?;
    Ok(())
}
