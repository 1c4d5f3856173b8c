use std::path::PathBuf;

use anyhow::{anyhow, Context};
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::aggregator::aggregate;
use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::site::StaticSite;

#[derive(Debug)]
pub struct RunReport {
    /// Number of posts written to the page
    pub posts: usize,
    pub output: PathBuf,
}

pub async fn run(config: &Config) -> anyhow::Result<RunReport> {
    let fetcher = Fetcher::new().context("Failed to create HTTP client")?;
    run_with(&fetcher, config).await
}

/// One full run: make sure the page can be written, fetch and merge every
/// feed under a single deadline, then replace the page.
///
/// Only output failures are fatal. Feeds that fail or time out just leave
/// their posts off the page.
pub async fn run_with(fetcher: &Fetcher, config: &Config) -> anyhow::Result<RunReport> {
    let site = StaticSite::from_config(config);
    let output = site.output_path();

    let pending = site
        .prepare()
        .with_context(|| format!("Failed to prepare output {}", output.display()))?;

    let deadline = Instant::now()
        .checked_add(config.timeout())
        .ok_or_else(|| anyhow!("Timeout of {} seconds is out of range", config.timeout))?;
    let cutoff = Utc::now()
        .checked_sub_signed(config.relevant_duration())
        .ok_or_else(|| anyhow!("Relevant window of {} days is out of range", config.relevant_days))?;
    for feed in &config.feeds {
        debug!("Queued feed: {}", feed.label());
    }

    let posts = aggregate(fetcher, &config.endpoints(), deadline, cutoff).await;

    site.publish(pending, &posts)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} posts to {}", posts.len(), output.display());

    Ok(RunReport {
        posts: posts.len(),
        output,
    })
}
