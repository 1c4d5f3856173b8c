use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::post::Post;

/// Fetch every endpoint concurrently and merge the results, newest first.
///
/// All workers share `deadline` and `cutoff`. Failed endpoints are logged by
/// their worker and simply contribute nothing, so this never fails: if every
/// endpoint fails the result is empty.
pub async fn aggregate(
    fetcher: &Fetcher,
    endpoints: &[String],
    deadline: Instant,
    cutoff: DateTime<Utc>,
) -> Vec<Post> {
    info!("Fetching {} feeds", endpoints.len());

    let (tx, rx) = mpsc::unbounded_channel();
    let mut workers = JoinSet::new();

    for endpoint in endpoints {
        let fetcher = fetcher.clone();
        let endpoint = endpoint.clone();
        let tx = tx.clone();
        workers.spawn(async move { fetcher.collect(endpoint, deadline, cutoff, tx).await });
    }
    // Only the workers hold senders now, so the channel closes once they finish
    drop(tx);

    gather(workers, rx).await
}

/// Wait for every worker, then drain the merge channel and sort it.
///
/// A worker that panicked or was aborted counts as failed; whatever it sent
/// before that is kept.
pub async fn gather(
    mut workers: JoinSet<FetchOutcome>,
    mut posts_rx: UnboundedReceiver<Post>,
) -> Vec<Post> {
    let mut succeeded = 0;
    let mut failed = 0;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) if outcome.result.is_ok() => succeeded += 1,
            Ok(_) => failed += 1,
            Err(e) => {
                error!("Feed worker did not finish: {}", e);
                failed += 1;
            }
        }
    }

    let mut posts = Vec::new();
    while let Some(post) = posts_rx.recv().await {
        posts.push(post);
    }
    sort_newest_first(&mut posts);

    info!(
        "Feed fetch complete: {} succeeded, {} failed, {} posts",
        succeeded,
        failed,
        posts.len()
    );
    posts
}

/// Descending by publication time. Equal timestamps are ordered by link so
/// the output is the same on every run.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_unstable_by(|a, b| {
        b.published()
            .cmp(&a.published())
            .then_with(|| a.link().cmp(b.link()))
    });
}
