use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::post::{resolve_published, Post, PostError};

const USER_AGENT: &str = "Feedpage/1.0 (Feed Aggregator)";

/// Endpoint-level failures. Each one costs that endpoint its posts and
/// nothing else.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Deadline exceeded")]
    Timeout,
    #[error("Parse error: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

/// What one worker reports back once it is done with its endpoint.
#[derive(Debug)]
pub struct FetchOutcome {
    pub endpoint: String,
    /// Number of posts sent to the merge channel, or why there were none
    pub result: Result<usize, FetchError>,
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// The client gets no request timeout of its own: the run deadline
    /// passed to [`Fetcher::fetch`] is the only limit.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Retrieve and parse one feed, keeping entries published at or after
    /// `cutoff`.
    ///
    /// Retrieval is abandoned as soon as `deadline` passes. Parsing runs to
    /// completion once the body is in, so the deadline is checked again
    /// afterwards and a late result is discarded.
    pub async fn fetch(
        &self,
        endpoint: &str,
        deadline: Instant,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Post>, FetchError> {
        let feed = tokio::time::timeout_at(deadline, self.retrieve(endpoint))
            .await
            .map_err(|_| FetchError::Timeout)??;
        check_deadline(deadline)?;

        let posts = posts_from_feed(&feed, endpoint, cutoff);
        check_deadline(deadline)?;
        Ok(posts)
    }

    /// Worker body: fetch one endpoint and push its posts into the merge
    /// channel. Failures are logged and reported, never propagated.
    pub async fn collect(
        &self,
        endpoint: String,
        deadline: Instant,
        cutoff: DateTime<Utc>,
        posts: UnboundedSender<Post>,
    ) -> FetchOutcome {
        info!("Fetching feed: {}", endpoint);

        let result = match self.fetch(&endpoint, deadline, cutoff).await {
            Ok(fetched) => {
                let count = fetched.len();
                for post in fetched {
                    if posts.send(post).is_err() {
                        warn!("Merge channel closed while sending posts from {}", endpoint);
                        break;
                    }
                }
                info!("Collected {} posts from {}", count, endpoint);
                Ok(count)
            }
            Err(e) => {
                error!("Failed to fetch feed '{}': {}", endpoint, e);
                Err(e)
            }
        };

        FetchOutcome { endpoint, result }
    }

    async fn retrieve(&self, endpoint: &str) -> Result<Feed, FetchError> {
        let response = self.client.get(endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;
        Ok(feed)
    }
}

fn check_deadline(deadline: Instant) -> Result<(), FetchError> {
    if Instant::now() >= deadline {
        return Err(FetchError::Timeout);
    }
    Ok(())
}

/// Normalize every entry of a parsed feed, dropping the ones older than
/// `cutoff` and logging the malformed ones.
pub fn posts_from_feed(feed: &Feed, endpoint: &str, cutoff: DateTime<Utc>) -> Vec<Post> {
    let mut posts = Vec::new();

    for entry in &feed.entries {
        match post_from_entry(entry, cutoff) {
            Ok(Some(post)) => posts.push(post),
            Ok(None) => {}
            Err(e) => warn!("Skipping entry '{}' from {}: {}", entry.id, endpoint, e),
        }
    }

    posts
}

/// `Ok(None)` means the entry is well-formed but too old.
fn post_from_entry(entry: &Entry, cutoff: DateTime<Utc>) -> Result<Option<Post>, PostError> {
    let published = resolve_published(entry.published, entry.updated)?;
    if published < cutoff {
        return Ok(None);
    }

    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .unwrap_or_default();

    let link = entry
        .links
        .first()
        .map(|l| l.href.as_str())
        .unwrap_or_default();

    Post::new(link, title, published).map(Some)
}
