use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

/// Reasons a single feed entry cannot become a [`Post`].
#[derive(Debug, Error)]
pub enum PostError {
    #[error("Entry has neither a published nor an updated date")]
    MissingTimestamp,
    #[error("Invalid link '{link}': {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Link has no host: {0}")]
    MissingHost(String),
}

/// A feed entry normalized for the merged page.
///
/// The host is derived from the link at construction and there are no
/// setters, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    link: String,
    title: String,
    published: DateTime<Utc>,
    host: String,
}

impl Post {
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        published: DateTime<Utc>,
    ) -> Result<Self, PostError> {
        let link = link.into();
        let host = host_of(&link)?;

        Ok(Self {
            link,
            title: title.into(),
            published,
            host,
        })
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn published(&self) -> DateTime<Utc> {
        self.published
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Publication time if the entry has one, otherwise its last update.
pub fn resolve_published(
    published: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, PostError> {
    published.or(updated).ok_or(PostError::MissingTimestamp)
}

/// Network authority of a link: the host, plus the port when it is not the
/// scheme's default.
fn host_of(link: &str) -> Result<String, PostError> {
    let url = Url::parse(link).map_err(|source| PostError::InvalidLink {
        link: link.to_string(),
        source,
    })?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| PostError::MissingHost(link.to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
