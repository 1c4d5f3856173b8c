use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Heading shown on the generated page
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// Deadline for the whole fetch phase, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Posts older than this many days are left off the page
    #[serde(default = "default_relevant_days")]
    pub relevant_days: u32,
    pub feeds: Vec<FeedConfig>,
}

fn default_title() -> String {
    "Feed Digest".to_string()
}

fn default_output_dir() -> String {
    "docs".to_string()
}

fn default_output_file() -> String {
    "index.html".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_relevant_days() -> u32 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl FeedConfig {
    /// Name used in log lines, falling back to the URL
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn relevant_duration(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.relevant_days))
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.feeds.iter().map(|f| f.url.clone()).collect()
    }
}
