use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use askama::Template;
use chrono::Utc;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::Config;
use crate::post::Post;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render template: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct PageTemplate<'a> {
    pub title: &'a str,
    pub generated_at: String,
    pub posts: &'a [Post],
}

/// A page being written next to its final location. The previous page stays
/// in place until [`StaticSite::publish`] renames this over it.
#[derive(Debug)]
pub struct PendingPage {
    file: NamedTempFile,
}

/// The static page the merged posts end up on.
#[derive(Debug, Clone)]
pub struct StaticSite {
    dir: PathBuf,
    file_name: String,
    title: String,
}

impl StaticSite {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
            title: title.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output_dir, &config.output_file, &config.title)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Create the output directory and a scratch file inside it, so an
    /// unwritable destination is caught before anything is fetched.
    pub fn prepare(&self) -> Result<PendingPage, SiteError> {
        create_private_dir(&self.dir)?;
        let file = NamedTempFile::new_in(&self.dir)?;
        Ok(PendingPage { file })
    }

    pub fn render(&self, posts: &[Post]) -> Result<String, SiteError> {
        let page = PageTemplate {
            title: &self.title,
            generated_at: Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
            posts,
        };
        Ok(page.render()?)
    }

    /// Render into the pending page and move it over the published one.
    pub fn publish(&self, page: PendingPage, posts: &[Post]) -> Result<(), SiteError> {
        let html = self.render(posts)?;

        let mut file = page.file;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            writer.write_all(html.as_bytes())?;
            writer.flush()?;
        }
        make_readable(file.as_file())?;
        file.persist(self.output_path()).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

// Scratch files are created 0600
#[cfg(unix)]
fn make_readable(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn make_readable(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}
