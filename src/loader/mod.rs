mod instaloader;
#[cfg(test)]
pub mod testing;

pub use instaloader::InstaloaderCli;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::DownloadRequest;

/// Progress lines travel from the loader to the job runner on this channel.
pub type ProgressSender = UnboundedSender<String>;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{program} is not installed. Install it via `pip install instaloader`.")]
    NotInstalled { program: String },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Failed { code: Option<i32>, message: String },
}

pub type Result<T> = std::result::Result<T, LoaderError>;

/// The external download library, as seen by the job runner.
#[async_trait]
pub trait PostLoader: Send + Sync {
    /// Human-readable name of the loader
    fn name(&self) -> &'static str;

    /// Download one post, sending progress lines as they are produced.
    /// Returns the directory the post was saved under.
    async fn fetch(&self, request: DownloadRequest, progress: ProgressSender) -> Result<PathBuf>;

    /// Check the loader can run on this system. Returns its version string.
    async fn check_available(&self) -> Result<String>;
}
