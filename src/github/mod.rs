mod client;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use thiserror::Error;

use crate::model::repository::RepositoryUrl;

pub use client::{GitHubClient, GitHubRepository};
pub use transport::{ApiResponse, HttpTransport, Transport};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{url} was not found")]
    NotFound { url: String },
    #[error("Access to {url} was denied with HTTP {status}, check the github credentials")]
    Unauthorized { url: String, status: u16 },
    #[error("Unexpected HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid response from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// One remote repository reachable through the forge API.
pub trait RepositoryHandle: Send + Sync {
    fn url(&self) -> &RepositoryUrl;

    fn default_branch(&self) -> &str;

    /// Commit sha that `refs/<path>` points at.
    fn get_ref(&self, path: &str) -> Result<String, ApiError>;

    fn get_tag_ref(&self, tag: &str) -> Result<String, ApiError> {
        self.get_ref(&format!("tags/{tag}"))
    }

    /// Tag name of the latest release, `None` when the repository has no release.
    fn latest_release(&self) -> Result<Option<String>, ApiError>;

    /// Zip archive of the tree at `commit`, wrapped in a single top-level directory.
    fn download_snapshot(&self, commit: &str) -> Result<Vec<u8>, ApiError>;
}

/// Opens repository handles. Opening checks that the repository exists and is accessible.
pub trait RepositoryProvider: Send + Sync {
    fn open(&self, url: &RepositoryUrl) -> Result<Arc<dyn RepositoryHandle>, ApiError>;
}
