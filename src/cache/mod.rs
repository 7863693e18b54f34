mod archive;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use thiserror::Error;

use crate::{
    github::{ApiError, RepositoryHandle},
    model::repository::RepositoryUrl,
};

/// On-disk store of unpacked snapshots, laid out as `<location>/<repository>/<commit>`.
///
/// Entries are never modified once placed, so concurrent callers only race on
/// the final rename and the loser drops its copy.
#[derive(Debug)]
pub struct SnapshotCache {
    location: PathBuf,
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache location {location} is not a directory")]
    BadLocation { location: String },
    #[error("Commit `{commit}` cannot be used as a cache key")]
    InvalidCommit { commit: String },
    #[error("Could not download {repository} at {commit}: {source}")]
    Download {
        repository: String,
        commit: String,
        #[source]
        source: ApiError,
    },
    #[error("Invalid snapshot archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Snapshot archive entry {0} escapes the snapshot directory")]
    UnsafeEntry(String),
    #[error("Snapshot archive must contain exactly one top-level directory, found {found} entries")]
    ArchiveLayout { found: usize },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl SnapshotCache {
    pub fn new(location: PathBuf) -> Result<SnapshotCache, CacheError> {
        if location.exists() {
            if !location.is_dir() {
                return Err(CacheError::BadLocation {
                    location: location.display().to_string(),
                });
            }
        } else {
            fs::create_dir_all(&location)?;
        }
        Ok(SnapshotCache { location })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn entry_path(&self, repository: &RepositoryUrl, commit: &str) -> PathBuf {
        self.location.join(repository.to_path()).join(commit)
    }

    /// Returns the directory holding `repository` at `commit`, downloading it on first use.
    pub fn materialize(
        &self,
        repository: &dyn RepositoryHandle,
        commit: &str,
    ) -> Result<PathBuf, CacheError> {
        validate_commit(commit)?;
        let path = self.entry_path(repository.url(), commit);
        if path.is_dir() {
            debug!(
                "Skipping download of {} at {}. Already in cache",
                repository.url().slug(),
                commit
            );
            return Ok(path);
        }

        let parent = path.parent().unwrap_or(&self.location);
        fs::create_dir_all(parent)?;

        let archive =
            repository
                .download_snapshot(commit)
                .map_err(|source| CacheError::Download {
                    repository: repository.url().slug(),
                    commit: commit.to_string(),
                    source,
                })?;

        // Staged next to the final location so the rename stays on one filesystem.
        let staging = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempdir_in(parent)?;
        let unpacked = archive::unpack(&archive, staging.path())?;

        match fs::rename(&unpacked, &path) {
            Ok(()) => {
                info!(
                    "Cached {} at {} in {}",
                    repository.url().slug(),
                    commit,
                    path.display()
                );
                Ok(path)
            }
            Err(error) if path.is_dir() => {
                debug!(
                    "{} was placed concurrently ({}), discarding our copy",
                    path.display(),
                    error
                );
                Ok(path)
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        if self.location.exists() {
            info!(
                "Clearing sourcefetch snapshot cache {}.",
                &self.location.display()
            );
            fs::remove_dir_all(&self.location)?;
        }
        Ok(())
    }
}

fn validate_commit(commit: &str) -> Result<(), CacheError> {
    let valid = !commit.is_empty()
        && commit != "."
        && commit != ".."
        && commit
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidCommit {
            commit: commit.to_string(),
        })
    }
}
