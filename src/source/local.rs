use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    model::{declaration::SourceDeclaration, lock::FrozenSpec},
    project::{ProjectConfig, RepoInfo},
};

use super::{SourceError, SourceIdentity};

/// A directory on this machine, used as is.
#[derive(Clone)]
pub struct LocalFolderSource {
    project: Arc<dyn ProjectConfig>,
    path: PathBuf,
}

impl LocalFolderSource {
    pub fn new(project: Arc<dyn ProjectConfig>, path: PathBuf) -> Self {
        LocalFolderSource { project, path }
    }

    /// The path exactly as declared.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fetch(&self) -> Result<Arc<dyn ProjectConfig>, SourceError> {
        let root = self
            .path
            .canonicalize()
            .map_err(|source| SourceError::LocalFolder {
                path: self.path.display().to_string(),
                source,
            })?;
        let project = self.project.derive(
            self.project.global_config().clone(),
            RepoInfo { root },
            self.project.included_sources().clone(),
        )?;
        Ok(project)
    }

    /// Local folders cannot be pinned: the same path means different code on another machine.
    pub fn frozenspec(&self) -> Result<FrozenSpec, SourceError> {
        Err(SourceError::NotImplemented(
            "Cannot construct frozenspec for local folder",
        ))
    }

    pub fn identity(&self) -> SourceIdentity {
        SourceIdentity::LocalFolder {
            path: self.path.clone(),
        }
    }

    pub fn declaration(&self) -> SourceDeclaration {
        SourceDeclaration::LocalFolder {
            path: self.path.clone(),
        }
    }
}

impl PartialEq for LocalFolderSource {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for LocalFolderSource {}

impl Hash for LocalFolderSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (&self.path,).hash(state)
    }
}

impl Display for LocalFolderSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Local folder: {}", self.path.display())
    }
}

impl Debug for LocalFolderSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<LocalFolderSource {self}>")
    }
}
