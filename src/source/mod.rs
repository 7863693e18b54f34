mod local;
mod remote;

use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    path::PathBuf,
    sync::Arc,
};

use thiserror::Error;

use crate::{
    cache::{CacheError, SnapshotCache},
    github::{ApiError, RepositoryProvider},
    model::{
        declaration::{RevisionRequest, SourceDeclaration},
        lock::FrozenSpec,
    },
    project::{ProjectConfig, ProjectError},
    resolver::ResolveError,
};

pub use local::LocalFolderSource;
pub use remote::RemoteSource;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Could not access repository {repository}: {source}")]
    Repository {
        repository: String,
        #[source]
        source: ApiError,
    },
    #[error("Could not resolve {request} in {repository}: {source}")]
    Resolution {
        repository: String,
        request: RevisionRequest,
        #[source]
        source: ResolveError,
    },
    #[error("{0}")]
    NotImplemented(&'static str),
    #[error("No entry for {name} {declaration} in the lock file")]
    NotLocked { name: String, declaration: String },
    #[error("Could not access local folder {path}: {source}")]
    LocalFolder {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// What makes two sources the same source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceIdentity {
    Remote { url: String, commit: String },
    LocalFolder { path: PathBuf },
}

/// Collaborators needed to build sources on behalf of one project.
#[derive(Clone)]
pub struct SourceContext {
    project: Arc<dyn ProjectConfig>,
    repositories: Arc<dyn RepositoryProvider>,
    cache: Arc<SnapshotCache>,
}

impl SourceContext {
    pub fn new(
        project: Arc<dyn ProjectConfig>,
        repositories: Arc<dyn RepositoryProvider>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        SourceContext {
            project,
            repositories,
            cache,
        }
    }

    pub fn project(&self) -> &Arc<dyn ProjectConfig> {
        &self.project
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Same collaborators, owned by another project.
    pub fn for_project(&self, project: Arc<dyn ProjectConfig>) -> Self {
        SourceContext {
            project,
            ..self.clone()
        }
    }
}

/// A pinnable origin of a project's code.
///
/// Remote sources are resolved to a commit while being built, so hashing and
/// comparing sources never needs the network.
#[derive(Clone)]
pub enum Source {
    Remote(RemoteSource),
    LocalFolder(LocalFolderSource),
}

impl Source {
    pub fn new(context: &SourceContext, declaration: &SourceDeclaration) -> Result<Self, SourceError> {
        match declaration {
            SourceDeclaration::GitHub {
                repository,
                revision,
                description,
            } => Ok(Source::Remote(RemoteSource::new(
                context,
                repository,
                revision,
                description.as_deref(),
            )?)),
            SourceDeclaration::LocalFolder { path } => Ok(Source::LocalFolder(
                LocalFolderSource::new(context.project.clone(), path.clone()),
            )),
        }
    }

    /// Materializes the source and returns a project configuration rooted in it.
    pub fn fetch(&self) -> Result<Arc<dyn ProjectConfig>, SourceError> {
        match self {
            Source::Remote(source) => source.fetch(),
            Source::LocalFolder(source) => source.fetch(),
        }
    }

    pub fn frozenspec(&self) -> Result<FrozenSpec, SourceError> {
        match self {
            Source::Remote(source) => Ok(source.frozenspec()),
            Source::LocalFolder(source) => source.frozenspec(),
        }
    }

    pub fn identity(&self) -> SourceIdentity {
        match self {
            Source::Remote(source) => source.identity(),
            Source::LocalFolder(source) => source.identity(),
        }
    }

    pub fn declaration(&self) -> SourceDeclaration {
        match self {
            Source::Remote(source) => source.declaration(),
            Source::LocalFolder(source) => source.declaration(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Source::LocalFolder(_))
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Source::Remote(a), Source::Remote(b)) => a == b,
            (Source::LocalFolder(a), Source::LocalFolder(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Source {}

impl Hash for Source {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Source::Remote(source) => source.hash(state),
            Source::LocalFolder(source) => source.hash(state),
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Remote(source) => Display::fmt(source, f),
            Source::LocalFolder(source) => Display::fmt(source, f),
        }
    }
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Remote(source) => Debug::fmt(source, f),
            Source::LocalFolder(source) => Debug::fmt(source, f),
        }
    }
}
