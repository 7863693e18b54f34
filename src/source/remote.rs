use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

use log::{debug, info};

use crate::{
    cache::SnapshotCache,
    github::RepositoryHandle,
    model::{
        declaration::{RevisionRequest, SourceDeclaration},
        lock::FrozenSpec,
        repository::RepositoryUrl,
    },
    project::{ProjectConfig, RepoInfo},
    resolver::{resolve_ref, ResolvedRef},
};

use super::{SourceContext, SourceError, SourceIdentity};

/// A repository on GitHub, pinned to the commit it resolved to.
#[derive(Clone)]
pub struct RemoteSource {
    project: Arc<dyn ProjectConfig>,
    repository: Arc<dyn RepositoryHandle>,
    cache: Arc<SnapshotCache>,
    request: RevisionRequest,
    declared_description: Option<String>,
    resolved: ResolvedRef,
}

impl RemoteSource {
    pub(super) fn new(
        context: &SourceContext,
        url: &RepositoryUrl,
        request: &RevisionRequest,
        description: Option<&str>,
    ) -> Result<Self, SourceError> {
        let repository =
            context
                .repositories
                .open(url)
                .map_err(|source| SourceError::Repository {
                    repository: url.slug(),
                    source,
                })?;

        let resolved = match (request, description) {
            // Frozen declarations keep the description they were locked with.
            (RevisionRequest::Commit(commit), Some(description)) if description != commit => {
                ResolvedRef {
                    commit: commit.clone(),
                    description: Some(description.to_string()),
                }
            }
            _ => resolve_ref(repository.as_ref(), request).map_err(|source| {
                SourceError::Resolution {
                    repository: url.slug(),
                    request: request.clone(),
                    source,
                }
            })?,
        };
        debug!("Resolved {} {} to {}", url.slug(), request, resolved);

        Ok(RemoteSource {
            project: context.project.clone(),
            repository,
            cache: context.cache.clone(),
            request: request.clone(),
            declared_description: description.map(str::to_string),
            resolved,
        })
    }

    pub fn url(&self) -> &RepositoryUrl {
        self.repository.url()
    }

    pub fn commit(&self) -> &str {
        &self.resolved.commit
    }

    /// How the commit was chosen; `None` for a directly requested commit.
    pub fn description(&self) -> Option<&str> {
        self.resolved.description.as_deref()
    }

    pub fn request(&self) -> &RevisionRequest {
        &self.request
    }

    pub fn fetch(&self) -> Result<Arc<dyn ProjectConfig>, SourceError> {
        let root = self
            .cache
            .materialize(self.repository.as_ref(), &self.resolved.commit)?;
        info!("Fetched {} into {}", self, root.display());
        let project = self.project.derive(
            self.project.global_config().clone(),
            RepoInfo { root },
            self.project.included_sources().clone(),
        )?;
        Ok(project)
    }

    pub fn frozenspec(&self) -> FrozenSpec {
        FrozenSpec {
            github: self.url().clone(),
            commit: self.resolved.commit.clone(),
            description: self
                .resolved
                .description
                .clone()
                .unwrap_or_else(|| self.resolved.commit.clone()),
        }
    }

    pub fn identity(&self) -> SourceIdentity {
        SourceIdentity::Remote {
            url: self.url().normalized(),
            commit: self.resolved.commit.clone(),
        }
    }

    pub fn declaration(&self) -> SourceDeclaration {
        SourceDeclaration::GitHub {
            repository: self.url().clone(),
            revision: self.request.clone(),
            description: self.declared_description.clone(),
        }
    }
}

impl PartialEq for RemoteSource {
    fn eq(&self, other: &Self) -> bool {
        self.url() == other.url() && self.resolved.commit == other.resolved.commit
    }
}

impl Eq for RemoteSource {}

impl Hash for RemoteSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.url().normalized(), &self.resolved.commit).hash(state)
    }
}

impl Display for RemoteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GitHub: {} @ {}", self.url().slug(), self.resolved)
    }
}

impl Debug for RemoteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<RemoteSource {self}>")
    }
}
