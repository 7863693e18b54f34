mod lock;

use std::fmt::{Display, Formatter};

use log::debug;
use thiserror::Error;

use crate::{
    github::{ApiError, RepositoryHandle},
    model::declaration::{RevisionRequest, SourceDeclaration},
    source::{Source, SourceContext, SourceError},
};

pub use lock::LockFileSourceResolver;

/// A concrete commit, and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedRef {
    pub commit: String,
    /// `tags/<tag>`, `<branch>` or `<ref>`; absent when the commit was requested directly.
    pub description: Option<String>,
}

impl ResolvedRef {
    pub fn commit(commit: impl Into<String>) -> Self {
        ResolvedRef {
            commit: commit.into(),
            description: None,
        }
    }

    fn described(commit: String, description: String) -> Self {
        ResolvedRef {
            commit,
            description: Some(description),
        }
    }
}

impl Display for ResolvedRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} ({})", description, self.commit),
            None => f.write_str(&self.commit),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Tag {tag} was not found")]
    TagNotFound { tag: String },
    #[error("Ref {reference} was not found")]
    RefNotFound { reference: String },
    #[error("Branch {branch} was not found")]
    BranchNotFound { branch: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Resolves `request` to a commit of `repository`.
///
/// Precedence: commit, tag, ref, branch. Without any of them the latest release
/// is used, or the default branch when the repository has no release.
pub fn resolve_ref(
    repository: &dyn RepositoryHandle,
    request: &RevisionRequest,
) -> Result<ResolvedRef, ResolveError> {
    match request {
        RevisionRequest::Commit(commit) => Ok(ResolvedRef::commit(commit.clone())),
        RevisionRequest::Tag(tag) => resolve_tag(repository, tag),
        RevisionRequest::Ref(reference) => {
            let commit = repository.get_ref(reference).map_err(|error| {
                not_found_as(error, || ResolveError::RefNotFound {
                    reference: reference.clone(),
                })
            })?;
            Ok(ResolvedRef::described(commit, reference.clone()))
        }
        RevisionRequest::Branch(branch) => resolve_branch(repository, branch),
        RevisionRequest::Latest => match repository.latest_release()? {
            Some(tag) => {
                debug!(
                    "Latest release of {} is {}",
                    repository.url().slug(),
                    tag
                );
                resolve_tag(repository, &tag)
            }
            None => {
                debug!(
                    "{} has no release, using default branch {}",
                    repository.url().slug(),
                    repository.default_branch()
                );
                resolve_branch(repository, repository.default_branch())
            }
        },
    }
}

fn resolve_tag(repository: &dyn RepositoryHandle, tag: &str) -> Result<ResolvedRef, ResolveError> {
    let commit = repository.get_tag_ref(tag).map_err(|error| {
        not_found_as(error, || ResolveError::TagNotFound {
            tag: tag.to_string(),
        })
    })?;
    Ok(ResolvedRef::described(commit, format!("tags/{tag}")))
}

fn resolve_branch(
    repository: &dyn RepositoryHandle,
    branch: &str,
) -> Result<ResolvedRef, ResolveError> {
    let commit = repository
        .get_ref(&format!("heads/{branch}"))
        .map_err(|error| {
            not_found_as(error, || ResolveError::BranchNotFound {
                branch: branch.to_string(),
            })
        })?;
    Ok(ResolvedRef::described(commit, branch.to_string()))
}

fn not_found_as(error: ApiError, not_found: impl FnOnce() -> ResolveError) -> ResolveError {
    if error.is_not_found() {
        not_found()
    } else {
        error.into()
    }
}

/// Turns a named declaration into a source.
pub trait SourceResolver {
    fn resolve(&self, name: &str, declaration: &SourceDeclaration) -> Result<Source, SourceError>;
}

impl<T: SourceResolver + ?Sized> SourceResolver for &T {
    fn resolve(&self, name: &str, declaration: &SourceDeclaration) -> Result<Source, SourceError> {
        (**self).resolve(name, declaration)
    }
}

impl SourceResolver for SourceContext {
    fn resolve(&self, name: &str, declaration: &SourceDeclaration) -> Result<Source, SourceError> {
        debug!("Resolving {} from {}", name, declaration);
        Source::new(self, declaration)
    }
}
