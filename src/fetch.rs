use std::{collections::HashSet, sync::Arc};

use log::{debug, info};
use thiserror::Error;

use crate::{
    model::{
        declaration::SourceDeclaration,
        descriptor::Descriptor,
        lock::{LockFile, LockedSource},
    },
    project::{IncludedSources, ProjectConfig},
    resolver::SourceResolver,
    source::{Source, SourceError},
};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Error while resolving {name}: {source}")]
    Resolve {
        name: String,
        #[source]
        source: SourceError,
    },
    #[error("Error while fetching {name}: {source}")]
    Fetch {
        name: String,
        #[source]
        source: SourceError,
    },
}

/// A descriptor entry together with the source it resolved to.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub name: String,
    pub declaration: SourceDeclaration,
    pub source: Source,
}

#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub name: String,
    pub source: Source,
    pub project: Arc<dyn ProjectConfig>,
}

/// Resolves every source of `descriptor`.
pub fn resolve<R: SourceResolver>(
    descriptor: &Descriptor,
    resolver: &R,
) -> Result<Vec<ResolvedSource>, FetchError> {
    descriptor
        .sources
        .iter()
        .map(|(name, declaration)| {
            info!("Resolving {} ({})", name, declaration);
            let source =
                resolver
                    .resolve(name, declaration)
                    .map_err(|source| FetchError::Resolve {
                        name: name.clone(),
                        source,
                    })?;
            debug!("Resolved {} to {}", name, source);
            Ok(ResolvedSource {
                name: name.clone(),
                declaration: declaration.clone(),
                source,
            })
        })
        .collect()
}

/// Builds the lock file for resolved sources. Local folders are not locked.
pub fn lock(resolved: &[ResolvedSource]) -> LockFile {
    let mut sources = Vec::new();
    for entry in resolved {
        let (Source::Remote(remote), SourceDeclaration::GitHub { revision, .. }) =
            (&entry.source, &entry.declaration)
        else {
            debug!("Not locking local folder {}", entry.name);
            continue;
        };
        info!("Locking {} at {}", entry.name, remote.commit());
        sources.push(LockedSource {
            name: entry.name.clone(),
            request: revision.clone(),
            frozen: remote.frozenspec(),
        });
    }
    LockFile { sources }
}

/// Fetches resolved sources in parallel.
///
/// Sources sharing an identity are fetched once per call. Every source that was
/// fetched successfully is recorded in `included`; earlier entries never cause a
/// source to be skipped, so fetching again restores a cleared cache.
pub fn fetch_sources(
    resolved: &[ResolvedSource],
    included: &IncludedSources,
) -> Result<Vec<FetchedSource>, FetchError> {
    let mut seen = HashSet::new();
    let unique = resolved
        .iter()
        .filter(|entry| {
            let first = seen.insert(entry.source.identity());
            if !first {
                debug!("Skipping {}, {} is fetched already", entry.name, entry.source);
            }
            first
        })
        .collect::<Vec<_>>();

    std::thread::scope(|scope| {
        let handles = unique
            .into_iter()
            .map(|entry| {
                scope.spawn(move || {
                    let project = entry.source.fetch().map_err(|source| FetchError::Fetch {
                        name: entry.name.clone(),
                        source,
                    })?;
                    included.insert(entry.source.identity());
                    Ok(FetchedSource {
                        name: entry.name.clone(),
                        source: entry.source.clone(),
                        project,
                    })
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        github::testing::{snapshot_zip, FakeTransport, API},
        model::{declaration::RevisionRequest, repository::RepositoryUrl},
        source::tests::context,
    };

    use pretty_assertions::assert_eq;

    fn descriptor(sources: &[(&str, SourceDeclaration)]) -> Descriptor {
        Descriptor {
            name: Some("test".to_string()),
            sources: sources
                .iter()
                .map(|(name, declaration)| (name.to_string(), declaration.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn transport() -> Arc<FakeTransport> {
        let transport = FakeTransport::with_repository("TestOwner", "TestRepo", "master");
        transport.release("TestOwner", "TestRepo", "release/1.0");
        transport.git_ref("TestOwner", "TestRepo", "tags/release/1.0", "tag_sha");
        transport.git_ref("TestOwner", "TestRepo", "heads/master", "branch_sha");
        transport.zipball(
            "TestOwner",
            "TestRepo",
            "tag_sha",
            snapshot_zip("top", &[("README", "tag")]),
        );
        transport
    }

    #[test]
    fn lock_skips_local_folders() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(transport(), dir.path());
        let descriptor = descriptor(&[
            (
                "latest",
                SourceDeclaration::github("https://github.com/TestOwner/TestRepo").unwrap(),
            ),
            (
                "main",
                SourceDeclaration::github("https://github.com/TestOwner/TestRepo")
                    .unwrap()
                    .with_revision(RevisionRequest::Branch("master".to_string())),
            ),
            ("local", SourceDeclaration::local_folder("d")),
        ]);

        let resolved = resolve(&descriptor, &context).unwrap();
        let lock_file = lock(&resolved);

        let summary = lock_file
            .sources
            .iter()
            .map(|s| (s.name.as_str(), s.request.to_string(), s.frozen.commit.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("latest", "latest".to_string(), "tag_sha"),
                ("main", "branch:master".to_string(), "branch_sha"),
            ]
        );
        assert_eq!(
            lock_file.sources[0].frozen.github,
            RepositoryUrl::new("github.com", "TestOwner", "TestRepo")
        );
    }

    #[test]
    fn resolve_failure_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(transport(), dir.path());
        let descriptor = descriptor(&[(
            "broken",
            SourceDeclaration::github("https://github.com/TestOwner/TestRepo")
                .unwrap()
                .with_revision(RevisionRequest::Tag("v9".to_string())),
        )]);

        let error = resolve(&descriptor, &context).unwrap_err();

        assert!(error.to_string().starts_with("Error while resolving broken"), "{error}");
    }

    #[test]
    fn fetch_deduplicates_sources() {
        let dir = tempfile::tempdir().unwrap();
        let transport = transport();
        let context = context(transport.clone(), &dir.path().join("cache"));
        let local = dir.path().join("local");
        std::fs::create_dir(&local).unwrap();
        let descriptor = descriptor(&[
            (
                "a",
                SourceDeclaration::github("https://github.com/TestOwner/TestRepo").unwrap(),
            ),
            (
                "b",
                SourceDeclaration::github("https://github.com/TestOwner/TestRepo.git")
                    .unwrap()
                    .with_revision(RevisionRequest::Commit("tag_sha".to_string())),
            ),
            ("c", SourceDeclaration::local_folder(&local)),
        ]);
        let resolved = resolve(&descriptor, &context).unwrap();
        let included = context.project().included_sources().clone();

        let fetched = fetch_sources(&resolved, &included).unwrap();

        let names = fetched.iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(included.len(), 2);
        assert_eq!(
            transport.call_count(&format!("{API}/repos/TestOwner/TestRepo/zipball/tag_sha")),
            1
        );
        assert_eq!(
            fetched[1].project.repo_root(),
            Some(local.canonicalize().unwrap().as_path())
        );
    }

    #[test]
    fn failed_fetch_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let transport = transport();
        let context = context(transport.clone(), dir.path());
        let descriptor = descriptor(&[(
            "main",
            SourceDeclaration::github("https://github.com/TestOwner/TestRepo")
                .unwrap()
                .with_revision(RevisionRequest::Branch("master".to_string())),
        )]);
        let resolved = resolve(&descriptor, &context).unwrap();
        let included = IncludedSources::new();

        fetch_sources(&resolved, &included).unwrap_err();
        assert!(included.is_empty());

        transport.zipball(
            "TestOwner",
            "TestRepo",
            "branch_sha",
            snapshot_zip("top", &[("README", "branch")]),
        );
        let fetched = fetch_sources(&resolved, &included).unwrap();

        assert_eq!(fetched.len(), 1);
        assert!(included.contains(&resolved[0].source.identity()));
        assert!(dir.path().join("TestRepo/branch_sha/README").is_file());
    }

    #[test]
    fn fetch_again_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(transport(), dir.path());
        let descriptor = descriptor(&[(
            "latest",
            SourceDeclaration::github("https://github.com/TestOwner/TestRepo").unwrap(),
        )]);
        let resolved = resolve(&descriptor, &context).unwrap();
        let included = IncludedSources::new();

        assert_eq!(fetch_sources(&resolved, &included).unwrap().len(), 1);
        assert_eq!(fetch_sources(&resolved, &included).unwrap().len(), 1);
        assert_eq!(included.len(), 1);
    }

    #[test]
    fn fetch_failure_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(transport(), dir.path());
        let descriptor = descriptor(&[(
            "main",
            SourceDeclaration::github("https://github.com/TestOwner/TestRepo")
                .unwrap()
                .with_revision(RevisionRequest::Branch("master".to_string())),
        )]);
        let resolved = resolve(&descriptor, &context).unwrap();

        let error = fetch_sources(&resolved, &IncludedSources::new()).unwrap_err();

        assert!(
            matches!(&error, FetchError::Fetch { name, .. } if name == "main"),
            "{error}"
        );
    }
}
