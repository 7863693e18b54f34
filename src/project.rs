use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashSet;
use log::debug;
use thiserror::Error;

use crate::{
    config::GlobalConfig,
    model::{descriptor::Descriptor, ParseError},
    source::SourceIdentity,
};

pub const DESCRIPTOR_FILE_NAME: &str = "sourcefetch.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub root: PathBuf,
}

/// Sources already pulled into a dependency walk.
///
/// Clones share the same set, so every configuration derived from one project
/// sees the sources included by the others.
#[derive(Debug, Clone, Default)]
pub struct IncludedSources(Arc<DashSet<SourceIdentity>>);

impl IncludedSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the source was already included.
    pub fn insert(&self, identity: SourceIdentity) -> bool {
        self.0.insert(identity)
    }

    pub fn contains(&self, identity: &SourceIdentity) -> bool {
        self.0.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn shares_with(&self, other: &IncludedSources) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Could not load {path}: {source}")]
    Descriptor {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// A project configuration, and a factory for configurations of the same kind.
pub trait ProjectConfig: Debug + Send + Sync {
    fn global_config(&self) -> &Arc<GlobalConfig>;

    fn repo_root(&self) -> Option<&Path>;

    fn included_sources(&self) -> &IncludedSources;

    /// Sources declared by this project, if it has a descriptor.
    fn descriptor(&self) -> Option<&Descriptor>;

    /// Builds a new configuration rooted at `repo_info.root`.
    fn derive(
        &self,
        global: Arc<GlobalConfig>,
        repo_info: RepoInfo,
        included_sources: IncludedSources,
    ) -> Result<Arc<dyn ProjectConfig>, ProjectError>;
}

#[derive(Debug, Clone)]
pub struct BaseProjectConfig {
    global: Arc<GlobalConfig>,
    repo_info: Option<RepoInfo>,
    included_sources: IncludedSources,
    descriptor: Option<Descriptor>,
}

impl BaseProjectConfig {
    /// A configuration that is not rooted in any repository.
    pub fn new(global: Arc<GlobalConfig>) -> Self {
        BaseProjectConfig {
            global,
            repo_info: None,
            included_sources: IncludedSources::new(),
            descriptor: None,
        }
    }

    /// A configuration rooted at `repo_info.root`, reading its descriptor when there is one.
    pub fn load(
        global: Arc<GlobalConfig>,
        repo_info: RepoInfo,
        included_sources: IncludedSources,
    ) -> Result<Self, ProjectError> {
        let descriptor_path = repo_info.root.join(DESCRIPTOR_FILE_NAME);
        let descriptor = if descriptor_path.is_file() {
            let descriptor =
                Descriptor::from_file(&descriptor_path).map_err(|source| {
                    ProjectError::Descriptor {
                        path: descriptor_path.display().to_string(),
                        source,
                    }
                })?;
            Some(descriptor)
        } else {
            debug!(
                "No {} in {}, assuming the project has no sources",
                DESCRIPTOR_FILE_NAME,
                repo_info.root.display()
            );
            None
        };
        Ok(BaseProjectConfig {
            global,
            repo_info: Some(repo_info),
            included_sources,
            descriptor,
        })
    }
}

impl ProjectConfig for BaseProjectConfig {
    fn global_config(&self) -> &Arc<GlobalConfig> {
        &self.global
    }

    fn repo_root(&self) -> Option<&Path> {
        self.repo_info.as_ref().map(|info| info.root.as_path())
    }

    fn included_sources(&self) -> &IncludedSources {
        &self.included_sources
    }

    fn descriptor(&self) -> Option<&Descriptor> {
        self.descriptor.as_ref()
    }

    fn derive(
        &self,
        global: Arc<GlobalConfig>,
        repo_info: RepoInfo,
        included_sources: IncludedSources,
    ) -> Result<Arc<dyn ProjectConfig>, ProjectError> {
        Ok(Arc::new(BaseProjectConfig::load(
            global,
            repo_info,
            included_sources,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn derive_loads_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DESCRIPTOR_FILE_NAME),
            "[sources.other]\npath = \"../other\"\n",
        )
        .unwrap();
        let parent = BaseProjectConfig::new(Arc::new(GlobalConfig::default()));

        let derived = parent
            .derive(
                parent.global_config().clone(),
                RepoInfo {
                    root: dir.path().to_path_buf(),
                },
                parent.included_sources().clone(),
            )
            .unwrap();

        assert_eq!(derived.repo_root(), Some(dir.path()));
        assert!(Arc::ptr_eq(derived.global_config(), parent.global_config()));
        assert!(derived
            .included_sources()
            .shares_with(parent.included_sources()));
        let descriptor = derived.descriptor().unwrap();
        assert_eq!(descriptor.sources.len(), 1);
    }

    #[test]
    fn derive_without_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let parent = BaseProjectConfig::new(Arc::new(GlobalConfig::default()));
        let derived = parent
            .derive(
                parent.global_config().clone(),
                RepoInfo {
                    root: dir.path().to_path_buf(),
                },
                IncludedSources::new(),
            )
            .unwrap();
        assert!(derived.descriptor().is_none());
    }

    #[test]
    fn derive_reports_broken_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DESCRIPTOR_FILE_NAME), "sources = 1").unwrap();
        let parent = BaseProjectConfig::new(Arc::new(GlobalConfig::default()));
        let error = parent
            .derive(
                parent.global_config().clone(),
                RepoInfo {
                    root: dir.path().to_path_buf(),
                },
                IncludedSources::new(),
            )
            .unwrap_err();
        assert!(error.to_string().contains(DESCRIPTOR_FILE_NAME), "{error}");
    }

    #[test]
    fn included_sources_are_shared_between_clones() {
        let included = IncludedSources::new();
        let clone = included.clone();
        let identity = SourceIdentity::LocalFolder {
            path: PathBuf::from("d"),
        };
        assert!(included.insert(identity.clone()));
        assert!(!clone.insert(identity.clone()));
        assert!(clone.contains(&identity));
        assert_eq!(included.len(), 1);
    }
}
