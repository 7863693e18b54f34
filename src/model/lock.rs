use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{
    declaration::{RevisionRequest, SourceDeclaration},
    repository::RepositoryUrl,
    ParseError,
};

/// Minimal pin of a resolved remote source.
///
/// Feeding it back as a declaration yields a source with the same identity
/// without resolving any tag, ref or branch again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FrozenSpec {
    pub github: RepositoryUrl,
    pub commit: String,
    pub description: String,
}

impl From<FrozenSpec> for SourceDeclaration {
    fn from(frozen: FrozenSpec) -> Self {
        SourceDeclaration::GitHub {
            repository: frozen.github,
            revision: RevisionRequest::Commit(frozen.commit),
            description: Some(frozen.description),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockFile {
    #[serde(default)]
    pub sources: Vec<LockedSource>,
}

const VERSION: i64 = 1;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct VersionedLockFile<'a> {
    pub version: i64,
    #[serde(flatten)]
    pub content: &'a LockFile,
}

impl LockFile {
    pub fn from_file(file: &Path) -> Result<LockFile, ParseError> {
        LockFile::from_str(&std::fs::read_to_string(file)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<LockFile, ParseError> {
        let mut table = toml::from_str::<toml::Table>(s)?;
        match table.remove("version") {
            Some(toml::Value::Integer(VERSION)) => table.try_into::<LockFile>().map_err(Into::into),
            Some(other) => Err(ParseError::UnsupportedLockFileVersion(other)),
            None => Err(ParseError::MissingLockFileVersion),
        }
    }

    pub fn to_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&VersionedLockFile {
            version: VERSION,
            content: self,
        })
    }

    pub fn find(&self, name: &str) -> Option<&LockedSource> {
        self.sources.iter().find(|source| source.name == name)
    }
}

/// A lock file entry: the declaration it was produced from and the resulting pin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedSource {
    pub name: String,
    pub request: RevisionRequest,
    #[serde(flatten)]
    pub frozen: FrozenSpec,
}

impl LockedSource {
    /// Whether this entry was locked from `declaration`.
    pub fn matches(&self, declaration: &SourceDeclaration) -> bool {
        match declaration {
            SourceDeclaration::GitHub {
                repository,
                revision,
                ..
            } => repository == &self.frozen.github && revision == &self.request,
            SourceDeclaration::LocalFolder { .. } => false,
        }
    }
}
