use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
    str::FromStr,
};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{repository::RepositoryUrl, ParseError};

/// Revision of a remote repository that a declaration asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum RevisionRequest {
    /// Latest release, or the default branch when the repository has no releases.
    #[default]
    Latest,
    Commit(String),
    Tag(String),
    Ref(String),
    Branch(String),
}

impl Display for RevisionRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RevisionRequest::Latest => f.write_str("latest"),
            RevisionRequest::Commit(commit) => write!(f, "commit:{commit}"),
            RevisionRequest::Tag(tag) => write!(f, "tag:{tag}"),
            RevisionRequest::Ref(reference) => write!(f, "ref:{reference}"),
            RevisionRequest::Branch(branch) => write!(f, "branch:{branch}"),
        }
    }
}

impl FromStr for RevisionRequest {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "latest" {
            return Ok(RevisionRequest::Latest);
        }
        let invalid = || ParseError::InvalidRevisionRequest(s.to_string());
        let (kind, value) = s.split_once(':').ok_or_else(invalid)?;
        if value.is_empty() {
            return Err(invalid());
        }
        let value = value.to_string();
        match kind {
            "commit" => Ok(RevisionRequest::Commit(value)),
            "tag" => Ok(RevisionRequest::Tag(value)),
            "ref" => Ok(RevisionRequest::Ref(value)),
            "branch" => Ok(RevisionRequest::Branch(value)),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for RevisionRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RevisionRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

/// A dependency declaration, as written in a descriptor or produced by a frozenspec.
///
/// Accepted mappings:
/// - `{ github = "<url>" }`, optionally with exactly one of `commit`, `tag`, `ref`
///   or `branch`. A `description` may accompany `commit`.
/// - `{ path = "<local directory>" }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDeclaration", into = "RawDeclaration")]
pub enum SourceDeclaration {
    GitHub {
        repository: RepositoryUrl,
        revision: RevisionRequest,
        description: Option<String>,
    },
    LocalFolder {
        path: PathBuf,
    },
}

impl SourceDeclaration {
    pub fn github(url: &str) -> Result<SourceDeclaration, ParseError> {
        Ok(SourceDeclaration::GitHub {
            repository: RepositoryUrl::parse(url)?,
            revision: RevisionRequest::Latest,
            description: None,
        })
    }

    pub fn local_folder(path: impl Into<PathBuf>) -> SourceDeclaration {
        SourceDeclaration::LocalFolder { path: path.into() }
    }

    /// Replaces the requested revision of a remote declaration.
    pub fn with_revision(self, revision: RevisionRequest) -> SourceDeclaration {
        match self {
            SourceDeclaration::GitHub { repository, .. } => SourceDeclaration::GitHub {
                repository,
                revision,
                description: None,
            },
            local => local,
        }
    }

    pub fn from_toml_str(data: &str) -> Result<SourceDeclaration, ParseError> {
        Ok(toml::from_str(data)?)
    }
}

impl Display for SourceDeclaration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceDeclaration::GitHub {
                repository,
                revision,
                ..
            } => write!(f, "{} ({})", repository.slug(), revision),
            SourceDeclaration::LocalFolder { path } => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeclaration {
    #[serde(skip_serializing_if = "Option::is_none")]
    github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl TryFrom<RawDeclaration> for SourceDeclaration {
    type Error = ParseError;

    fn try_from(raw: RawDeclaration) -> Result<Self, Self::Error> {
        let RawDeclaration {
            github,
            path,
            commit,
            tag,
            reference,
            branch,
            description,
        } = raw;

        let mut modifiers = Vec::new();
        if let Some(commit) = commit {
            modifiers.push(RevisionRequest::Commit(commit));
        }
        if let Some(tag) = tag {
            modifiers.push(RevisionRequest::Tag(tag));
        }
        if let Some(reference) = reference {
            modifiers.push(RevisionRequest::Ref(reference));
        }
        if let Some(branch) = branch {
            modifiers.push(RevisionRequest::Branch(branch));
        }

        match (github, path) {
            (Some(_), Some(_)) => Err(ParseError::InvalidDeclaration(
                "`github` and `path` cannot be combined".to_string(),
            )),
            (None, None) => Err(ParseError::InvalidDeclaration(
                "expected either `github` or `path`".to_string(),
            )),
            (None, Some(path)) => {
                if !modifiers.is_empty() || description.is_some() {
                    return Err(ParseError::InvalidDeclaration(format!(
                        "local folder {} does not accept revision modifiers",
                        path.display()
                    )));
                }
                Ok(SourceDeclaration::LocalFolder { path })
            }
            (Some(url), None) => {
                if modifiers.len() > 1 {
                    return Err(ParseError::InvalidDeclaration(format!(
                        "{url} specifies more than one of `commit`, `tag`, `ref` and `branch`"
                    )));
                }
                let revision = modifiers.pop().unwrap_or_default();
                if description.is_some() && !matches!(revision, RevisionRequest::Commit(_)) {
                    return Err(ParseError::InvalidDeclaration(format!(
                        "{url} may only carry a `description` next to a `commit`"
                    )));
                }
                Ok(SourceDeclaration::GitHub {
                    repository: RepositoryUrl::parse(&url)?,
                    revision,
                    description,
                })
            }
        }
    }
}

impl From<SourceDeclaration> for RawDeclaration {
    fn from(declaration: SourceDeclaration) -> Self {
        match declaration {
            SourceDeclaration::LocalFolder { path } => RawDeclaration {
                path: Some(path),
                ..Default::default()
            },
            SourceDeclaration::GitHub {
                repository,
                revision,
                description,
            } => {
                let mut raw = RawDeclaration {
                    github: Some(repository.normalized()),
                    description,
                    ..Default::default()
                };
                match revision {
                    RevisionRequest::Latest => {}
                    RevisionRequest::Commit(commit) => raw.commit = Some(commit),
                    RevisionRequest::Tag(tag) => raw.tag = Some(tag),
                    RevisionRequest::Ref(reference) => raw.reference = Some(reference),
                    RevisionRequest::Branch(branch) => raw.branch = Some(branch),
                }
                raw
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_latest() {
        let declaration = SourceDeclaration::from_toml_str(
            r#"github = "https://github.com/TestOwner/TestRepo.git""#,
        )
        .unwrap();
        assert_eq!(
            declaration,
            SourceDeclaration::GitHub {
                repository: RepositoryUrl::new("github.com", "TestOwner", "TestRepo"),
                revision: RevisionRequest::Latest,
                description: None,
            }
        );
    }

    #[test]
    fn parse_modifiers() {
        let cases = [
            ("commit = \"abcdef\"", RevisionRequest::Commit("abcdef".into())),
            ("tag = \"release/1.0\"", RevisionRequest::Tag("release/1.0".into())),
            ("ref = \"heads/main\"", RevisionRequest::Ref("heads/main".into())),
            ("branch = \"main\"", RevisionRequest::Branch("main".into())),
        ];
        for (modifier, expected) in cases {
            let text = format!("github = \"https://github.com/o/r\"\n{modifier}");
            match SourceDeclaration::from_toml_str(&text).unwrap() {
                SourceDeclaration::GitHub { revision, .. } => assert_eq!(revision, expected),
                other => panic!("unexpected declaration {other:?}"),
            }
        }
    }

    #[test]
    fn parse_local_folder() {
        let declaration = SourceDeclaration::from_toml_str(r#"path = "../other""#).unwrap();
        assert_eq!(declaration, SourceDeclaration::local_folder("../other"));
    }

    #[test]
    fn reject_more_than_one_modifier() {
        let error = SourceDeclaration::from_toml_str(
            "github = \"https://github.com/o/r\"\ntag = \"v1\"\nbranch = \"main\"",
        )
        .expect_err("ambiguous declaration");
        assert!(error.to_string().contains("more than one"), "{error}");
    }

    #[test]
    fn reject_malformed_declarations() {
        for text in [
            "",
            "github = \"https://github.com/o/r\"\npath = \"x\"",
            "path = \"x\"\nbranch = \"main\"",
            "github = \"https://github.com/o/r\"\ntag = \"v1\"\ndescription = \"v1\"",
            "github = \"https://github.com/o/r\"\nrelease = \"latest\"",
            "github = \"https://github.com/o\"",
        ] {
            SourceDeclaration::from_toml_str(text).expect_err(text);
        }
    }

    #[test]
    fn frozen_declaration_keeps_description() {
        let declaration = SourceDeclaration::from_toml_str(
            "github = \"https://github.com/o/r\"\ncommit = \"abc\"\ndescription = \"tags/v1\"",
        )
        .unwrap();
        let raw = RawDeclaration::from(declaration);
        assert_eq!(raw.commit.as_deref(), Some("abc"));
        assert_eq!(raw.description.as_deref(), Some("tags/v1"));
        assert_eq!(raw.github.as_deref(), Some("https://github.com/o/r"));
    }

    #[test]
    fn revision_request_text_form() {
        for text in ["latest", "commit:abc", "tag:release/1.0", "ref:heads/x", "branch:main"] {
            let request: RevisionRequest = text.parse().unwrap();
            assert_eq!(request.to_string(), text);
        }
        "tag:".parse::<RevisionRequest>().expect_err("empty value");
        "release:1".parse::<RevisionRequest>().expect_err("unknown kind");
    }
}
