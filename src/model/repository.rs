use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
    str::FromStr,
};

use regex_lite::Regex;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::model::ParseError;

/// Location of a repository on a GitHub-style forge.
///
/// Equality and hashing only look at the normalized parts, so
/// `https://github.com/o/r.git` and `https://github.com/o/r/` are the same repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct RepositoryUrl {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepositoryUrl {
    pub fn new(
        host: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> RepositoryUrl {
        RepositoryUrl {
            host: host.into(),
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn parse(url: &str) -> Result<RepositoryUrl, ParseError> {
        let re: Regex = Regex::new(
            r"^(?:(?:https?|ssh)://(?:[^@/]+@)?|[^@/:]+@)?(?P<host>[^/:@]+)[/:](?P<owner>[^/]+)/(?P<name>[^/]+?)(?:\.git)?/?$",
        )
        .expect("repository url pattern is valid");
        let captures = re.captures(url.trim());
        let captures = captures.as_ref();

        let component = |component: &str| {
            captures
                .and_then(|c| c.name(component))
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ParseError::MissingUrlComponent(component.to_string(), url.to_string())
                })
                .and_then(|value| {
                    // Owner and name end up as cache directories.
                    if value == "." || value == ".." {
                        Err(ParseError::InvalidUrlComponent(
                            component.to_string(),
                            url.to_string(),
                        ))
                    } else {
                        Ok(value)
                    }
                })
        };

        Ok(RepositoryUrl {
            host: component("host")?,
            owner: component("owner")?,
            name: component("name")?,
        })
    }

    /// `https://<host>/<owner>/<name>`, without `.git` or a trailing slash.
    pub fn normalized(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.name)
    }

    /// Root of the REST API serving this repository's forge.
    pub fn api_root(&self) -> String {
        if self.host == "github.com" {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", self.host)
        }
    }

    /// `owner/name`, as shown to users.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(&self.name)
    }
}

impl Display for RepositoryUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized())
    }
}

impl FromStr for RepositoryUrl {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepositoryUrl::parse(s)
    }
}

impl Serialize for RepositoryUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.normalized())
    }
}

impl<'de> Deserialize<'de> for RepositoryUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let url = String::deserialize(deserializer)?;
        RepositoryUrl::parse(&url).map_err(D::Error::custom)
    }
}
