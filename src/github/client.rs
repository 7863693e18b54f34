use std::sync::Arc;

use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{de::DeserializeOwned, Deserialize};

use crate::model::repository::RepositoryUrl;

use super::{ApiError, ApiResponse, RepositoryHandle, RepositoryProvider, Transport};

/// Opens repositories on GitHub or a GitHub Enterprise host.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    api_root: Option<String>,
}

impl GitHubClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        GitHubClient {
            transport,
            api_root: None,
        }
    }

    /// Sends every request to `api_root` instead of the root derived from the repository host.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = Some(api_root.into().trim_end_matches('/').to_string());
        self
    }

    fn repository_endpoint(&self, url: &RepositoryUrl) -> String {
        let api_root = self.api_root.clone().unwrap_or_else(|| url.api_root());
        format!(
            "{}/repos/{}/{}",
            api_root,
            encode_path(&url.owner),
            encode_path(&url.name)
        )
    }
}

/// Characters that cannot appear verbatim in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// Percent-encodes every `/`-separated segment of `path`, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

impl RepositoryProvider for GitHubClient {
    fn open(&self, url: &RepositoryUrl) -> Result<Arc<dyn RepositoryHandle>, ApiError> {
        let endpoint = self.repository_endpoint(url);
        debug!("Looking up repository {}", url.slug());
        let metadata: RepositoryMetadata = get_json(self.transport.as_ref(), &endpoint)?;
        Ok(Arc::new(GitHubRepository {
            url: url.clone(),
            default_branch: metadata.default_branch,
            endpoint,
            transport: self.transport.clone(),
        }))
    }
}

pub struct GitHubRepository {
    url: RepositoryUrl,
    default_branch: String,
    endpoint: String,
    transport: Arc<dyn Transport>,
}

impl RepositoryHandle for GitHubRepository {
    fn url(&self) -> &RepositoryUrl {
        &self.url
    }

    fn default_branch(&self) -> &str {
        &self.default_branch
    }

    fn get_ref(&self, path: &str) -> Result<String, ApiError> {
        let url = format!("{}/git/refs/{}", self.endpoint, encode_path(path));
        let full_ref = format!("refs/{path}");
        // A partial ref name answers with every ref sharing the prefix.
        let refs = match get_json::<RefResponse>(self.transport.as_ref(), &url)? {
            RefResponse::Single(git_ref) => vec![git_ref],
            RefResponse::Many(refs) => refs,
        };
        refs.into_iter()
            .find(|git_ref| git_ref.reference == full_ref)
            .map(|git_ref| git_ref.object.sha)
            .ok_or(ApiError::NotFound { url })
    }

    fn latest_release(&self) -> Result<Option<String>, ApiError> {
        let url = format!("{}/releases/latest", self.endpoint);
        match get_json::<Release>(self.transport.as_ref(), &url) {
            Ok(release) => Ok(Some(release.tag_name)),
            Err(ApiError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn download_snapshot(&self, commit: &str) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/zipball/{}", self.endpoint, encode_path(commit));
        debug!("Downloading {} at {}", self.url.slug(), commit);
        let response = self.transport.get(&url)?;
        Ok(check_status(&url, response)?.body)
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryMetadata {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    #[serde(rename = "ref")]
    reference: String,
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RefResponse {
    Single(GitRef),
    Many(Vec<GitRef>),
}

fn check_status(url: &str, response: ApiResponse) -> Result<ApiResponse, ApiError> {
    match response.status {
        _ if response.is_success() => Ok(response),
        404 => Err(ApiError::NotFound {
            url: url.to_string(),
        }),
        status @ (401 | 403) => Err(ApiError::Unauthorized {
            url: url.to_string(),
            status,
        }),
        status => Err(ApiError::Status {
            url: url.to_string(),
            status,
        }),
    }
}

fn get_json<T: DeserializeOwned>(transport: &dyn Transport, url: &str) -> Result<T, ApiError> {
    let response = check_status(url, transport.get(url)?)?;
    serde_json::from_slice(&response.body).map_err(|source| ApiError::Json {
        url: url.to_string(),
        source,
    })
}
