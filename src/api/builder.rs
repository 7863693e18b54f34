use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::anyhow;
use home::home_dir;

use crate::{
    cache::SnapshotCache,
    config::GlobalConfig,
    credentials::EnvKeychain,
    github::{GitHubClient, HttpTransport, RepositoryProvider},
    project::{BaseProjectConfig, IncludedSources, RepoInfo},
    source::SourceContext,
    Sourcefetch,
};

#[derive(Default)]
pub struct SourcefetchBuilder {
    // All other paths are relative to `root`
    root: Option<PathBuf>,
    module_file_name: Option<PathBuf>,
    lock_file_name: Option<PathBuf>,
    cache_directory_path: Option<PathBuf>,
    config_file: Option<PathBuf>,

    api_root: Option<String>,
    timeout: Option<Duration>,
    username: Option<String>,
    token: Option<String>,

    repository_provider: Option<Arc<dyn RepositoryProvider>>,
}

impl SourcefetchBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Name of the descriptor toml file.
    ///
    /// Defaults to `sourcefetch.toml`.
    pub fn module_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_file_name = Some(path.into());
        self
    }

    /// Name of the lock file.
    ///
    /// Defaults to `sourcefetch.lock`.
    pub fn lock_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_file_name = Some(path.into());
        self
    }

    /// Location of the snapshot cache directory.
    ///
    /// Defaults to `SOURCEFETCH_CACHE_DIR`, then `$HOME/.sourcefetch/cache`.
    pub fn cache_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_directory_path = Some(path.into());
        self
    }

    /// Configuration file read before the `SOURCEFETCH_*` environment variables.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// GitHub API root, for GitHub Enterprise or test servers.
    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = Some(api_root.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.token = Some(token.into());
        self
    }

    /// Replaces the HTTP GitHub client. Credentials, api root and timeout are then ignored.
    pub fn repository_provider(mut self, provider: Arc<dyn RepositoryProvider>) -> Self {
        self.repository_provider = Some(provider);
        self
    }

    pub fn try_build(self) -> anyhow::Result<Sourcefetch> {
        let Self {
            root,
            module_file_name,
            lock_file_name,
            cache_directory_path,
            config_file,
            api_root,
            timeout,
            username,
            token,
            repository_provider,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let module_file_name =
            module_file_name.unwrap_or_else(|| PathBuf::from("sourcefetch.toml"));

        let lock_file_name = lock_file_name.unwrap_or_else(|| PathBuf::from("sourcefetch.lock"));

        let mut global = GlobalConfig::load(config_file.as_deref())?;
        global.github.api = api_root.or(global.github.api);
        global.github.timeout = timeout.or(global.github.timeout);
        if username.is_some() {
            global.github.username = username;
            global.github.token = token;
        }

        let cache_directory = match cache_directory_path.or_else(|| global.cache_dir.clone()) {
            Some(path) => root.join(path),
            None => default_cache_directory()?,
        };
        let cache = SnapshotCache::new(cache_directory)?;

        let repositories: Arc<dyn RepositoryProvider> = match repository_provider {
            Some(provider) => provider,
            None => {
                let keychain = Arc::new(EnvKeychain::new(&global.github));
                let transport = HttpTransport::new(keychain, global.github.timeout)?;
                let mut client = GitHubClient::new(Arc::new(transport));
                if let Some(api) = &global.github.api {
                    client = client.with_api_root(api.as_str());
                }
                Arc::new(client)
            }
        };

        let project = BaseProjectConfig::load(
            Arc::new(global),
            RepoInfo { root: root.clone() },
            IncludedSources::new(),
        )?;

        Ok(Sourcefetch {
            context: SourceContext::new(Arc::new(project), repositories, Arc::new(cache)),
            root,
            module_file_name,
            lock_file_name,
        })
    }
}

fn default_cache_directory() -> anyhow::Result<PathBuf> {
    let mut cache_directory = home_dir()
        .ok_or_else(|| anyhow!("Could not find home dir. Please define $HOME env variable."))?;
    cache_directory.push(".sourcefetch/cache");
    Ok(cache_directory)
}
