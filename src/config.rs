use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Settings shared by every project configuration of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub cache_dir: Option<PathBuf>,
    pub github: GitHubSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubSettings {
    /// Overrides the API root derived from the repository host.
    pub api: Option<String>,
    pub timeout: Option<Duration>,
    pub username: Option<String>,
    pub token: Option<String>,
    pub email: Option<String>,
}

impl GlobalConfig {
    /// Loads `SOURCEFETCH_*` environment variables, on top of an optional config file.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(file, None)?;
        Ok(raw_config.into())
    }
}

impl From<RawConfig> for GlobalConfig {
    fn from(raw: RawConfig) -> Self {
        GlobalConfig {
            cache_dir: raw.cache.dir,
            github: GitHubSettings {
                api: raw.github.api,
                timeout: raw.github.timeout.map(Duration::from_secs),
                username: raw.github.username,
                token: raw.github.token,
                email: raw.github.email,
            },
        }
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    github: GitHubConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct CacheConfig {
    dir: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct GitHubConfig {
    api: Option<String>,
    timeout: Option<u64>,
    username: Option<String>,
    token: Option<String>,
    email: Option<String>,
}

impl RawConfig {
    fn load(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix("SOURCEFETCH")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
