//! Store configuration loaded from `agora.toml`.
//!
//! ```toml
//! [store]
//! backend = "redis"
//! url = "${AGORA_REDIS_URL}"
//! prefix = "agora"
//! ```

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "agora.toml";

/// Overrides `store.url` when set.
pub const REDIS_URL_ENV: &str = "AGORA_REDIS_URL";

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap_or_else(|err| panic!("invalid env pattern: {err}"))
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("environment variable {name} is not set")]
    MissingVariable { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; contents vanish on exit.
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_redis_url(),
            prefix: default_prefix(),
        }
    }
}

fn default_redis_url() -> String {
    format!("${{{REDIS_URL_ENV}}}")
}

fn default_prefix() -> String {
    "agora".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgoraConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

impl AgoraConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolved Redis URL: `AGORA_REDIS_URL` if set, else `store.url` with `${VAR}` expanded.
    pub fn redis_url(&self) -> Result<String, ConfigError> {
        self.redis_url_with(|name| std::env::var(name).ok())
    }

    fn redis_url_with<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(REDIS_URL_ENV).filter(|url| !url.is_empty()) {
            return Ok(url);
        }
        expand_env(&self.store.url, lookup)
    }
}

/// Replaces every `${VAR}` in `value` using `lookup`.
pub fn expand_env<F>(value: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanded = String::with_capacity(value.len());
    let mut last = 0;
    for captures in ENV_REFERENCE.captures_iter(value) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let replacement = lookup(name.as_str()).ok_or_else(|| ConfigError::MissingVariable {
            name: name.as_str().to_string(),
        })?;
        expanded.push_str(&value[last..whole.start()]);
        expanded.push_str(&replacement);
        last = whole.end();
    }
    expanded.push_str(&value[last..]);
    Ok(expanded)
}

/// Looks for `agora.toml` in `start` and each of its ancestors.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}
