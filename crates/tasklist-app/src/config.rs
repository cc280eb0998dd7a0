//! File and environment configuration for the task list client.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tasklist_core::FilterMode;
use tasklist_remote::{DEFAULT_BASE_URL, DEFAULT_COLLECTION_PATH, GatewayConfig};

/// File looked up in the working directory when no explicit path is given.
pub const CONFIG_FILE: &str = "tasklist.toml";
/// Environment variable overriding `remote.base_url`.
pub const ENV_BASE_URL: &str = "TASKLIST_BASE_URL";
/// Environment variable overriding `remote.collection_path`.
pub const ENV_COLLECTION_PATH: &str = "TASKLIST_COLLECTION_PATH";

/// Top-level client configuration loaded from `tasklist.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the task collection lives.
    #[serde(default)]
    pub remote: RemoteSettings,
    /// Startup presentation state.
    #[serde(default)]
    pub view: ViewSettings,
}

impl AppConfig {
    /// Resolve configuration: explicit file (must exist) or `./tasklist.toml`
    /// (optional), then environment overrides, then validation.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or parsed, or when the
    /// resulting settings are invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::from_dir(".")?,
        };
        let mut fetch = |key: &'static str| env::var(key).ok();
        let config = config.with_env_overrides(&mut fetch);
        config.validate()?;
        Ok(config)
    }

    /// Load `tasklist.toml` from a directory, falling back to defaults when absent.
    ///
    /// # Errors
    /// See [`Self::from_file`].
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = dir.as_ref().join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(config_path)
    }

    /// Load and validate a specific configuration file.
    ///
    /// # Errors
    /// Returns an error when the file is missing, malformed or invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let contents =
            fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TASKLIST_*` overrides; blank values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self, fetch: &mut impl FnMut(&'static str) -> Option<String>) -> Self {
        if let Some(url) = env_value(ENV_BASE_URL, fetch) {
            self.remote.base_url = url;
        }
        if let Some(path) = env_value(ENV_COLLECTION_PATH, fetch) {
            self.remote.collection_path = path;
        }
        self
    }

    /// Build gateway settings from the `[remote]` section.
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        let config = GatewayConfig::new(&self.remote.base_url, &self.remote.collection_path);
        match self.remote.timeout_secs {
            Some(secs) => config.timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    /// Check that the configuration can produce a working gateway.
    ///
    /// # Errors
    /// Returns an error for a zero timeout or an unusable URL.
    pub fn validate(&self) -> Result<()> {
        if self.remote.timeout_secs == Some(0) {
            bail!("remote.timeout_secs must be greater than zero");
        }
        self.gateway_config()
            .collection_url()
            .context("invalid [remote] configuration")?;
        Ok(())
    }
}

/// `[remote]` block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Scheme, host and port of the server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Absolute path of the collection resource.
    #[serde(default = "default_collection_path")]
    pub collection_path: String,
    /// Per-request timeout; the transport default applies when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection_path: default_collection_path(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_collection_path() -> String {
    DEFAULT_COLLECTION_PATH.to_owned()
}

/// `[view]` block.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub struct ViewSettings {
    /// Filter mode selected at startup.
    #[serde(default)]
    pub default_filter: FilterMode,
}

fn env_value(key: &'static str, fetch: &mut impl FnMut(&'static str) -> Option<String>) -> Option<String> {
    fetch(key).and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}
