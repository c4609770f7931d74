//! Resolver settings (YAML file + environment overrides)
//!
//! User-level settings live at `~/.config/gcpkit/config.yaml`. Every field is
//! optional in the file; absent fields take the defaults below.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Default Secret Manager REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://secretmanager.googleapis.com/v1";

/// Environment variable conventionally holding a pre-minted OAuth access token
pub const DEFAULT_TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Host of the GCE / Cloud Run metadata server
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Environment variable overriding the metadata server host
pub const METADATA_HOST_ENV_VAR: &str = "GCE_METADATA_HOST";

pub const ENDPOINT_ENV_VAR: &str = "GCPKIT_SECRETMANAGER_ENDPOINT";
pub const TOKEN_ENV_VAR_ENV_VAR: &str = "GCPKIT_TOKEN_ENV_VAR";
pub const USE_METADATA_ENV_VAR: &str = "GCPKIT_USE_METADATA_SERVER";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_token_env_var() -> String {
    DEFAULT_TOKEN_ENV_VAR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("gcpkit/{}", env!("CARGO_PKG_VERSION"))
}

/// Settings for [`SecretResolver`](crate::secrets::SecretResolver) and the
/// Secret Manager client it builds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolverConfig {
    /// Secret Manager REST endpoint, without trailing slash
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable checked for an access token
    #[serde(default = "default_token_env_var")]
    pub token_env_var: String,

    /// Fall back to the metadata server when no token is in the environment
    #[serde(default = "default_true")]
    pub use_metadata_server: bool,

    /// Metadata server host; `None` means `GCE_METADATA_HOST` or the default
    #[serde(default)]
    pub metadata_host: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token_env_var: default_token_env_var(),
            use_metadata_server: true,
            metadata_host: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ResolverConfig {
    /// Parse settings from YAML text
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a YAML file; a missing file yields the defaults
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Path of the user-level settings file
    pub fn user_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("gcpkit").join("config.yaml")
    }

    /// Load user-level settings, then apply environment overrides
    pub fn user() -> ConfigResult<Self> {
        Ok(Self::from_file(Self::user_path())?.with_env_overrides())
    }

    /// Apply `GCPKIT_*` environment overrides
    ///
    /// Empty variables are ignored. `GCPKIT_USE_METADATA_SERVER` accepts
    /// `true`/`false` in any case, `1`/`0`; other values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = non_empty_var(ENDPOINT_ENV_VAR) {
            self.endpoint = endpoint;
        }
        if let Some(var) = non_empty_var(TOKEN_ENV_VAR_ENV_VAR) {
            self.token_env_var = var;
        }
        if let Some(flag) = non_empty_var(USE_METADATA_ENV_VAR) {
            match flag.to_lowercase().as_str() {
                "true" | "1" => self.use_metadata_server = true,
                "false" | "0" => self.use_metadata_server = false,
                _ => {}
            }
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_metadata_host(mut self, host: impl Into<String>) -> Self {
        self.metadata_host = Some(host.into());
        self
    }

    pub fn with_metadata_server(mut self, enabled: bool) -> Self {
        self.use_metadata_server = enabled;
        self
    }

    pub fn with_token_env_var(mut self, var: impl Into<String>) -> Self {
        self.token_env_var = var.into();
        self
    }

    /// Endpoint with any trailing slash removed
    pub fn endpoint_base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Metadata host in effect: explicit setting, then `GCE_METADATA_HOST`, then the default
    pub fn effective_metadata_host(&self) -> String {
        self.metadata_host
            .clone()
            .or_else(|| non_empty_var(METADATA_HOST_ENV_VAR))
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.token_env_var.trim().is_empty() {
            return Err(ConfigError::Invalid("token_env_var must not be empty".to_string()));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
