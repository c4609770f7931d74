//! OAuth access token providers for Google Cloud APIs

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::logging::{NoOpLogger, SharedLogger};
use crate::{log_debug, log_warn};

use super::blocking::off_runtime;

/// Tokens are refreshed this long before the metadata server says they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Path of the default service account token on the metadata server
const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Source of bearer tokens for Secret Manager requests
pub trait TokenProvider: Send + Sync {
    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// Current access token, or `None` when this provider has no credentials
    fn access_token(&self) -> Option<String>;

    /// Names of the providers consulted, for error messages
    fn describe(&self) -> String {
        self.name().to_string()
    }
}

/// Reads a pre-minted token from an environment variable
///
/// Defaults to `GOOGLE_OAUTH_ACCESS_TOKEN`, the variable `gcloud`-adjacent
/// tooling uses for `gcloud auth print-access-token` output.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl TokenProvider for EnvTokenProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn access_token(&self) -> Option<String> {
        env::var(&self.var).ok().filter(|t| !t.trim().is_empty())
    }
}

/// A fixed token
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn access_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

// Hide the token from debug output
impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"<redacted>").finish()
    }
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Fetches the default service account token from the metadata server
///
/// Available on Compute Engine, GKE, Cloud Run and Cloud Functions. The token
/// is cached and reused until shortly before it expires.
pub struct MetadataTokenProvider {
    http: Client,
    token_url: String,
    cache: Mutex<Option<CachedToken>>,
    logger: SharedLogger,
}

impl MetadataTokenProvider {
    /// Create a provider for `host` (e.g. `metadata.google.internal` or `127.0.0.1:8080`)
    pub fn new(http: Client, host: &str) -> Self {
        Self::with_logger(http, host, Arc::new(NoOpLogger))
    }

    pub fn with_logger(http: Client, host: &str, logger: SharedLogger) -> Self {
        Self {
            http,
            token_url: format!("http://{}{}", host.trim_end_matches('/'), METADATA_TOKEN_PATH),
            cache: Mutex::new(None),
            logger,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn fetch_token(&self) -> Option<CachedToken> {
        log_debug!(self.logger, "Requesting access token from {}", self.token_url);

        let response = match self
            .http
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
        {
            Ok(r) => r,
            Err(e) => {
                log_debug!(self.logger, "Metadata server unreachable: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            log_warn!(self.logger, "Metadata server returned HTTP {}", response.status());
            return None;
        }

        match response.json::<MetadataToken>() {
            Ok(t) if !t.access_token.is_empty() => {
                let lifetime = Duration::from_secs(t.expires_in).saturating_sub(EXPIRY_MARGIN);
                Some(CachedToken {
                    token: t.access_token,
                    refresh_at: Instant::now() + lifetime,
                })
            }
            Ok(_) => {
                log_warn!(self.logger, "Metadata server returned an empty access token");
                None
            }
            Err(e) => {
                log_warn!(self.logger, "Invalid metadata token response: {}", e);
                None
            }
        }
    }
}

impl TokenProvider for MetadataTokenProvider {
    fn name(&self) -> &str {
        "metadata"
    }

    fn access_token(&self) -> Option<String> {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Some(cached.token.clone());
            }
        }

        let fresh = off_runtime(|| self.fetch_token())?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Some(token)
    }
}

impl std::fmt::Debug for MetadataTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataTokenProvider")
            .field("token_url", &self.token_url)
            .field("cached", &self.cache.lock().is_some())
            .finish()
    }
}

/// Tries each provider in order and returns the first token found
pub struct ChainTokenProvider {
    providers: Vec<Arc<dyn TokenProvider>>,
}

impl ChainTokenProvider {
    pub fn new(providers: Vec<Arc<dyn TokenProvider>>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn TokenProvider>] {
        &self.providers
    }
}

impl TokenProvider for ChainTokenProvider {
    fn name(&self) -> &str {
        "chain"
    }

    fn access_token(&self) -> Option<String> {
        self.providers.iter().find_map(|p| p.access_token())
    }

    /// Names of the chained providers, in order
    fn describe(&self) -> String {
        self.providers
            .iter()
            .map(|p| p.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Debug for ChainTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainTokenProvider")
            .field("providers", &self.describe())
            .finish()
    }
}
