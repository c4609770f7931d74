//! Secret resolution: location reference -> bytes -> `SecretSet`
//!
//! Routing by location:
//! 1. `projects/...` resource names go to the Secret Manager source
//! 2. everything else is read from the local filesystem

use std::env;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::ResolverConfig;
use crate::gcp::SecretManagerClient;
use crate::logging::{SharedLogger, TracingLogger};
use crate::{log_debug, log_error, log_info};

use super::error::{SecretsError, SecretsResult};
use super::location::Location;
use super::set::SecretSet;
use super::source::{FileSource, SecretSource};
use super::view::ConfigView;

/// Builds the cloud source the first time a `projects/...` location is fetched
pub type CloudSourceFactory =
    Box<dyn Fn(&ResolverConfig, SharedLogger) -> SecretsResult<Arc<dyn SecretSource>> + Send + Sync>;

/// Long-lived service that resolves location references into secrets
///
/// The Secret Manager client is created on first use and reused for the life
/// of the resolver. Creation happens at most once even when several threads
/// race on the first remote fetch. Resolution never retries and never falls
/// back to another source.
///
/// All calls block. They may be made from inside a tokio runtime, where the
/// HTTP work runs on a helper thread and the calling worker thread waits;
/// async callers that care about worker throughput should use
/// `spawn_blocking`.
///
/// # Example
///
/// ```no_run
/// use gcpkit_core::secrets::SecretResolver;
///
/// let resolver = SecretResolver::new();
/// let secrets = resolver.resolve_from_environment("APP_SECRETS").unwrap();
/// let port = secrets.get_int("Port");
/// ```
pub struct SecretResolver {
    config: ResolverConfig,
    logger: SharedLogger,
    files: Arc<dyn SecretSource>,
    cloud: OnceCell<Arc<dyn SecretSource>>,
    cloud_factory: CloudSourceFactory,
}

impl Default for SecretResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretResolver {
    /// Create a resolver with default settings and `tracing` logging
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingLogger::new()),
            files: Arc::new(FileSource::new()),
            cloud: OnceCell::new(),
            cloud_factory: Box::new(secret_manager_source),
        }
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Use `source` for `projects/...` locations instead of building a Secret Manager client
    pub fn with_cloud_source(self, source: Arc<dyn SecretSource>) -> Self {
        let cloud = OnceCell::new();
        let _ = cloud.set(source);
        Self { cloud, ..self }
    }

    /// Build the cloud source with `factory` instead of a Secret Manager client
    ///
    /// The factory succeeds at most once per resolver; after a failure the
    /// next remote fetch calls it again.
    pub fn with_cloud_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ResolverConfig, SharedLogger) -> SecretsResult<Arc<dyn SecretSource>>
            + Send
            + Sync
            + 'static,
    {
        self.cloud_factory = Box::new(factory);
        self
    }

    /// Use `source` for file locations
    pub fn with_file_source(mut self, source: Arc<dyn SecretSource>) -> Self {
        self.files = source;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Whether the cloud source has been created (or injected) yet
    pub fn has_cloud_client(&self) -> bool {
        self.cloud.get().is_some()
    }

    /// Read the location reference from an environment variable and resolve it
    ///
    /// Fails with [`SecretsError::Configuration`] before any I/O when the
    /// variable is unset or empty.
    pub fn resolve_from_environment(&self, var_name: &str) -> SecretsResult<SecretSet> {
        let location = location_from_environment(var_name)?;
        self.resolve(&location)
    }

    /// Fetch the document at `location` and parse it
    pub fn resolve(&self, location: &str) -> SecretsResult<SecretSet> {
        let data = self.fetch(location)?;
        let secrets = SecretSet::parse(&data).map_err(|e| {
            log_error!(self.logger, "Failed to parse secrets from {}: {}", location, e);
            e
        })?;
        log_info!(
            self.logger,
            "Loaded secrets '{}' ({} records) from {}",
            secrets.name(),
            secrets.len(),
            location
        );
        Ok(secrets)
    }

    /// Fetch the raw bytes at `location` without parsing
    ///
    /// The content is not assumed to be a secrets document. Resource names
    /// reach the cloud source exactly as written.
    pub fn fetch(&self, location: &str) -> SecretsResult<Vec<u8>> {
        let parsed = Location::parse(location)?;
        log_debug!(self.logger, "Fetching {}", parsed);

        let source = match &parsed {
            Location::SecretManager(_) => self.cloud_source()?,
            Location::File(_) => self.files.as_ref(),
        };

        let result = source.fetch(location);
        match &result {
            Ok(data) => log_debug!(self.logger, "Fetched {} bytes via {}", data.len(), source.name()),
            Err(e) => log_error!(self.logger, "Fetch via {} failed: {}", source.name(), e),
        }
        result
    }

    /// Treat the value stored under `key` as a location reference and fetch it
    ///
    /// One level of indirection, driven by the caller: nothing in `secrets`
    /// marks which values are locations.
    pub fn get_file(&self, secrets: &SecretSet, key: &str) -> SecretsResult<Vec<u8>> {
        let location = secrets.get_string(key);
        if location.is_empty() {
            return Err(SecretsError::configuration(format!(
                "no location stored under key '{}'",
                key
            )));
        }
        self.fetch(location)
    }

    /// Resolve `location` into a [`ConfigView`] bound to this resolver
    pub fn open(self: &Arc<Self>, location: &str) -> SecretsResult<ConfigView> {
        let secrets = self.resolve(location)?;
        Ok(ConfigView::new(secrets, Arc::clone(self)))
    }

    /// Resolve the location named by an environment variable into a [`ConfigView`]
    pub fn open_from_environment(self: &Arc<Self>, var_name: &str) -> SecretsResult<ConfigView> {
        let secrets = self.resolve_from_environment(var_name)?;
        Ok(ConfigView::new(secrets, Arc::clone(self)))
    }

    fn cloud_source(&self) -> SecretsResult<&dyn SecretSource> {
        let source = self.cloud.get_or_try_init(|| {
            log_debug!(self.logger, "Creating cloud source for {}", self.config.endpoint_base());
            (self.cloud_factory)(&self.config, self.logger.clone())
        })?;
        Ok(source.as_ref())
    }
}

fn secret_manager_source(
    config: &ResolverConfig,
    logger: SharedLogger,
) -> SecretsResult<Arc<dyn SecretSource>> {
    let client = SecretManagerClient::with_logger(config, logger)?;
    Ok(Arc::new(client))
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("endpoint", &self.config.endpoint)
            .field("files", &self.files.name())
            .field("cloud", &self.cloud.get().map(|s| s.name().to_string()))
            .finish()
    }
}

/// Read a location reference from an environment variable
pub fn location_from_environment(var_name: &str) -> SecretsResult<String> {
    match env::var(var_name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(SecretsError::configuration(format!(
            "environment variable {} is empty",
            var_name
        ))),
        Err(_) => Err(SecretsError::configuration(format!(
            "environment variable {} is not set",
            var_name
        ))),
    }
}
