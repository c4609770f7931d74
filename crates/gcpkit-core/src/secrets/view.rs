//! Read-only configuration view bound to its resolver

use std::ops::Deref;
use std::sync::Arc;

use super::error::SecretsResult;
use super::resolver::SecretResolver;
use super::set::SecretSet;

/// A [`SecretSet`] together with the resolver that loaded it
///
/// Derefs to the set for the typed accessors and adds [`ConfigView::get_file`]
/// for values that hold further location references. Cloning is cheap.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use gcpkit_core::secrets::SecretResolver;
///
/// let resolver = Arc::new(SecretResolver::new());
/// let config = resolver.open("/etc/app/secrets.json").unwrap();
/// if config.get_bool("UseTls") {
///     let cert = config.get_file("TlsCert").unwrap();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigView {
    secrets: Arc<SecretSet>,
    resolver: Arc<SecretResolver>,
}

impl ConfigView {
    pub fn new(secrets: SecretSet, resolver: Arc<SecretResolver>) -> Self {
        Self {
            secrets: Arc::new(secrets),
            resolver,
        }
    }

    pub fn secrets(&self) -> &SecretSet {
        &self.secrets
    }

    pub fn resolver(&self) -> &Arc<SecretResolver> {
        &self.resolver
    }

    /// Fetch the raw bytes at the location stored under `key`
    pub fn get_file(&self, key: &str) -> SecretsResult<Vec<u8>> {
        self.resolver.get_file(&self.secrets, key)
    }

    /// Fetch the location stored under `key` and parse it as another secrets document
    pub fn open_nested(&self, key: &str) -> SecretsResult<ConfigView> {
        let data = self.get_file(key)?;
        let nested = SecretSet::parse(&data)?;
        Ok(ConfigView::new(nested, Arc::clone(&self.resolver)))
    }
}

impl Deref for ConfigView {
    type Target = SecretSet;

    fn deref(&self) -> &SecretSet {
        &self.secrets
    }
}
