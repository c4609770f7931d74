//! Byte sources behind location references

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::RwLock;

use super::error::{SecretsError, SecretsResult};

/// Something that can turn a location reference into raw bytes
///
/// The resolver owns one source for local files and one for Secret Manager
/// resource names. Sources return bytes only; parsing is the caller's job,
/// since nested entries are not required to be secrets documents.
pub trait SecretSource: Send + Sync {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch the raw bytes stored at `location`
    fn fetch(&self, location: &str) -> SecretsResult<Vec<u8>>;
}

/// Reads local files whole
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl FileSource {
    pub fn new() -> Self {
        Self
    }
}

impl SecretSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, location: &str) -> SecretsResult<Vec<u8>> {
        let path = Path::new(location);
        fs::read(path).map_err(|source| SecretsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// In-memory source for tests and for embedding documents in code
///
/// Unknown locations fail with [`SecretsError::RemoteFetch`], matching how a
/// missing Secret Manager entry surfaces.
///
/// # Example
///
/// ```
/// use gcpkit_core::secrets::{MemorySource, SecretSource};
///
/// let source = MemorySource::new();
/// source.insert("projects/p/secrets/s/versions/1", b"payload".to_vec());
/// assert_eq!(source.fetch("projects/p/secrets/s/versions/1").unwrap(), b"payload");
/// ```
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source with initial entries
    pub fn with_entries(initial: HashMap<String, Vec<u8>>) -> Self {
        Self {
            entries: RwLock::new(initial),
        }
    }

    pub fn insert(&self, location: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.write().insert(location.into(), data.into());
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, location: &str) -> SecretsResult<Vec<u8>> {
        self.entries
            .read()
            .get(location)
            .cloned()
            .ok_or_else(|| SecretsError::remote(format!("secret not found: {}", location)))
    }
}
