//! Error taxonomy for secret resolution

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving, fetching or parsing secrets
///
/// Typed accessors on [`SecretSet`](super::SecretSet) never produce these;
/// only resolution, fetching and parsing do.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Missing or empty location, environment variable or indirection value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local file could not be read
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Secret Manager client construction, authentication or access failed
    #[error("Remote fetch error: {0}")]
    RemoteFetch(String),

    /// Document bytes were empty or not a well-formed secrets document
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SecretsError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SecretsError::Configuration(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        SecretsError::RemoteFetch(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SecretsError::Configuration(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, SecretsError::Io { .. })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SecretsError::RemoteFetch(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, SecretsError::Parse(_))
    }
}

impl From<serde_json::Error> for SecretsError {
    fn from(e: serde_json::Error) -> Self {
        SecretsError::Parse(e.to_string())
    }
}

pub type SecretsResult<T> = Result<T, SecretsError>;
