//! gcpkit Core
//!
//! Secrets resolution and typed configuration for services running on
//! Google Cloud. A location reference is either a local file path or a
//! Secret Manager resource name (`projects/<p>/secrets/<s>/versions/<v>`);
//! the resolver fetches it and parses the `{ConfigName, Records}` document
//! into an immutable `SecretSet` with tolerant typed getters.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gcpkit_core::SecretResolver;
//!
//! let resolver = Arc::new(SecretResolver::new());
//! let config = resolver.open_from_environment("APP_SECRETS")?;
//!
//! let dsn = config.get_string("DatabaseUrl");
//! let workers = config.get_int("Workers");
//! let tls_cert = config.get_file("TlsCertLocation")?;
//! ```

pub mod config;
pub mod gcp;
pub mod logging;
pub mod secrets;
pub mod util;

// Re-export commonly used types
pub use secrets::{
    ConfigView, FileSource, Location, MemorySource, SecretRecord, SecretResolver, SecretSet,
    SecretSource, SecretVersionName, SecretsError, SecretsResult,
};

pub use config::{ConfigError, ConfigResult, ResolverConfig};

pub use gcp::{SecretManagerClient, TokenProvider};

pub use logging::{Logger, NoOpLogger, SharedLogger, TracingLogger};
