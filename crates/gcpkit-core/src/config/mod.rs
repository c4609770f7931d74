//! Resolver configuration
//!
//! `ResolverConfig` controls where the Secret Manager client connects and how
//! it obtains access tokens. Sources, lowest precedence first:
//! - built-in defaults
//! - YAML file (`~/.config/gcpkit/config.yaml` for `ResolverConfig::user()`)
//! - `GCPKIT_*` environment variables

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    ResolverConfig, DEFAULT_ENDPOINT, DEFAULT_METADATA_HOST, DEFAULT_TOKEN_ENV_VAR,
    ENDPOINT_ENV_VAR, METADATA_HOST_ENV_VAR, TOKEN_ENV_VAR_ENV_VAR, USE_METADATA_ENV_VAR,
};
