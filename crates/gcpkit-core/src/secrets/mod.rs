//! Secret resolution and typed configuration
//!
//! - `SecretResolver`: turns a location reference (file path or
//!   `projects/...` Secret Manager name) into a parsed `SecretSet`
//! - `SecretSet`: immutable records with tolerant typed accessors
//! - `ConfigView`: a `SecretSet` bound to its resolver for nested lookups
//! - `SecretSource` trait with `FileSource` and `MemorySource`

mod error;
mod location;
mod resolver;
mod set;
mod source;
mod view;

pub use error::{SecretsError, SecretsResult};
pub use location::{Location, SecretVersionName, SECRET_MANAGER_PREFIX};
pub use resolver::{location_from_environment, CloudSourceFactory, SecretResolver};
pub use set::{SecretRecord, SecretSet};
pub use source::{FileSource, MemorySource, SecretSource};
pub use view::ConfigView;
