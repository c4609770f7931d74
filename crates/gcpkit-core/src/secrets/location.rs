//! Location references: local file paths or Secret Manager resource names

use std::fmt;
use std::path::PathBuf;

use super::error::{SecretsError, SecretsResult};

/// Prefix that marks a location as a Secret Manager resource name
pub const SECRET_MANAGER_PREFIX: &str = "projects/";

/// Fully qualified name of a Secret Manager secret version
///
/// Renders as `projects/<project>/secrets/<secret>/versions/<version>`, or
/// `projects/<project>/locations/<location>/secrets/<secret>/versions/<version>`
/// for regional secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretVersionName {
    pub project: String,
    pub location: Option<String>,
    pub secret: String,
    pub version: String,
}

impl SecretVersionName {
    pub fn new(
        project: impl Into<String>,
        secret: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: None,
            secret: secret.into(),
            version: version.into(),
        }
    }

    /// A secret version stored in a regional Secret Manager endpoint
    pub fn regional(
        project: impl Into<String>,
        location: impl Into<String>,
        secret: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::new(project, secret, version)
        }
    }

    /// Parse a resource name
    ///
    /// Accepts the full `.../versions/<version>` form and the short
    /// `.../secrets/<secret>` form, which means `latest`, with or without a
    /// `locations/<location>` segment. A name of any other shape is a
    /// [`SecretsError::RemoteFetch`]: the API would refuse it.
    pub fn parse(name: &str) -> SecretsResult<Self> {
        let segments: Vec<&str> = name.trim_end_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid_name(name));
        }
        match segments.as_slice() {
            ["projects", project, "secrets", secret, "versions", version] => {
                Ok(Self::new(*project, *secret, *version))
            }
            ["projects", project, "secrets", secret] => Ok(Self::new(*project, *secret, "latest")),
            ["projects", project, "locations", location, "secrets", secret, "versions", version] => {
                Ok(Self::regional(*project, *location, *secret, *version))
            }
            ["projects", project, "locations", location, "secrets", secret] => {
                Ok(Self::regional(*project, *location, *secret, "latest"))
            }
            _ => Err(invalid_name(name)),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.version == "latest"
    }

    pub fn is_regional(&self) -> bool {
        self.location.is_some()
    }
}

fn invalid_name(name: &str) -> SecretsError {
    SecretsError::remote(format!(
        "invalid Secret Manager resource name '{}', expected \
         projects/<project>[/locations/<location>]/secrets/<name>/versions/<version>",
        name
    ))
}

impl fmt::Display for SecretVersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}", self.project)?;
        if let Some(location) = &self.location {
            write!(f, "/locations/{}", location)?;
        }
        write!(f, "/secrets/{}/versions/{}", self.secret, self.version)
    }
}

/// Where a secret document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A path on the local filesystem, read whole
    File(PathBuf),
    /// A Secret Manager resource name, passed to the cloud source as written
    SecretManager(String),
}

impl Location {
    /// Classify a location reference
    ///
    /// Anything starting with `projects/` is a Secret Manager resource name;
    /// every other non-empty string is a file path. Only an empty reference
    /// is refused here.
    pub fn parse(location: &str) -> SecretsResult<Self> {
        if location.is_empty() {
            return Err(SecretsError::configuration("secrets location not specified"));
        }
        if location.starts_with(SECRET_MANAGER_PREFIX) {
            return Ok(Location::SecretManager(location.to_string()));
        }
        Ok(Location::File(PathBuf::from(location)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::SecretManager(_))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::SecretManager(name) => f.write_str(name),
        }
    }
}
