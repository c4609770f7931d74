//! Blocking Secret Manager REST client
//!
//! Calls `GET {endpoint}/projects/*/secrets/*/versions/*:access` with a bearer
//! token and decodes the base64 payload. No retries: a failed request surfaces
//! immediately as [`SecretsError::RemoteFetch`].
//!
//! Every blocking HTTP call goes through `off_runtime`, so the client can be
//! built and used from inside a tokio runtime without panicking.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::{ResolverConfig, DEFAULT_ENDPOINT};
use crate::logging::{NoOpLogger, SharedLogger};
use crate::secrets::{SecretSource, SecretVersionName, SecretsError, SecretsResult};
use crate::{log_debug, log_error};

use super::blocking::off_runtime;
use super::token::{ChainTokenProvider, EnvTokenProvider, MetadataTokenProvider, TokenProvider};

#[derive(Deserialize)]
struct AccessResponse {
    #[serde(default)]
    payload: Option<SecretPayload>,
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for the Secret Manager `versions.access` call
///
/// # Example
///
/// ```no_run
/// use gcpkit_core::config::ResolverConfig;
/// use gcpkit_core::gcp::SecretManagerClient;
/// use gcpkit_core::secrets::SecretVersionName;
///
/// let client = SecretManagerClient::new(&ResolverConfig::default()).unwrap();
/// let name = SecretVersionName::new("my-project", "db-password", "latest");
/// let bytes = client.access(&name).unwrap();
/// ```
pub struct SecretManagerClient {
    http: Client,
    endpoint: String,
    tokens: Arc<dyn TokenProvider>,
    logger: SharedLogger,
}

impl SecretManagerClient {
    /// Build a client with the default token chain for `config`
    pub fn new(config: &ResolverConfig) -> SecretsResult<Self> {
        Self::with_logger(config, Arc::new(NoOpLogger))
    }

    /// Build a client with the default token chain and a logger
    ///
    /// The chain checks `config.token_env_var` first, then the metadata server
    /// when `config.use_metadata_server` is set.
    pub fn with_logger(config: &ResolverConfig, logger: SharedLogger) -> SecretsResult<Self> {
        let http = build_http_client(config)?;

        let mut providers: Vec<Arc<dyn TokenProvider>> =
            vec![Arc::new(EnvTokenProvider::new(config.token_env_var.clone()))];
        if config.use_metadata_server {
            providers.push(Arc::new(MetadataTokenProvider::with_logger(
                http.clone(),
                &config.effective_metadata_host(),
                logger.clone(),
            )));
        }
        let tokens = Arc::new(ChainTokenProvider::new(providers));

        Ok(Self::from_parts(http, config.endpoint_base(), tokens, logger))
    }

    /// Build a client with an explicit token provider
    pub fn with_token_provider(
        config: &ResolverConfig,
        tokens: Arc<dyn TokenProvider>,
        logger: SharedLogger,
    ) -> SecretsResult<Self> {
        let http = build_http_client(config)?;
        Ok(Self::from_parts(http, config.endpoint_base(), tokens, logger))
    }

    fn from_parts(
        http: Client,
        endpoint: &str,
        tokens: Arc<dyn TokenProvider>,
        logger: SharedLogger,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            tokens,
            logger,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL of the `access` call for a secret version
    ///
    /// Regional secrets are served by `secretmanager.<location>.rep.googleapis.com`;
    /// a custom endpoint is used as configured for every name.
    pub fn access_url(&self, name: &SecretVersionName) -> String {
        match &name.location {
            Some(location) if self.endpoint == DEFAULT_ENDPOINT => format!(
                "https://secretmanager.{}.rep.googleapis.com/v1/{}:access",
                location, name
            ),
            _ => format!("{}/{}:access", self.endpoint, name),
        }
    }

    /// Fetch and decode the payload of a secret version
    ///
    /// A response without payload data yields empty bytes.
    pub fn access(&self, name: &SecretVersionName) -> SecretsResult<Vec<u8>> {
        off_runtime(|| self.access_blocking(name))
    }

    fn access_blocking(&self, name: &SecretVersionName) -> SecretsResult<Vec<u8>> {
        let token = self.tokens.access_token().ok_or_else(|| {
            SecretsError::remote(format!(
                "no Google Cloud access token available (tried: {})",
                self.tokens.describe()
            ))
        })?;

        let url = self.access_url(name);
        log_debug!(self.logger, "Accessing secret version {}", name);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .map_err(|e| {
                log_error!(self.logger, "Request for {} failed: {}", name, e);
                SecretsError::remote(format!("failed to access {}: {}", name, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail = match serde_json::from_str::<GoogleErrorBody>(&body) {
                Ok(b) if !b.error.status.is_empty() => {
                    format!("{} ({})", b.error.message, b.error.status)
                }
                Ok(b) => b.error.message,
                Err(_) => body,
            };
            log_error!(self.logger, "Access to {} returned HTTP {}", name, status.as_u16());
            return Err(SecretsError::remote(format!(
                "failed to access {}: HTTP {}: {}",
                name,
                status.as_u16(),
                detail
            )));
        }

        let parsed: AccessResponse = response.json().map_err(|e| {
            SecretsError::remote(format!("invalid access response for {}: {}", name, e))
        })?;

        let data = match parsed.payload.and_then(|p| p.data) {
            Some(d) => STANDARD.decode(d.as_bytes()).map_err(|e| {
                SecretsError::remote(format!("invalid payload encoding for {}: {}", name, e))
            })?,
            None => Vec::new(),
        };

        log_debug!(self.logger, "Fetched {} bytes from {}", data.len(), name);
        Ok(data)
    }
}

impl SecretSource for SecretManagerClient {
    fn name(&self) -> &str {
        "secretmanager"
    }

    fn fetch(&self, location: &str) -> SecretsResult<Vec<u8>> {
        let name = SecretVersionName::parse(location)?;
        self.access(&name)
    }
}

impl std::fmt::Debug for SecretManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManagerClient")
            .field("endpoint", &self.endpoint)
            .field("tokens", &self.tokens.describe())
            .finish()
    }
}

fn build_http_client(config: &ResolverConfig) -> SecretsResult<Client> {
    off_runtime(|| {
        Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SecretsError::remote(format!("failed to create Secret Manager client: {}", e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::StaticTokenProvider;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ACCESS_PATH: &str = "/v1/projects/p1/secrets/app-config/versions/3:access";

    fn test_client(uri: &str, token: Option<&str>) -> SecretManagerClient {
        let config = ResolverConfig::default()
            .with_endpoint(format!("{}/v1", uri))
            .with_metadata_server(false);
        let tokens: Arc<dyn TokenProvider> = match token {
            Some(t) => Arc::new(StaticTokenProvider::new(t)),
            None => Arc::new(ChainTokenProvider::new(vec![])),
        };
        SecretManagerClient::with_token_provider(&config, tokens, Arc::new(NoOpLogger)).unwrap()
    }

    #[test]
    fn test_access_url() {
        let client = test_client("https://secretmanager.googleapis.com", Some("t"));
        let name = SecretVersionName::new("p1", "app-config", "latest");
        assert_eq!(
            client.access_url(&name),
            "https://secretmanager.googleapis.com/v1/projects/p1/secrets/app-config/versions/latest:access"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_access_decodes_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCESS_PATH))
            .and(header("authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/p1/secrets/app-config/versions/3",
                "payload": { "data": STANDARD.encode(b"{\"ConfigName\":\"remote\"}") }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let bytes = tokio::task::spawn_blocking(move || {
            test_client(&uri, Some("ya29.test")).fetch("projects/p1/secrets/app-config/versions/3")
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(bytes, b"{\"ConfigName\":\"remote\"}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_access_without_payload_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCESS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/p1/secrets/app-config/versions/3"
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let bytes = tokio::task::spawn_blocking(move || {
            let name = SecretVersionName::new("p1", "app-config", "3");
            test_client(&uri, Some("t")).access(&name)
        })
        .await
        .unwrap()
        .unwrap();

        assert!(bytes.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_access_http_error_carries_google_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCESS_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {
                    "code": 403,
                    "message": "Permission 'secretmanager.versions.access' denied",
                    "status": "PERMISSION_DENIED"
                }
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = tokio::task::spawn_blocking(move || {
            let name = SecretVersionName::new("p1", "app-config", "3");
            test_client(&uri, Some("t")).access(&name)
        })
        .await
        .unwrap()
        .unwrap_err();

        assert!(err.is_remote());
        let message = err.to_string();
        assert!(message.contains("HTTP 403"), "{}", message);
        assert!(message.contains("PERMISSION_DENIED"), "{}", message);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_access_bad_base64() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCESS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "payload": { "data": "***not base64***" }
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = tokio::task::spawn_blocking(move || {
            let name = SecretVersionName::new("p1", "app-config", "3");
            test_client(&uri, Some("t")).access(&name)
        })
        .await
        .unwrap()
        .unwrap_err();

        assert!(err.is_remote());
    }

    #[test]
    fn test_missing_token_fails_before_request() {
        // Nothing listens on this endpoint; the token check must fail first
        let client = test_client("http://127.0.0.1:9", None);
        let err = client
            .access(&SecretVersionName::new("p", "s", "latest"))
            .unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("no Google Cloud access token"));
    }

    #[test]
    fn test_fetch_rejects_malformed_name() {
        let client = test_client("http://127.0.0.1:9", Some("t"));
        let err = client.fetch("projects/p/topics/t").unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("invalid Secret Manager resource name"));
    }

    #[test]
    fn test_regional_access_url() {
        let name = SecretVersionName::regional("p1", "us-central1", "app-config", "1");

        let client = test_client("https://secretmanager.googleapis.com", Some("t"));
        assert_eq!(
            client.access_url(&name),
            "https://secretmanager.us-central1.rep.googleapis.com/v1/projects/p1/locations/us-central1/secrets/app-config/versions/1:access"
        );

        let custom = test_client("http://127.0.0.1:8085", Some("t"));
        assert_eq!(
            custom.access_url(&name),
            "http://127.0.0.1:8085/v1/projects/p1/locations/us-central1/secrets/app-config/versions/1:access"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_regional_fetch_against_custom_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/p1/locations/us-central1/secrets/app-config/versions/1:access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "payload": { "data": STANDARD.encode(b"regional") }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let bytes = tokio::task::spawn_blocking(move || {
            test_client(&uri, Some("t"))
                .fetch("projects/p1/locations/us-central1/secrets/app-config/versions/1")
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(bytes, b"regional");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_client_usable_inside_runtime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCESS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "payload": { "data": STANDARD.encode(b"from async") }
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Built, used and dropped directly on a runtime worker thread
        let client = test_client(&server.uri(), Some("t"));
        let bytes = client
            .access(&SecretVersionName::new("p1", "app-config", "3"))
            .unwrap();
        drop(client);

        assert_eq!(bytes, b"from async");
    }

    #[test]
    fn test_missing_token_lists_providers_tried() {
        let config = ResolverConfig::default()
            .with_endpoint("http://127.0.0.1:9/v1")
            .with_token_env_var("GCPKIT_TEST_CLIENT_NO_TOKEN")
            .with_metadata_host("127.0.0.1:9");
        let client = SecretManagerClient::new(&config).unwrap();

        let err = client
            .access(&SecretVersionName::new("p", "s", "latest"))
            .unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("(tried: env, metadata)"), "{}", err);
    }
}
