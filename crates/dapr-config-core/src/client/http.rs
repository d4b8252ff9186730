//! Dapr sidecar HTTP secret client
//!
//! Talks to the secrets building block of a locally running sidecar:
//!
//! - `GET {endpoint}/v1.0/secrets/{store}/{key}` returns a JSON object of
//!   key/value pairs
//! - `GET {endpoint}/v1.0/secrets/{store}/bulk` returns a JSON object of
//!   secret name to key/value pairs
//!
//! Request metadata is sent as `metadata.<name>=<value>` query parameters
//! and the API token, when configured, as the `dapr-api-token` header.
//!
//! # Example
//!
//! ```rust,ignore
//! use dapr_config_core::client::{DaprClientConfig, DaprHttpClient};
//!
//! let client = DaprHttpClient::new(DaprClientConfig::from_env())?;
//! let secret = client.get_secret("vault", "db", &Default::default()).await?;
//! ```

use super::{BulkSecretMap, ClientResult, Metadata, SecretClient, SecretClientError, SecretMap};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// Default sidecar HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 3500;

const API_TOKEN_HEADER: &str = "dapr-api-token";
const STORE_NOT_FOUND: &str = "ERR_SECRET_STORE_NOT_FOUND";

/// Connection settings for the sidecar's HTTP API
#[derive(Clone)]
pub struct DaprClientConfig {
    /// Base address, e.g. `http://127.0.0.1:3500`
    pub endpoint: String,
    /// Value of the `dapr-api-token` header
    pub api_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for DaprClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaprClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DaprClientConfig {
    fn default() -> Self {
        Self {
            endpoint: resolve_endpoint(None, None),
            api_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DaprClientConfig {
    /// Create a configuration for an explicit endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - DAPR_HTTP_ENDPOINT: full sidecar address
    /// - DAPR_HTTP_PORT: sidecar port on localhost (used when no endpoint is set)
    /// - DAPR_API_TOKEN: API token
    pub fn from_env() -> Self {
        Self {
            endpoint: resolve_endpoint(
                std::env::var("DAPR_HTTP_ENDPOINT").ok(),
                std::env::var("DAPR_HTTP_PORT").ok(),
            ),
            api_token: std::env::var("DAPR_API_TOKEN").ok().filter(|t| !t.is_empty()),
            ..Default::default()
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn resolve_endpoint(endpoint: Option<String>, port: Option<String>) -> String {
    if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
        return endpoint.trim_end_matches('/').to_string();
    }

    let port = port
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_HTTP_PORT);
    format!("http://127.0.0.1:{}", port)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "errorCode", default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

/// Secret client for the sidecar's HTTP API
#[derive(Debug, Clone)]
pub struct DaprHttpClient {
    base: Url,
    api_token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl DaprHttpClient {
    /// Create a client; fails if the endpoint is not a usable base URL
    pub fn new(config: DaprClientConfig) -> ClientResult<Self> {
        let base = Url::parse(&config.endpoint).map_err(|e| {
            SecretClientError::Unavailable(format!("invalid endpoint '{}': {}", config.endpoint, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(SecretClientError::Unavailable(format!(
                "endpoint '{}' cannot be used as a base URL",
                config.endpoint
            )));
        }

        Ok(Self {
            base,
            api_token: config.api_token,
            timeout: config.timeout,
            client: reqwest::Client::new(),
        })
    }

    /// Create a client configured from the environment
    pub fn from_env() -> ClientResult<Self> {
        Self::new(DaprClientConfig::from_env())
    }

    pub fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    fn secrets_url(&self, store: &str, key: &str) -> Url {
        let mut url = self.base.clone();
        // checked in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v1.0", "secrets", store, key]);
        }
        url
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        store: &str,
        key: &str,
        metadata: &Metadata,
    ) -> ClientResult<T> {
        let mut query: Vec<(String, &String)> = metadata
            .iter()
            .map(|(k, v)| (format!("metadata.{}", k), v))
            .collect();
        query.sort();

        let mut request = self.client.get(url).query(&query).timeout(self.timeout);
        if let Some(ref token) = self.api_token {
            request = request.header(API_TOKEN_HEADER, token);
        }

        tracing::debug!(store = store, key = key, "Requesting secret from sidecar");

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Err(not_found(store, key));
        }

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| SecretClientError::Parse(e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
        let message = body
            .as_ref()
            .map(|b| b.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or(text);

        match status {
            _ if body.as_ref().is_some_and(|b| b.error_code == STORE_NOT_FOUND) => {
                Err(not_found(store, key))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SecretClientError::PermissionDenied(message))
            }
            _ => Err(SecretClientError::Server {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

fn not_found(store: &str, key: &str) -> SecretClientError {
    SecretClientError::NotFound {
        store: store.to_string(),
        key: key.to_string(),
    }
}

fn map_send_error(e: reqwest::Error) -> SecretClientError {
    if e.is_connect() {
        SecretClientError::Unavailable(e.to_string())
    } else {
        SecretClientError::Transport(e.to_string())
    }
}

#[async_trait::async_trait]
impl SecretClient for DaprHttpClient {
    async fn get_secret(
        &self,
        store: &str,
        key: &str,
        metadata: &Metadata,
    ) -> ClientResult<SecretMap> {
        let url = self.secrets_url(store, key);
        self.fetch(url, store, key, metadata).await
    }

    async fn get_bulk_secret(&self, store: &str, metadata: &Metadata) -> ClientResult<BulkSecretMap> {
        let url = self.secrets_url(store, "bulk");
        self.fetch(url, store, "", metadata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> DaprHttpClient {
        DaprHttpClient::new(DaprClientConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_resolve_endpoint() {
        assert_eq!(resolve_endpoint(None, None), "http://127.0.0.1:3500");
        assert_eq!(resolve_endpoint(None, Some("3600".into())), "http://127.0.0.1:3600");
        assert_eq!(resolve_endpoint(None, Some("bogus".into())), "http://127.0.0.1:3500");
        assert_eq!(
            resolve_endpoint(Some("http://sidecar:3500/".into()), Some("1".into())),
            "http://sidecar:3500"
        );
        assert_eq!(resolve_endpoint(Some("  ".into()), None), "http://127.0.0.1:3500");
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = DaprHttpClient::new(DaprClientConfig::new("not a url"));
        assert!(matches!(result, Err(SecretClientError::Unavailable(_))));
    }

    #[test]
    fn test_secrets_url_escapes_segments() {
        let client = DaprHttpClient::new(DaprClientConfig::new("http://127.0.0.1:3500")).unwrap();
        let url = client.secrets_url("vault", "a/b c");
        assert_eq!(url.as_str(), "http://127.0.0.1:3500/v1.0/secrets/vault/a%2Fb%20c");
    }

    #[test]
    fn test_config_debug_masks_token() {
        let config = DaprClientConfig::new("http://x").with_api_token("s3cret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cret"));
    }

    #[tokio::test]
    async fn test_get_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/secrets/vault/db"))
            .and(query_param("metadata.version_id", "2"))
            .and(header("dapr-api-token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "db__user": "admin",
                "db__password": "pw"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = DaprHttpClient::new(DaprClientConfig::new(server.uri()).with_api_token("tok")).unwrap();
        let metadata: Metadata = [("version_id".to_string(), "2".to_string())].into_iter().collect();
        let secret = client.get_secret("vault", "db", &metadata).await.unwrap();

        assert_eq!(secret.len(), 2);
        assert_eq!(secret["db__password"], "pw");
    }

    #[tokio::test]
    async fn test_get_bulk_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/secrets/vault/bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "one": { "first_secret": "secret1" },
                "two": { "second_secret": "secret2" }
            })))
            .mount(&server)
            .await;

        let bulk = client_for(&server)
            .await
            .get_bulk_secret("vault", &Metadata::new())
            .await
            .unwrap();

        assert_eq!(bulk.len(), 2);
        assert_eq!(bulk["two"]["second_secret"], "secret2");
    }

    #[tokio::test]
    async fn test_no_content_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = client_for(&server).await.get_secret("vault", "missing", &Metadata::new()).await;
        assert!(matches!(result, Err(SecretClientError::NotFound { ref key, .. }) if key == "missing"));
    }

    #[tokio::test]
    async fn test_unknown_store_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errorCode": "ERR_SECRET_STORE_NOT_FOUND",
                "message": "secret store nope not found"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).await.get_bulk_secret("nope", &Metadata::new()).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "errorCode": "ERR_PERMISSION_DENIED",
                "message": "access denied by policy"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).await.get_secret("vault", "db", &Metadata::new()).await;
        match result {
            Err(SecretClientError::PermissionDenied(msg)) => assert_eq!(msg, "access denied by policy"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client_for(&server).await.get_secret("vault", "db", &Metadata::new()).await;
        assert!(matches!(
            result,
            Err(SecretClientError::Server { status: 500, ref message }) if message == "boom"
        ));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2]"))
            .mount(&server)
            .await;

        let result = client_for(&server).await.get_secret("vault", "db", &Metadata::new()).await;
        assert!(matches!(result, Err(SecretClientError::Parse(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Bind and drop a listener to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = DaprHttpClient::new(DaprClientConfig::new(format!("http://127.0.0.1:{}", port))).unwrap();

        let result = client.get_secret("vault", "db", &Metadata::new()).await;
        assert!(matches!(result, Err(SecretClientError::Unavailable(_))));
    }
}
