//! Client for the server's configuration API.
//!
//! The orchestrator only talks to the server through the [`ConfigApi`] trait.
//! [`HttpConfigApi`] is the production implementation over HTTPS; tests use
//! [`crate::testing::InMemoryConfigApi`].

use async_trait::async_trait;
use reqwest::header;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::{ProviderConfig, RetryPolicy};
use crate::diff::Operation;
use crate::error::ProviderError;

/// Path segments of the log publisher collection below the server URL.
const COLLECTION_PATH: &[&str] = &["config", "v2", "log-publishers"];

/// A log publisher as returned by the configuration API.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RemoteObject {
    /// Server-side identifier (the publisher name).
    #[serde(default)]
    pub id: String,
    /// Schema URNs; one of them names the publisher type.
    #[serde(default)]
    pub schemas: Vec<String>,
    /// Every other member of the response, keyed by API (camelCase) name.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RemoteObject {
    /// An object of the given type with no attributes.
    pub fn new(id: impl Into<String>, schema_urn: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schemas: vec![schema_urn.into()],
            attributes: Map::new(),
        }
    }

    /// Set an attribute using builder pattern.
    pub fn with_attribute(mut self, json_key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(json_key.into(), value);
        self
    }

    /// The raw value of an attribute, by API name.
    pub fn get(&self, json_key: &str) -> Option<&Value> {
        self.attributes.get(json_key)
    }

    /// Whether the object is tagged with `schema_urn`.
    pub fn is_type(&self, schema_urn: &str) -> bool {
        self.schemas.iter().any(|s| s == schema_urn)
    }

    /// Request body for creating this object.
    pub fn to_create_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("schemas".to_string(), json!(self.schemas));
        body.insert("publisherName".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.attributes {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

/// The remote configuration API for log publishers.
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Fetch one object; [`ProviderError::NotFound`] if it does not exist.
    async fn get(&self, id: &str) -> Result<RemoteObject, ProviderError>;

    /// Create an object with its initial attributes.
    async fn create(&self, object: &RemoteObject) -> Result<RemoteObject, ProviderError>;

    /// Apply a batch of operations atomically and return the updated object.
    async fn apply_operations(
        &self,
        id: &str,
        operations: &[Operation],
    ) -> Result<RemoteObject, ProviderError>;

    /// Delete an object; [`ProviderError::NotFound`] if it does not exist.
    async fn delete(&self, id: &str) -> Result<(), ProviderError>;
}

/// [`ConfigApi`] over the server's HTTPS interface.
#[derive(Debug, Clone)]
pub struct HttpConfigApi {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    retry: RetryPolicy,
}

impl HttpConfigApi {
    /// Build a client from validated provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let host = config
            .https_host
            .as_deref()
            .ok_or_else(|| ProviderError::Configuration("https_host is not set".to_string()))?;
        let base_url = Url::parse(host).map_err(|e| {
            ProviderError::Configuration(format!("invalid https_host '{}': {}", host, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Configuration(format!(
                "'{}' cannot be used as a base URL",
                host
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .danger_accept_invalid_certs(config.insecure_trust_all_tls.unwrap_or(false))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone().unwrap_or_default(),
            password: config.password.clone().unwrap_or_default(),
            retry: config.retry.clone(),
        })
    }

    fn endpoint(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(COLLECTION_PATH);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    /// Send a request, retrying connection failures, timeouts and transient statuses.
    ///
    /// A POST is only replayed when the server cannot have acted on it: a
    /// failed connection, or a 429 or 503 rejection. A timed out create may
    /// already be committed.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        operation: &str,
        target: &str,
    ) -> Result<Response, ProviderError> {
        let replayable = method != Method::POST;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .basic_auth(&self.username, Some(&self.password))
                .header(header::ACCEPT, "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, url = %url, attempt, "Sending configuration API request");

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(url = %url, status = %status, attempt, "Received configuration API response");

                    let rejected = matches!(status.as_u16(), 429 | 503);
                    if self.retry.should_retry_status(status.as_u16())
                        && (replayable || rejected)
                        && attempt <= self.retry.max_retries
                    {
                        let backoff = self.retry.calculate_backoff(attempt);
                        warn!(
                            url = %url,
                            status = %status,
                            attempt,
                            wait_ms = backoff.as_millis() as u64,
                            "Transient error, retrying with backoff"
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    return Ok(response);
                },
                Err(err) => {
                    let retryable = err.is_connect() || (replayable && err.is_timeout());
                    if retryable && attempt <= self.retry.max_retries {
                        let backoff = self.retry.calculate_backoff(attempt);
                        warn!(
                            url = %url,
                            error = %err,
                            attempt,
                            wait_ms = backoff.as_millis() as u64,
                            "Request failed, retrying with backoff"
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    return Err(ProviderError::transport(
                        target,
                        operation,
                        format!("request failed after {} attempt(s): {}", attempt, err),
                    ));
                },
            }
        }
    }

    async fn read_object(
        response: Response,
        operation: &str,
        target: &str,
    ) -> Result<RemoteObject, ProviderError> {
        let response = Self::check_status(response, operation, target).await?;
        response.json::<RemoteObject>().await.map_err(|e| {
            ProviderError::transport(target, operation, format!("invalid response body: {}", e))
        })
    }

    async fn check_status(
        response: Response,
        operation: &str,
        target: &str,
    ) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body, operation, target))
    }
}

/// Map an unsuccessful HTTP status to an error.
fn status_error(status: StatusCode, body: &str, operation: &str, target: &str) -> ProviderError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(target.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::PermissionDenied(
            format!("{} of {} was rejected: {}", operation, target, detail),
        ),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::InvalidRequest(format!("{} of {}: {}", operation, target, detail))
        },
        _ => ProviderError::transport(target, operation, format!("HTTP {}: {}", status, detail)),
    }
}

#[async_trait]
impl ConfigApi for HttpConfigApi {
    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<RemoteObject, ProviderError> {
        let response = self
            .send(Method::GET, self.endpoint(Some(id)), None, "read", id)
            .await?;
        Self::read_object(response, "read", id).await
    }

    #[instrument(skip(self, object), fields(id = %object.id))]
    async fn create(&self, object: &RemoteObject) -> Result<RemoteObject, ProviderError> {
        let body = object.to_create_body();
        let response = self
            .send(Method::POST, self.endpoint(None), Some(&body), "create", &object.id)
            .await?;
        Self::read_object(response, "create", &object.id).await
    }

    #[instrument(skip(self, operations), fields(count = operations.len()))]
    async fn apply_operations(
        &self,
        id: &str,
        operations: &[Operation],
    ) -> Result<RemoteObject, ProviderError> {
        let body = json!({
            "operations": operations.iter().map(Operation::to_patch_json).collect::<Vec<_>>()
        });
        let response = self
            .send(Method::PATCH, self.endpoint(Some(id)), Some(&body), "update", id)
            .await?;
        Self::read_object(response, "update", id).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        let response = self
            .send(Method::DELETE, self.endpoint(Some(id)), None, "delete", id)
            .await?;
        Self::check_status(response, "delete", id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ACCESS_URN: &str = "urn:dirconfig:schemas:configuration:2.0:log-publisher:file-based-access";

    fn config_for(host: &str, max_retries: u32) -> ProviderConfig {
        ProviderConfig {
            https_host: Some(host.to_string()),
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            retry: RetryPolicy {
                max_retries,
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
            },
            ..Default::default()
        }
    }

    async fn setup(max_retries: u32) -> (MockServer, HttpConfigApi) {
        let server = MockServer::start().await;
        let api = HttpConfigApi::new(&config_for(&server.uri(), max_retries)).unwrap();
        (server, api)
    }

    fn access_logger_body() -> Value {
        json!({
            "schemas": [ACCESS_URN],
            "id": "Access Logger",
            "enabled": true,
            "logFile": "logs/access",
            "rotationPolicy": ["Size Limit Rotation Policy"],
            "meta": {"resourceType": "File Based Access Log Publisher"}
        })
    }

    #[test]
    fn test_endpoint_encodes_id() {
        let api = HttpConfigApi::new(&config_for("https://ds.example.com:1443/", 0)).unwrap();
        assert_eq!(
            api.endpoint(None).as_str(),
            "https://ds.example.com:1443/config/v2/log-publishers"
        );
        assert_eq!(
            api.endpoint(Some("Access Logger")).as_str(),
            "https://ds.example.com:1443/config/v2/log-publishers/Access%20Logger"
        );
    }

    #[test]
    fn test_new_rejects_missing_or_bad_host() {
        let missing = HttpConfigApi::new(&ProviderConfig::default());
        assert!(matches!(missing, Err(ProviderError::Configuration(_))));
        let bad = HttpConfigApi::new(&config_for("not a url", 0));
        assert!(matches!(bad, Err(ProviderError::Configuration(_))));
    }

    #[test]
    fn test_create_body() {
        let object = RemoteObject::new("Access Logger", ACCESS_URN)
            .with_attribute("enabled", json!(true))
            .with_attribute("logFile", json!("logs/access"));
        assert_eq!(
            object.to_create_body(),
            json!({
                "schemas": [ACCESS_URN],
                "publisherName": "Access Logger",
                "enabled": true,
                "logFile": "logs/access"
            })
        );
    }

    #[tokio::test]
    async fn test_get_parses_object() {
        let (server, api) = setup(0).await;
        Mock::given(method("GET"))
            .and(path("/config/v2/log-publishers/Access%20Logger"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(access_logger_body()))
            .expect(1)
            .mount(&server)
            .await;

        let object = api.get("Access Logger").await.unwrap();
        assert_eq!(object.id, "Access Logger");
        assert!(object.is_type(ACCESS_URN));
        assert_eq!(object.get("logFile"), Some(&json!("logs/access")));
        assert_eq!(object.get("enabled"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let (server, api) = setup(3).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = api.get("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_posts_body() {
        let (server, api) = setup(0).await;
        Mock::given(method("POST"))
            .and(path("/config/v2/log-publishers"))
            .and(body_json(json!({
                "schemas": [ACCESS_URN],
                "publisherName": "Access Logger",
                "enabled": true,
                "logFile": "logs/access"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(access_logger_body()))
            .expect(1)
            .mount(&server)
            .await;

        let object = RemoteObject::new("Access Logger", ACCESS_URN)
            .with_attribute("enabled", json!(true))
            .with_attribute("logFile", json!("logs/access"));
        let created = api.create(&object).await.unwrap();
        assert_eq!(created.id, "Access Logger");
    }

    #[tokio::test]
    async fn test_apply_operations_patches() {
        let (server, api) = setup(0).await;
        Mock::given(method("PATCH"))
            .and(path("/config/v2/log-publishers/Access%20Logger"))
            .and(body_json(json!({
                "operations": [
                    {"op": "replace", "path": "logFile", "value": "logs/new"},
                    {"op": "remove", "path": "description"},
                    {"op": "add", "path": "rotationPolicy", "value": "Daily"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(access_logger_body()))
            .expect(1)
            .mount(&server)
            .await;

        let operations = vec![
            Operation::replace("log-file", "logs/new"),
            Operation::clear("description"),
            Operation::add("rotation-policy", "Daily"),
        ];
        api.apply_operations("Access Logger", &operations)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_retries_transient_status() {
        let (server, api) = setup(3).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(access_logger_body()))
            .expect(1)
            .mount(&server)
            .await;

        let object = api.get("Access Logger").await.unwrap();
        assert_eq!(object.id, "Access Logger");
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let (server, api) = setup(1).await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let err = api
            .apply_operations("Access Logger", &[Operation::replace("enabled", true)])
            .await
            .unwrap_err();
        match err {
            ProviderError::Transport {
                target,
                operation,
                message,
            } => {
                assert_eq!(target, "Access Logger");
                assert_eq!(operation, "update");
                assert!(message.contains("502"));
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_is_not_replayed_after_timeout() {
        let server = MockServer::start().await;
        let config = ProviderConfig {
            request_timeout_secs: 1,
            ..config_for(&server.uri(), 3)
        };
        let api = HttpConfigApi::new(&config).unwrap();
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(access_logger_body())
                    .set_delay(std::time::Duration::from_millis(1500)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let object = RemoteObject::new("Access Logger", ACCESS_URN);
        let err = api.create(&object).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_is_not_replayed_after_bad_gateway() {
        let (server, api) = setup(2).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let object = RemoteObject::new("Access Logger", ACCESS_URN);
        let err = api.create(&object).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_bad_request_detail() {
        let (server, api) = setup(3).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": "400",
                "detail": "The value 'x' is not a valid log file permission"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = api
            .create(&RemoteObject::new("Access Logger", ACCESS_URN))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(err.to_string().contains("not a valid log file permission"));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (server, api) = setup(0).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = api.get("Access Logger").await.unwrap_err();
        assert!(matches!(err, ProviderError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let (server, api) = setup(0).await;
        Mock::given(method("DELETE"))
            .and(path("/config/v2/log-publishers/Access%20Logger"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/config/v2/log-publishers/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        api.delete("Access Logger").await.unwrap();
        assert!(api.delete("gone").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let api = HttpConfigApi::new(&config_for("http://127.0.0.1:1", 0)).unwrap();
        let err = api.get("Access Logger").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert!(err.to_string().contains("read of Access Logger"));
    }
}
