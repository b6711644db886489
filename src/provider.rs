//! The log publisher provider.
//!
//! [`LogPublisherProvider`] implements [`ProviderService`] by resolving the
//! resource type name to a publisher schema and handing the work to a
//! [`ResourceHandler`].

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::client::{ConfigApi, HttpConfigApi};
use crate::config::{ProviderConfig, PROVIDER_CONFIG_ATTRIBUTES};
use crate::error::ProviderError;
use crate::publishers;
use crate::resource::{self, CreatePolicy, ResourceHandler};
use crate::schema::{Diagnostic, ProviderSchema, ResourceSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, StateUpdate};
use crate::validation;

/// Manages log publishers on one directory server.
pub struct LogPublisherProvider {
    api: RwLock<Option<Arc<dyn ConfigApi>>>,
}

impl LogPublisherProvider {
    /// An unconfigured provider; `configure` connects it.
    pub fn new() -> Self {
        Self {
            api: RwLock::new(None),
        }
    }

    /// A provider already connected to `api`.
    pub fn with_api(api: Arc<dyn ConfigApi>) -> Self {
        Self {
            api: RwLock::new(Some(api)),
        }
    }

    async fn api(&self) -> Result<Arc<dyn ConfigApi>, ProviderError> {
        self.api.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    fn resource(
        resource_type: &str,
    ) -> Result<(&'static ResourceSchema, CreatePolicy), ProviderError> {
        publishers::lookup_resource(resource_type).ok_or_else(|| {
            ProviderError::UnknownResource(format!("Unknown resource type: {}", resource_type))
        })
    }

    fn data_source(data_source_type: &str) -> Result<&'static ResourceSchema, ProviderError> {
        publishers::lookup_data_source(data_source_type).ok_or_else(|| {
            ProviderError::UnknownResource(format!(
                "Unknown data source type: {}",
                data_source_type
            ))
        })
    }
}

impl Default for LogPublisherProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for LogPublisherProvider {
    fn schema(&self) -> ProviderSchema {
        publishers::provider_schema()
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(PROVIDER_CONFIG_ATTRIBUTES, &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }
        diagnostics.extend(ProviderConfig::from_value(&config)?.validate());
        Ok(diagnostics)
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = self.validate_provider_config(config.clone()).await?;
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let config = ProviderConfig::from_value(&config)?;
        let api = HttpConfigApi::new(&config)?;
        info!(
            host = config.https_host.as_deref().unwrap_or_default(),
            "Configured directory server connection"
        );
        *self.api.write().await = Some(Arc::new(api));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.api.write().await.take();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let (schema, policy) = Self::resource(resource_type)?;
        Ok(validation::validate_resource(schema, &config, policy))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let (schema, _) = Self::resource(resource_type)?;
        resource::plan(schema, prior_state.as_ref(), &proposed_state)
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<StateUpdate, ProviderError> {
        let (schema, policy) = Self::resource(resource_type)?;
        let api = self.api().await?;
        ResourceHandler::new(schema, policy, api.as_ref())
            .create(&planned_state)
            .await
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<StateUpdate>, ProviderError> {
        let (schema, policy) = Self::resource(resource_type)?;
        let api = self.api().await?;
        ResourceHandler::new(schema, policy, api.as_ref())
            .read(&current_state)
            .await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<StateUpdate, ProviderError> {
        let (schema, policy) = Self::resource(resource_type)?;
        let api = self.api().await?;
        ResourceHandler::new(schema, policy, api.as_ref())
            .update(&prior_state, &planned_state)
            .await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let (schema, policy) = Self::resource(resource_type)?;
        let api = self.api().await?;
        ResourceHandler::new(schema, policy, api.as_ref())
            .delete(&current_state)
            .await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let (schema, policy) = Self::resource(resource_type)?;
        let api = self.api().await?;
        let update = ResourceHandler::new(schema, policy, api.as_ref())
            .import(id)
            .await?;
        Ok(vec![ImportedResource::new(resource_type, update.state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Self::data_source(data_source_type)?;
        Ok(validation::validate_data_source(&config))
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<StateUpdate, ProviderError> {
        let schema = Self::data_source(data_source_type)?;
        let api = self.api().await?;
        ResourceHandler::new(schema, CreatePolicy::CreateIfAbsent, api.as_ref())
            .read_data_source(&config)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemoteObject;
    use crate::publishers::{FILE_BASED_ERROR, SYSLOG_BASED_ACCESS};
    use crate::testing::{ApiCall, InMemoryConfigApi};
    use serde_json::json;
    use tokio_test::assert_ok;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ERROR_LOGGER: &str = "dirconfig_file_based_error_log_publisher";
    const DEFAULT_ERROR_LOGGER: &str = "dirconfig_default_file_based_error_log_publisher";

    fn error_logger() -> RemoteObject {
        RemoteObject::new("File-Based Error Logger", FILE_BASED_ERROR.schema_urn())
            .with_attribute("enabled", json!(true))
            .with_attribute("logFile", json!("logs/errors"))
            .with_attribute("rotationPolicy", json!(["Size Limit Rotation Policy"]))
            .with_attribute("retentionPolicy", json!(["File Count Retention Policy"]))
    }

    #[tokio::test]
    async fn test_operations_require_configuration() {
        let provider = LogPublisherProvider::new();
        let err = provider
            .read(ERROR_LOGGER, json!({"id": "File-Based Error Logger"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = LogPublisherProvider::with_api(Arc::new(InMemoryConfigApi::new()));
        let err = provider
            .create("dirconfig_ldap_log_publisher", json!({"id": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_default_resource_adopts_existing() {
        let api = Arc::new(InMemoryConfigApi::new().with_object(error_logger()));
        let provider = LogPublisherProvider::with_api(api.clone());

        let update = provider
            .create(
                DEFAULT_ERROR_LOGGER,
                json!({"id": "File-Based Error Logger", "enabled": false}),
            )
            .await
            .unwrap();
        assert_eq!(update.state["enabled"], false);
        assert_eq!(update.state["log_file"], "logs/errors");

        provider
            .delete(DEFAULT_ERROR_LOGGER, update.state)
            .await
            .unwrap();
        assert!(api.object("File-Based Error Logger").await.is_some());
    }

    #[tokio::test]
    async fn test_import_resource() {
        let api = Arc::new(InMemoryConfigApi::new().with_object(error_logger()));
        let provider = LogPublisherProvider::with_api(api);

        let imported = provider
            .import_resource(ERROR_LOGGER, "File-Based Error Logger")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].resource_type, ERROR_LOGGER);
        assert_eq!(imported[0].state["log_file"], "logs/errors");
    }

    #[tokio::test]
    async fn test_read_data_source() {
        let api = Arc::new(InMemoryConfigApi::new().with_object(error_logger()));
        let provider = LogPublisherProvider::with_api(api.clone());

        let update = provider
            .read_data_source(ERROR_LOGGER, json!({"id": "File-Based Error Logger"}))
            .await
            .unwrap();
        assert_eq!(update.state["enabled"], true);
        assert!(update.state["last_updated"].is_null());
        assert_eq!(
            api.calls().await,
            vec![ApiCall::Get("File-Based Error Logger".to_string())]
        );

        let err = provider
            .read_data_source(DEFAULT_ERROR_LOGGER, json!({"id": "File-Based Error Logger"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_read_wrong_type_fails() {
        let api = Arc::new(InMemoryConfigApi::new().with_object(error_logger()));
        let provider = LogPublisherProvider::with_api(api);

        let err = provider
            .read(
                &publishers::resource_name(&SYSLOG_BASED_ACCESS),
                json!({"id": "File-Based Error Logger"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_validate_provider_config() {
        let provider = LogPublisherProvider::new();

        let diagnostics = provider
            .validate_provider_config(json!({
                "https_host": "https://ds.example.com:1443",
                "username": "cn=admin",
                "password": "secret"
            }))
            .await
            .unwrap();
        assert!(diagnostics.iter().all(|d| !d.is_error()));

        let diagnostics = provider
            .validate_provider_config(json!({"https_host": 42}))
            .await
            .unwrap();
        assert!(diagnostics.iter().any(|d| d.is_error()));
    }

    #[tokio::test]
    async fn test_configure_reports_missing_credentials() {
        let provider = LogPublisherProvider::new();
        let diagnostics = provider
            .configure(json!({
                "https_host": "https://ds.example.com:1443",
                "username": "cn=admin",
                "password": ""
            }))
            .await
            .unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| d.is_error() && d.attribute.as_deref() == Some("password")));
        assert!(provider.api().await.is_err());
    }

    #[tokio::test]
    async fn test_stop_disconnects() {
        let provider = LogPublisherProvider::with_api(Arc::new(InMemoryConfigApi::new()));
        assert_ok!(provider.api().await);
        assert_ok!(provider.stop().await);
        assert!(provider.api().await.is_err());
    }

    #[tokio::test]
    async fn test_configure_then_create_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config/v2/log-publishers"))
            .and(body_json(json!({
                "schemas": [FILE_BASED_ERROR.schema_urn()],
                "publisherName": "Errors",
                "enabled": true,
                "logFile": "logs/errors",
                "rotationPolicy": ["Size Limit Rotation Policy"],
                "retentionPolicy": ["File Count Retention Policy"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "Errors",
                "schemas": [FILE_BASED_ERROR.schema_urn()],
                "enabled": true,
                "logFile": "logs/errors",
                "rotationPolicy": ["Size Limit Rotation Policy"],
                "retentionPolicy": ["File Count Retention Policy"],
                "append": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = LogPublisherProvider::new();
        let diagnostics = provider
            .configure(json!({
                "https_host": server.uri(),
                "username": "cn=admin",
                "password": "secret"
            }))
            .await
            .unwrap();
        assert!(diagnostics.iter().all(|d| !d.is_error()));

        let update = provider
            .create(
                ERROR_LOGGER,
                json!({
                    "id": "Errors",
                    "enabled": true,
                    "log_file": "logs/errors",
                    "rotation_policy": ["Size Limit Rotation Policy"],
                    "retention_policy": ["File Count Retention Policy"]
                }),
            )
            .await
            .unwrap();
        assert_eq!(update.state["id"], "Errors");
        assert_eq!(update.state["append"], true);
    }
}
