//! Resource orchestration.
//!
//! A [`ResourceHandler`] runs one create, read, update or delete of a log
//! publisher: normalize the plan, diff it against what is known, make at most
//! one mutating call to the configuration API, and project the response back
//! into state.

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::client::{ConfigApi, RemoteObject};
use crate::diff::{diff, Operation};
use crate::error::ProviderError;
use crate::normalize::{normalize_desired, normalize_state};
use crate::project::{project, Projection};
use crate::schema::{AttributeSchema, Diagnostic, ResourceSchema, SCHEMA_URN_PREFIX};
use crate::types::{AttributeChange, PlanResult, StateUpdate};
use crate::validation;
use crate::value::{AttributeSet, AttributeValue};

/// State key holding the publisher name.
pub const ID_KEY: &str = "id";
/// State key holding the time of the last create or update.
pub const LAST_UPDATED_KEY: &str = "last_updated";

/// How a resource comes into being.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Create the publisher; delete it on destroy.
    CreateIfAbsent,
    /// Take over a publisher that already exists; only forget it on destroy.
    AdoptExisting,
}

/// Runs lifecycle operations for one publisher type.
pub struct ResourceHandler<'a> {
    schema: &'static ResourceSchema,
    policy: CreatePolicy,
    api: &'a dyn ConfigApi,
}

impl<'a> ResourceHandler<'a> {
    /// Create a handler for `schema` talking to `api`.
    pub fn new(
        schema: &'static ResourceSchema,
        policy: CreatePolicy,
        api: &'a dyn ConfigApi,
    ) -> Self {
        Self {
            schema,
            policy,
            api,
        }
    }

    /// The publisher type handled.
    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    /// Create the publisher, or adopt the existing one, so it matches `planned`.
    #[instrument(skip(self, planned), fields(publisher_type = self.schema.publisher_type))]
    pub async fn create(&self, planned: &Value) -> Result<StateUpdate, ProviderError> {
        let id = require_id(planned)?;
        let desired = self.desired(planned)?;

        let remote = match self.policy {
            CreatePolicy::CreateIfAbsent => {
                let object = RemoteObject {
                    id: id.to_string(),
                    schemas: vec![self.schema.schema_urn()],
                    attributes: self.initial_attributes(&desired),
                };
                info!(id, attributes = object.attributes.len(), "Creating log publisher");
                self.api.create(&object).await?
            },
            CreatePolicy::AdoptExisting => {
                let existing = self.api.get(id).await.map_err(|err| match err {
                    ProviderError::NotFound(_) => ProviderError::NotFound(format!(
                        "cannot adopt {} log publisher '{}': it does not exist",
                        self.schema.publisher_type, id
                    )),
                    other => other,
                })?;
                self.check_type(&existing)?;
                let observed = project(&existing, Some(planned), self.schema);
                self.apply(id, &desired, &observed.attributes, existing).await?
            },
        };

        self.check_type(&remote)?;
        Ok(self.state_from(&remote, Some(planned), Some(now())))
    }

    /// Refresh state from the server.
    ///
    /// Returns `None` when the publisher no longer exists, so the caller can
    /// drop it from state.
    #[instrument(skip(self, current), fields(publisher_type = self.schema.publisher_type))]
    pub async fn read(&self, current: &Value) -> Result<Option<StateUpdate>, ProviderError> {
        let id = require_id(current)?;
        let remote = match self.api.get(id).await {
            Ok(remote) => remote,
            Err(ProviderError::NotFound(_)) => {
                warn!(id, "Log publisher no longer exists, removing from state");
                return Ok(None);
            },
            Err(err) => return Err(err),
        };
        self.check_type(&remote)?;

        let last_updated = current.get(LAST_UPDATED_KEY).cloned().filter(|v| !v.is_null());
        Ok(Some(self.state_from(&remote, Some(current), last_updated)))
    }

    /// Converge the publisher from `prior` state onto `planned`.
    ///
    /// Makes no remote call when nothing differs.
    #[instrument(skip(self, prior, planned), fields(publisher_type = self.schema.publisher_type))]
    pub async fn update(
        &self,
        prior: &Value,
        planned: &Value,
    ) -> Result<StateUpdate, ProviderError> {
        let id = require_id(planned)?;
        let desired = self.desired(planned)?;
        let observed = normalize_state(prior, self.schema);

        let operations = diff(&desired, &observed, self.schema);
        if operations.is_empty() {
            debug!(id, "No changes to apply");
            let mut state = prior.clone();
            if let Value::Object(map) = &mut state {
                map.insert(ID_KEY.to_string(), Value::String(id.to_string()));
            }
            return Ok(StateUpdate::new(state));
        }

        log_operations(id, &operations);
        let remote = self.api.apply_operations(id, &operations).await?;
        self.check_type(&remote)?;
        Ok(self.state_from(&remote, Some(planned), Some(now())))
    }

    /// Delete the publisher; adopted publishers are only forgotten.
    ///
    /// A publisher that is already gone counts as deleted.
    #[instrument(skip(self, current), fields(publisher_type = self.schema.publisher_type))]
    pub async fn delete(&self, current: &Value) -> Result<(), ProviderError> {
        let id = require_id(current)?;
        if self.policy == CreatePolicy::AdoptExisting {
            info!(id, "Leaving adopted log publisher in place");
            return Ok(());
        }

        match self.api.delete(id).await {
            Ok(()) => {
                info!(id, "Deleted log publisher");
                Ok(())
            },
            Err(ProviderError::NotFound(_)) => {
                warn!(id, "Log publisher was already deleted");
                Ok(())
            },
            Err(err) => Err(err),
        }
    }

    /// Read an existing publisher into fresh state.
    #[instrument(skip(self), fields(publisher_type = self.schema.publisher_type))]
    pub async fn import(&self, id: &str) -> Result<StateUpdate, ProviderError> {
        let remote = self.api.get(id).await?;
        self.check_type(&remote)?;
        Ok(self.state_from(&remote, None, None))
    }

    /// Read the publisher named by a data source configuration.
    #[instrument(skip(self, config), fields(publisher_type = self.schema.publisher_type))]
    pub async fn read_data_source(&self, config: &Value) -> Result<StateUpdate, ProviderError> {
        let id = require_id(config)?;
        let remote = self.api.get(id).await?;
        self.check_type(&remote)?;
        Ok(self.state_from(&remote, None, None))
    }

    /// Normalize `planned` first so a bad enum member surfaces as
    /// [`ProviderError::InvalidEnumValue`], then reject any remaining
    /// validation errors.
    fn desired(&self, planned: &Value) -> Result<AttributeSet, ProviderError> {
        let desired = normalize_desired(planned, self.schema)?;
        let errors: Vec<String> =
            validation::validate_resource(self.schema, planned, self.policy)
                .into_iter()
                .filter(Diagnostic::is_error)
                .map(|d| match d.detail {
                    Some(detail) => format!("{}: {}", d.summary, detail),
                    None => d.summary,
                })
                .collect();
        if !errors.is_empty() {
            return Err(ProviderError::Validation(errors.join("; ")));
        }
        Ok(desired)
    }

    async fn apply(
        &self,
        id: &str,
        desired: &AttributeSet,
        observed: &AttributeSet,
        current: RemoteObject,
    ) -> Result<RemoteObject, ProviderError> {
        let operations = diff(desired, observed, self.schema);
        if operations.is_empty() {
            debug!(id, "Adopted log publisher already matches");
            return Ok(current);
        }
        log_operations(id, &operations);
        self.api.apply_operations(id, &operations).await
    }

    /// The attributes sent when creating a publisher.
    fn initial_attributes(&self, desired: &AttributeSet) -> Map<String, Value> {
        self.schema
            .attributes
            .iter()
            .filter_map(|attr| match desired.get(attr.name) {
                AttributeValue::Absent | AttributeValue::Null => None,
                AttributeValue::Set(members) if members.is_empty() => None,
                value => Some((attr.json_key(), value.to_state_json())),
            })
            .collect()
    }

    fn check_type(&self, remote: &RemoteObject) -> Result<(), ProviderError> {
        let urn = self.schema.schema_urn();
        if remote.schemas.is_empty() || remote.is_type(&urn) {
            return Ok(());
        }
        let actual = remote
            .schemas
            .iter()
            .find_map(|s| s.strip_prefix(SCHEMA_URN_PREFIX))
            .unwrap_or("unknown");
        Err(ProviderError::Validation(format!(
            "log publisher '{}' is of type {}, not {}",
            remote.id, actual, self.schema.publisher_type
        )))
    }

    fn state_from(
        &self,
        remote: &RemoteObject,
        previous_desired: Option<&Value>,
        last_updated: Option<Value>,
    ) -> StateUpdate {
        let Projection {
            attributes,
            diagnostics,
        } = project(remote, previous_desired, self.schema);

        let mut state = attributes.to_state_object(self.schema);
        state.insert(ID_KEY.to_string(), Value::String(remote.id.clone()));
        state.insert(LAST_UPDATED_KEY.to_string(), last_updated.unwrap_or(Value::Null));
        StateUpdate {
            state: Value::Object(state),
            diagnostics,
        }
    }
}

/// Compute the plan preview for moving `schema`'s resource from `prior` to `proposed`.
///
/// No remote call is made. A `null` proposal plans a delete.
pub fn plan(
    schema: &ResourceSchema,
    prior: Option<&Value>,
    proposed: &Value,
) -> Result<PlanResult, ProviderError> {
    if proposed.is_null() {
        let id = prior
            .and_then(|p| p.get(ID_KEY))
            .cloned()
            .unwrap_or(Value::Null);
        return Ok(PlanResult::with_changes(
            Value::Null,
            vec![AttributeChange::removed(ID_KEY, id)],
            false,
        ));
    }

    let desired = normalize_desired(proposed, schema)?;

    let Some(prior) = prior else {
        let changes = schema
            .attributes
            .iter()
            .filter(|attr| !desired.get(attr.name).is_absent())
            .map(|attr| AttributeChange::added(attr.state_key(), display_value(attr, proposed)))
            .collect();
        return Ok(PlanResult::with_changes(proposed.clone(), changes, false));
    };

    let requires_replace = prior.get(ID_KEY) != proposed.get(ID_KEY);
    let observed = normalize_state(prior, schema);
    let operations = diff(&desired, &observed, schema);

    let mut planned = proposed.clone();
    if let (Value::Object(map), Some(last_updated)) = (&mut planned, prior.get(LAST_UPDATED_KEY)) {
        map.entry(LAST_UPDATED_KEY).or_insert_with(|| last_updated.clone());
    }

    let mut changes = AttributeChange::from_operations(&operations, schema, prior, proposed);
    if requires_replace {
        changes.insert(
            0,
            AttributeChange::modified(
                ID_KEY,
                prior.get(ID_KEY).cloned().unwrap_or(Value::Null),
                proposed.get(ID_KEY).cloned().unwrap_or(Value::Null),
            ),
        );
    }
    Ok(PlanResult::with_changes(planned, changes, requires_replace))
}

fn log_operations(id: &str, operations: &[Operation]) {
    info!(id, operations = operations.len(), "Applying operations to log publisher");
    for operation in operations {
        debug!(id, %operation, "Planned operation");
    }
}

fn display_value(attr: &AttributeSchema, value: &Value) -> Value {
    if attr.sensitive {
        return AttributeChange::redacted();
    }
    value.get(attr.state_key()).cloned().unwrap_or(Value::Null)
}

fn require_id(value: &Value) -> Result<&str, ProviderError> {
    match value.get(ID_KEY).and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ProviderError::Validation(
            "'id' must name the log publisher".to_string(),
        )),
    }
}

/// Human-readable modification time stored in state.
fn now() -> Value {
    Value::String(chrono::Utc::now().format("%A, %d-%b-%y %H:%M:%S %Z").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publishers::{FILE_BASED_ACCESS, SYSLOG_BASED_ERROR};
    use crate::testing::{ApiCall, InMemoryConfigApi};
    use serde_json::json;

    fn access_plan() -> Value {
        json!({
            "id": "Access Logger",
            "enabled": true,
            "log_file": "logs/access",
            "rotation_policy": ["Size Limit Rotation Policy"],
            "retention_policy": ["File Count Retention Policy"],
            "compression_mechanism": "none"
        })
    }

    fn existing_access_logger() -> RemoteObject {
        RemoteObject::new("Access Logger", FILE_BASED_ACCESS.schema_urn())
            .with_attribute("enabled", json!(true))
            .with_attribute("logFile", json!("logs/access"))
            .with_attribute("rotationPolicy", json!(["Size Limit Rotation Policy"]))
            .with_attribute("retentionPolicy", json!(["File Count Retention Policy"]))
            .with_attribute("compressionMechanism", json!("none"))
            .with_attribute("bufferSize", json!("64 kb"))
    }

    #[tokio::test]
    async fn test_create_sends_specified_attributes() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);

        let update = handler.create(&access_plan()).await.unwrap();
        let state = &update.state;
        assert_eq!(state["id"], "Access Logger");
        assert_eq!(state["log_file"], "logs/access");
        assert_eq!(state["rotation_policy"], json!(["Size Limit Rotation Policy"]));
        assert!(state["last_updated"].is_string());

        let calls = api.calls().await;
        assert_eq!(calls, vec![ApiCall::Create("Access Logger".to_string())]);
        let stored = api.object("Access Logger").await.unwrap();
        assert_eq!(stored.get("compressionMechanism"), Some(&json!("none")));
        assert!(stored.get("description").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_enum_before_remote_call() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let mut planned = access_plan();
        planned["compression_mechanism"] = json!("bzip2");

        let err = handler.create(&planned).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::InvalidEnumValue { ref attribute, ref value }
                if attribute == "compression-mechanism" && value == "bzip2"
        ));
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_enum_before_remote_call() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let prior = handler.create(&access_plan()).await.unwrap().state;
        api.clear_calls().await;

        let mut planned = access_plan();
        planned["compression_mechanism"] = json!("bzip2");
        let err = handler.update(&prior, &planned).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidEnumValue { .. }));
        assert!(api.calls().await.is_empty());
    }

    #[test]
    fn test_last_updated_is_utc() {
        let stamp = now();
        assert!(stamp.as_str().unwrap().ends_with(" UTC"));
    }

    #[tokio::test]
    async fn test_create_requires_required_attributes() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);

        let err = handler
            .create(&json!({"id": "Access Logger", "enabled": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.to_string().contains("log_file"));
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_id() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let mut planned = access_plan();
        planned["id"] = json!("");
        assert!(matches!(
            handler.create(&planned).await,
            Err(ProviderError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_adopt_applies_only_differences() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::AdoptExisting, &api);

        let update = handler
            .create(&json!({
                "id": "Access Logger",
                "enabled": false,
                "buffer_size": "64 KB"
            }))
            .await
            .unwrap();
        assert_eq!(update.state["enabled"], false);
        assert_eq!(update.state["log_file"], "logs/access");

        let calls = api.calls().await;
        assert_eq!(
            calls,
            vec![
                ApiCall::Get("Access Logger".to_string()),
                ApiCall::ApplyOperations(
                    "Access Logger".to_string(),
                    vec![Operation::replace("enabled", false)]
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_adopt_without_changes_skips_patch() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::AdoptExisting, &api);

        handler
            .create(&json!({"id": "Access Logger", "enabled": true}))
            .await
            .unwrap();
        assert_eq!(
            api.calls().await,
            vec![ApiCall::Get("Access Logger".to_string())]
        );
    }

    #[tokio::test]
    async fn test_adopt_missing_publisher_fails() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::AdoptExisting, &api);

        let err = handler
            .create(&json!({"id": "Access Logger", "enabled": true}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("cannot adopt"));
    }

    #[tokio::test]
    async fn test_adopt_wrong_type_fails() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&SYSLOG_BASED_ERROR, CreatePolicy::AdoptExisting, &api);

        let err = handler
            .create(&json!({"id": "Access Logger", "enabled": true}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("file-based-access"));
    }

    #[tokio::test]
    async fn test_update_sends_minimal_operations() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let prior = handler.read(&json!({"id": "Access Logger"})).await.unwrap().unwrap().state;
        api.clear_calls().await;

        let mut planned = access_plan();
        planned["log_file"] = json!("logs/access-new");
        planned["rotation_policy"] = json!(["Size Limit Rotation Policy", "Daily Rotation Policy"]);
        let update = handler.update(&prior, &planned).await.unwrap();

        assert_eq!(update.state["log_file"], "logs/access-new");
        assert_eq!(
            api.calls().await,
            vec![ApiCall::ApplyOperations(
                "Access Logger".to_string(),
                vec![
                    Operation::replace("log-file", "logs/access-new"),
                    Operation::add("rotation-policy", "Daily Rotation Policy"),
                ]
            )]
        );
    }

    #[tokio::test]
    async fn test_update_without_changes_makes_no_call() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let prior = handler.read(&json!({"id": "Access Logger"})).await.unwrap().unwrap().state;
        api.clear_calls().await;

        let update = handler.update(&prior, &access_plan()).await.unwrap();
        assert_eq!(update.state, prior);
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_explicit_null_clears() {
        let api = InMemoryConfigApi::new().with_object(
            existing_access_logger().with_attribute("description", json!("primary")),
        );
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let prior = handler.read(&json!({"id": "Access Logger"})).await.unwrap().unwrap().state;
        assert_eq!(prior["description"], "primary");

        let mut planned = access_plan();
        planned["description"] = Value::Null;
        let update = handler.update(&prior, &planned).await.unwrap();
        assert!(update.state["description"].is_null());
        assert!(api.object("Access Logger").await.unwrap().get("description").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_publisher_fails() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let prior = json!({"id": "Access Logger", "enabled": true});

        let err = handler.update(&prior, &access_plan()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_missing_publisher_is_gone() {
        let api = InMemoryConfigApi::new();
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        assert!(handler.read(&access_plan()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_keeps_last_updated() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);
        let current = json!({"id": "Access Logger", "last_updated": "Monday, 19-Oct-26 10:00:00 UTC"});

        let update = handler.read(&current).await.unwrap().unwrap();
        assert_eq!(update.state["last_updated"], "Monday, 19-Oct-26 10:00:00 UTC");
        assert_eq!(update.state["buffer_size"], "64 kb");
    }

    #[tokio::test]
    async fn test_delete() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);

        handler.delete(&access_plan()).await.unwrap();
        assert!(api.object("Access Logger").await.is_none());
        // Deleting again finds nothing and still succeeds.
        handler.delete(&access_plan()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_adopted_publisher_only_forgets() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::AdoptExisting, &api);

        handler.delete(&access_plan()).await.unwrap();
        assert!(api.object("Access Logger").await.is_some());
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_import() {
        let api = InMemoryConfigApi::new().with_object(existing_access_logger());
        let handler = ResourceHandler::new(&FILE_BASED_ACCESS, CreatePolicy::CreateIfAbsent, &api);

        let update = handler.import("Access Logger").await.unwrap();
        assert_eq!(update.state["id"], "Access Logger");
        assert_eq!(update.state["enabled"], true);
        assert!(update.state["last_updated"].is_null());
    }

    #[test]
    fn test_plan_create_lists_specified_attributes() {
        let preview = plan(&FILE_BASED_ACCESS, None, &access_plan()).unwrap();
        let paths: Vec<&str> = preview.changes.iter().map(|c| c.path.as_str()).collect();
        assert!(paths.contains(&"log_file"));
        assert!(!paths.contains(&"description"));
        assert!(!preview.requires_replace);
    }

    #[test]
    fn test_plan_update_from_diff() {
        let prior = json!({
            "id": "Access Logger",
            "enabled": true,
            "log_file": "logs/access",
            "rotation_policy": ["Size Limit Rotation Policy"],
            "retention_policy": ["File Count Retention Policy"],
            "compression_mechanism": "none",
            "last_updated": "Monday, 19-Oct-26 10:00:00 UTC"
        });

        let unchanged = plan(&FILE_BASED_ACCESS, Some(&prior), &access_plan()).unwrap();
        assert!(unchanged.changes.is_empty());
        assert_eq!(unchanged.planned_state["last_updated"], prior["last_updated"]);

        let mut proposed = access_plan();
        proposed["log_file"] = json!("logs/other");
        let changed = plan(&FILE_BASED_ACCESS, Some(&prior), &proposed).unwrap();
        assert_eq!(changed.changes.len(), 1);
        assert_eq!(changed.changes[0].path, "log_file");

        proposed["id"] = json!("Other Logger");
        let replaced = plan(&FILE_BASED_ACCESS, Some(&prior), &proposed).unwrap();
        assert!(replaced.requires_replace);
        assert_eq!(replaced.changes[0].path, "id");
    }
}
