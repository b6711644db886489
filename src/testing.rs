//! Testing utilities.
//!
//! [`InMemoryConfigApi`] stands in for the server's configuration API and
//! records every call made to it. [`ProviderTester`] drives a
//! [`ProviderService`] through whole lifecycles without a host.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dirconfig_provider::testing::{InMemoryConfigApi, ProviderTester};
//! use dirconfig_provider::LogPublisherProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_error_logger() {
//!     let api = Arc::new(InMemoryConfigApi::new());
//!     let tester = ProviderTester::new(LogPublisherProvider::with_api(api.clone()));
//!
//!     let state = tester
//!         .lifecycle_create(
//!             "dirconfig_file_based_error_log_publisher",
//!             json!({
//!                 "id": "Errors",
//!                 "enabled": true,
//!                 "log_file": "logs/errors",
//!                 "rotation_policy": ["Size Limit Rotation Policy"],
//!                 "retention_policy": ["File Count Retention Policy"]
//!             }),
//!         )
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(state["log_file"], "logs/errors");
//!     assert!(api.object("Errors").await.is_some());
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::client::{ConfigApi, RemoteObject};
use crate::diff::{Operation, OperationKind};
use crate::error::ProviderError;
use crate::schema::{json_key, Diagnostic, DiagnosticSeverity};
use crate::service::ProviderService;
use crate::types::PlanResult;

/// A call received by [`InMemoryConfigApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `get` of the named object.
    Get(String),
    /// `create` of the named object.
    Create(String),
    /// `apply_operations` on the named object.
    ApplyOperations(String, Vec<Operation>),
    /// `delete` of the named object.
    Delete(String),
}

#[derive(Default)]
struct Store {
    objects: BTreeMap<String, RemoteObject>,
    calls: Vec<ApiCall>,
}

/// A [`ConfigApi`] backed by a map.
///
/// Created objects get the configured server defaults for any attribute the
/// request left out, the way a real server fills in its own values.
#[derive(Default)]
pub struct InMemoryConfigApi {
    store: Mutex<Store>,
    server_defaults: Map<String, Value>,
}

impl InMemoryConfigApi {
    /// An empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing object.
    pub fn with_object(mut self, object: RemoteObject) -> Self {
        self.store.get_mut().objects.insert(object.id.clone(), object);
        self
    }

    /// Fill `json_key` with `value` on every created object that lacks it.
    pub fn with_server_default(mut self, json_key: impl Into<String>, value: Value) -> Self {
        self.server_defaults.insert(json_key.into(), value);
        self
    }

    /// The stored object, if any.
    pub async fn object(&self, id: &str) -> Option<RemoteObject> {
        self.store.lock().await.objects.get(id).cloned()
    }

    /// Every call received so far, oldest first.
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.store.lock().await.calls.clone()
    }

    /// Forget the recorded calls.
    pub async fn clear_calls(&self) {
        self.store.lock().await.calls.clear();
    }
}

#[async_trait]
impl ConfigApi for InMemoryConfigApi {
    async fn get(&self, id: &str) -> Result<RemoteObject, ProviderError> {
        let mut store = self.store.lock().await;
        store.calls.push(ApiCall::Get(id.to_string()));
        store
            .objects
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    async fn create(&self, object: &RemoteObject) -> Result<RemoteObject, ProviderError> {
        let mut store = self.store.lock().await;
        store.calls.push(ApiCall::Create(object.id.clone()));
        if store.objects.contains_key(&object.id) {
            return Err(ProviderError::InvalidRequest(format!(
                "create of {}: an object with that name already exists",
                object.id
            )));
        }

        let mut created = object.clone();
        for (key, value) in &self.server_defaults {
            created
                .attributes
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        store.objects.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn apply_operations(
        &self,
        id: &str,
        operations: &[Operation],
    ) -> Result<RemoteObject, ProviderError> {
        let mut store = self.store.lock().await;
        store
            .calls
            .push(ApiCall::ApplyOperations(id.to_string(), operations.to_vec()));
        let object = store
            .objects
            .get_mut(id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;

        for operation in operations {
            apply(&mut object.attributes, operation);
        }
        Ok(object.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        let mut store = self.store.lock().await;
        store.calls.push(ApiCall::Delete(id.to_string()));
        store
            .objects
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}

fn apply(attributes: &mut Map<String, Value>, operation: &Operation) {
    let key = json_key(&operation.attribute);
    let value = operation.value.as_ref().map(|v| v.to_json());
    match (operation.kind, value) {
        (OperationKind::Replace, Some(value)) => {
            attributes.insert(key, value);
        },
        (OperationKind::Replace, None) => {
            attributes.remove(&key);
        },
        (OperationKind::Add, Some(member)) => {
            let entry = attributes
                .entry(key)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(members) = entry {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        },
        (OperationKind::Remove, Some(member)) => {
            if let Some(Value::Array(members)) = attributes.get_mut(&key) {
                members.retain(|m| *m != member);
            }
        },
        (_, None) => {},
    }
}

/// Drives a [`ProviderService`] the way a host would: plan before every apply
/// and read back after every write.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Resource type names the provider reports.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Data source type names the provider reports.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Validate a resource configuration, failing on any error diagnostic.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a publisher that is not yet in state.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed.clone(), proposed)
            .await
    }

    /// Plan a change from `prior` to `proposed`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior: Value,
        proposed: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior), proposed.clone(), proposed)
            .await
    }

    /// Plan, create and read back. Returns the state after the read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let planned = self.plan_create(resource_type, config).await?;
        let created = self
            .provider
            .create(resource_type, planned.planned_state)
            .await?;
        self.read_back(resource_type, created.state).await
    }

    /// Plan, update and read back. Returns the state after the read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior: Value,
        proposed: Value,
    ) -> Result<Value, ProviderError> {
        let planned = self
            .plan_update(resource_type, prior.clone(), proposed)
            .await?;
        let updated = self
            .provider
            .update(resource_type, prior, planned.planned_state)
            .await?;
        self.read_back(resource_type, updated.state).await
    }

    /// Plan the destroy, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current: Value,
    ) -> Result<(), ProviderError> {
        self.provider
            .plan(resource_type, Some(current.clone()), Value::Null, Value::Null)
            .await?;
        self.provider.delete(resource_type, current).await
    }

    /// Create, update and delete one publisher.
    ///
    /// Returns the state read back after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial: Value,
        updated: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial).await?;
        let state = self.lifecycle_update(resource_type, created, updated).await?;
        self.lifecycle_delete(resource_type, state.clone()).await?;
        Ok(state)
    }

    async fn read_back(&self, resource_type: &str, state: Value) -> Result<Value, ProviderError> {
        let id = state
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match self.provider.read(resource_type, state).await? {
            Some(update) => Ok(update.state),
            None => Err(ProviderError::NotFound(format!(
                "{} disappeared right after it was written",
                id
            ))),
        }
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that a plan adds attributes without replacing the publisher.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(
        !plan.requires_replace,
        "Expected plan to create, not replace"
    );
}

/// Assert that a plan is empty.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan destroys and recreates the publisher.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan has a change for a specific attribute.
///
/// # Panics
///
/// Panics if the plan does not change `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan leaves the state key `path` alone.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        !has_change,
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error) && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}
