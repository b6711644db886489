//! Directory server log publisher provider
//!
//! This crate manages the log publishers of a directory server through the
//! server's REST configuration API. Each publisher type (file based access,
//! syslog based error, console JSON access, ...) is exposed as a resource and
//! a data source whose attributes are declared in [`publishers`].
//!
//! # Overview
//!
//! A lifecycle operation flows through four stages:
//!
//! - **Normalization** ([`normalize`]): plan, state and server values are
//!   turned into typed [`value::AttributeSet`] snapshots, so that "not set",
//!   "cleared" and "empty string" compare consistently.
//! - **Diff** ([`diff`]): a desired and an observed snapshot yield the minimal
//!   ordered list of patch operations.
//! - **Projection** ([`project`]): a server response is mapped back into state
//!   without inventing drift for values the user never set.
//! - **Orchestration** ([`resource`]): create, adopt, read, update, delete and
//!   import, with at most one mutating call per operation.
//!
//! [`LogPublisherProvider`] ties these together behind the [`ProviderService`]
//! trait.
//!
//! # Quick Start
//!
//! ```no_run
//! use dirconfig_provider::{LogPublisherProvider, ProviderService};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), dirconfig_provider::ProviderError> {
//! let provider = LogPublisherProvider::new();
//! provider
//!     .configure(json!({
//!         "https_host": "https://localhost:1443",
//!         "username": "cn=Directory Manager",
//!         "password": "password"
//!     }))
//!     .await?;
//!
//! let update = provider
//!     .create(
//!         "dirconfig_file_based_error_log_publisher",
//!         json!({
//!             "id": "Errors",
//!             "enabled": true,
//!             "log_file": "logs/errors",
//!             "rotation_policy": ["Size Limit Rotation Policy"],
//!             "retention_policy": ["File Count Retention Policy"]
//!         }),
//!     )
//!     .await?;
//! println!("{}", update.state);
//! # Ok(())
//! # }
//! ```
//!
//! # Resource Names
//!
//! - `dirconfig_<type>_log_publisher` creates the publisher and deletes it on
//!   destroy. The same name is used for the data source.
//! - `dirconfig_default_<type>_log_publisher` adopts a publisher the server
//!   ships with and leaves it in place on destroy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod project;
pub mod provider;
pub mod publishers;
pub mod resource;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;
pub mod value;

// Re-export main types at crate root
pub use client::{ConfigApi, HttpConfigApi, RemoteObject};
pub use config::{ProviderConfig, RetryPolicy};
pub use diff::{diff, Operation, OperationKind};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::LogPublisherProvider;
pub use resource::{CreatePolicy, ResourceHandler};
pub use schema::{AttributeSchema, Diagnostic, ProviderSchema, ResourceSchema};
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata, StateUpdate};
pub use validation::{validate, validate_result};
pub use value::{AttributeSet, AttributeValue, Scalar};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
