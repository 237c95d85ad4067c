//! Custom Resource Provider
//!
//! An infrastructure provider managing a single `custom_resource` type against
//! a generic REST backend. Declarative attributes go in, JSON HTTP requests go
//! out, and the backend's answer becomes the tracked state.
//!
//! # Overview
//!
//! - **API client** ([`ApiClient`]): authenticated JSON calls to
//!   `POST/GET/PUT/DELETE {api_url}/resources[/{id}]`
//! - **Lifecycle adapter** ([`ResourceAdapter`]): the four transitions
//!   (create, read, update, delete) of [`ResourceLifecycle`]
//! - **Provider service** ([`CustomProvider`]): schema, validation, planning and
//!   JSON state conversion for a host transport to drive
//! - **Error types**: [`ProviderError`], convertible into host diagnostics
//! - **Logging**: integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```no_run
//! use custom_provider::{ApiClient, ResourceAdapter, ResourceLifecycle, ResourceSpec};
//!
//! # async fn run() -> Result<(), custom_provider::ProviderError> {
//! let client = ApiClient::new("https://api.example.com", "secret")?;
//! let adapter = ResourceAdapter::new(client);
//!
//! let spec = ResourceSpec::new("svc-a").with_tag("env", "prod");
//! if let Some(state) = adapter.create(&spec).await? {
//!     println!("created {} at {:?}", state.id, state.created_at);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Wire Protocol
//!
//! | Operation | Method | Path | Success |
//! |---|---|---|---|
//! | Create | POST | `/resources` | 201 |
//! | Read | GET | `/resources/{id}` | 200 (404 = absent) |
//! | Update | PUT | `/resources/{id}` | 200 |
//! | Delete | DELETE | `/resources/{id}` | 200 or 204 |
//!
//! Every request carries `Authorization: Bearer <api_key>`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod provider;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{ApiClient, ResourceApi, REQUEST_TIMEOUT};
pub use config::{ProviderConfig, API_KEY_ENV, API_URL_ENV};
pub use error::ProviderError;
pub use lifecycle::{ResourceAdapter, ResourceLifecycle};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{custom_provider_schema, CustomProvider, ProviderService, RESOURCE_TYPE};
pub use schema::{Diagnostic, ProviderSchema};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, Resource, ResourceSpec,
};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
