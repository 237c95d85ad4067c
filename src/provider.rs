//! Host-facing provider service.
//!
//! This module provides the `ProviderService` trait a host transport drives,
//! and [`CustomProvider`], which serves the `custom_resource` resource and
//! data source. State crosses this boundary as JSON; it is converted once into
//! typed values before reaching the lifecycle adapter.
//!
//! An absent resource is represented as JSON `null`: returning `null` from
//! `create`, `read` or `update` tells the host the tracked identity is gone.

use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::ApiClient;
use crate::config::{ProviderConfig, API_KEY_ENV, API_URL_ENV};
use crate::error::ProviderError;
use crate::lifecycle::{ResourceAdapter, ResourceLifecycle};
use crate::schema::{Attribute, AttributeType, Diagnostic, ProviderSchema, Schema};
use crate::types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata, Resource, ResourceSpec};
use crate::validation::validate;

/// Name of the resource type and data source served by [`CustomProvider`].
pub const RESOURCE_TYPE: &str = "custom_resource";

/// Trait the host transport drives.
///
/// Methods take and return JSON values; implementations convert them into
/// typed state at the boundary.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return the resource and data source names, derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.into_keys().collect(),
            data_sources: schema.data_sources.into_keys().collect(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Plan changes for a resource. A `null` proposed state plans a delete.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

/// The full schema served by [`CustomProvider`].
pub fn custom_provider_schema() -> ProviderSchema {
    ProviderSchema::new()
        .with_provider_config(
            Schema::new()
                .with_attribute(
                    "api_url",
                    Attribute::required(AttributeType::String).with_description(format!(
                        "The URL of the API endpoint. Defaults to ${}.",
                        API_URL_ENV
                    )),
                )
                .with_attribute(
                    "api_key",
                    Attribute::required(AttributeType::String)
                        .sensitive()
                        .with_description(format!(
                            "API key for authentication. Defaults to ${}.",
                            API_KEY_ENV
                        )),
                ),
        )
        .with_resource(
            RESOURCE_TYPE,
            Schema::new()
                .with_description("A custom resource managed through the REST API")
                .with_attribute("id", Attribute::computed(AttributeType::String))
                .with_attribute(
                    "name",
                    Attribute::required(AttributeType::String).with_description("Name of the resource"),
                )
                .with_attribute(
                    "description",
                    Attribute::optional(AttributeType::String).with_description("Description of the resource"),
                )
                .with_attribute(
                    "enabled",
                    Attribute::optional(AttributeType::Bool)
                        .with_default(json!(true))
                        .with_description("Whether the resource is enabled"),
                )
                .with_attribute(
                    "tags",
                    Attribute::optional(AttributeType::StringMap).with_description("Tags for the resource"),
                )
                .with_attribute(
                    "created_at",
                    Attribute::computed(AttributeType::String)
                        .with_description("Timestamp when the resource was created"),
                )
                .with_attribute(
                    "updated_at",
                    Attribute::computed(AttributeType::String)
                        .with_description("Timestamp when the resource was last updated"),
                ),
        )
        .with_data_source(
            RESOURCE_TYPE,
            Schema::new()
                .with_description("Look up an existing custom resource by id")
                .with_attribute(
                    "id",
                    Attribute::required(AttributeType::String).with_description("Identifier of the resource"),
                )
                .with_attribute("name", Attribute::computed(AttributeType::String))
                .with_attribute("description", Attribute::computed(AttributeType::String))
                .with_attribute("enabled", Attribute::computed(AttributeType::Bool))
                .with_attribute("tags", Attribute::computed(AttributeType::StringMap))
                .with_attribute("created_at", Attribute::computed(AttributeType::String))
                .with_attribute("updated_at", Attribute::computed(AttributeType::String)),
        )
}

/// Provider serving `custom_resource` against the configured REST API.
#[derive(Default)]
pub struct CustomProvider {
    adapter: RwLock<Option<ResourceAdapter<ApiClient>>>,
}

impl CustomProvider {
    /// Create an unconfigured provider. Call `configure` before any resource operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that is already configured with the given client.
    pub fn with_client(client: ApiClient) -> Self {
        Self {
            adapter: RwLock::new(Some(ResourceAdapter::new(client))),
        }
    }

    async fn adapter(&self) -> Result<ResourceAdapter<ApiClient>, ProviderError> {
        self.adapter.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }
}

fn check_type(resource_type: &str) -> Result<(), ProviderError> {
    if resource_type == RESOURCE_TYPE {
        Ok(())
    } else {
        Err(ProviderError::UnknownResource(resource_type.to_string()))
    }
}

fn state_id(state: &Value) -> Result<&str, ProviderError> {
    state
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Validation("state is missing the resource id".to_string()))
}

fn to_state(resource: Option<Resource>) -> Result<Value, ProviderError> {
    match resource {
        Some(resource) => Ok(serde_json::to_value(resource)?),
        None => Ok(Value::Null),
    }
}

/// Planned state: caller attributes known, backend-assigned ones unknown (null).
fn planned(id: Option<&str>, spec: &ResourceSpec, created_at: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": spec.name,
        "description": spec.description,
        "enabled": spec.enabled,
        "tags": spec.tags,
        "created_at": created_at,
        "updated_at": Value::Null,
    })
}

#[async_trait::async_trait]
impl ProviderService for CustomProvider {
    fn schema(&self) -> ProviderSchema {
        custom_provider_schema()
    }

    #[instrument(skip(self, config), name = "provider.validate_provider_config")]
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        match ProviderConfig::from_value(&config) {
            Ok(_) => Ok(vec![]),
            Err(e) => {
                warn!(error = %e, "provider configuration is invalid");
                Ok(vec![e.into()])
            }
        }
    }

    #[instrument(skip(self, config), name = "provider.configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let client = match ProviderConfig::from_value(&config).and_then(|c| ApiClient::from_config(&c)) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "unable to create client");
                return Ok(vec![e.into()]);
            }
        };

        info!(api_url = client.base_url(), "provider configured");
        *self.adapter.write().await = Some(ResourceAdapter::new(client));
        Ok(vec![])
    }

    #[instrument(skip(self, config), name = "provider.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        check_type(resource_type)?;

        let schema = self.schema();
        let mut diagnostics = validate(&schema.resources[RESOURCE_TYPE], &config);
        if config.get("name").and_then(Value::as_str) == Some("") {
            diagnostics.push(Diagnostic::attribute_error(
                "name",
                "Invalid value for attribute 'name'",
                "name must not be empty",
            ));
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, prior_state, proposed_state, _config), name = "provider.plan")]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        check_type(resource_type)?;

        if proposed_state.is_null() {
            debug!("planning delete");
            return Ok(PlanResult::no_change(Value::Null));
        }

        let desired: ResourceSpec = serde_json::from_value(proposed_state)?;

        match prior_state.filter(|s| !s.is_null()) {
            None => {
                let mut changes = vec![
                    AttributeChange::added("name", json!(desired.name)),
                    AttributeChange::added("enabled", json!(desired.enabled)),
                ];
                if let Some(description) = &desired.description {
                    changes.push(AttributeChange::added("description", json!(description)));
                }
                if !desired.tags.is_empty() {
                    changes.push(AttributeChange::added("tags", json!(desired.tags)));
                }
                Ok(PlanResult::with_changes(planned(None, &desired, None), changes))
            }
            Some(prior) => {
                let tracked: Resource = serde_json::from_value(prior.clone())?;
                let changes = tracked.spec().diff(&desired);
                if changes.is_empty() {
                    return Ok(PlanResult::no_change(prior));
                }
                debug!(changes = changes.len(), "planning in-place update");
                Ok(PlanResult::with_changes(
                    planned(Some(tracked.id.as_str()), &desired, tracked.created_at.as_deref()),
                    changes,
                ))
            }
        }
    }

    #[instrument(skip(self, planned_state), name = "provider.create")]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        check_type(resource_type)?;
        let desired: ResourceSpec = serde_json::from_value(planned_state)?;
        let state = self.adapter().await?.create(&desired).await?;
        to_state(state)
    }

    #[instrument(skip(self, current_state), name = "provider.read")]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        check_type(resource_type)?;
        let id = state_id(&current_state)?;
        let state = self.adapter().await?.read(id).await?;
        to_state(state)
    }

    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        check_type(resource_type)?;
        let tracked: Resource = serde_json::from_value(prior_state)?;
        let desired: ResourceSpec = serde_json::from_value(planned_state)?;
        let state = self.adapter().await?.update(&tracked, &desired).await?;
        to_state(state)
    }

    #[instrument(skip(self, current_state), name = "provider.delete")]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        check_type(resource_type)?;
        let id = state_id(&current_state)?;
        self.adapter().await?.delete(id).await
    }

    #[instrument(skip(self), name = "provider.import_resource")]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        check_type(resource_type)?;
        let resource = self.adapter().await?.import(id).await?;
        Ok(vec![ImportedResource::new(
            resource_type,
            serde_json::to_value(resource)?,
        )])
    }

    #[instrument(skip(self, config), name = "provider.validate_data_source_config")]
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        check_type(data_source_type)?;
        let schema = self.schema();
        Ok(validate(&schema.data_sources[RESOURCE_TYPE], &config))
    }

    #[instrument(skip(self, config), name = "provider.read_data_source")]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        check_type(data_source_type)?;
        let id = state_id(&config)?;
        let resource = self
            .adapter()
            .await?
            .read(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        Ok(serde_json::to_value(resource)?)
    }
}
