//! Resource model and the plan/import types built on top of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A custom resource as stored by the backend and tracked by the host.
///
/// `id`, `created_at` and `updated_at` are assigned by the backend and are
/// never sent on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Backend-assigned identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Resource name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Optional free-form description.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    /// Whether the resource is enabled.
    #[serde(default = "default_enabled", deserialize_with = "null_as_enabled")]
    pub enabled: bool,
    /// String tags.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
    /// Creation timestamp.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub updated_at: Option<String>,
}

impl Resource {
    /// The caller-supplied part of this resource.
    pub fn spec(&self) -> ResourceSpec {
        ResourceSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            enabled: self.enabled,
            tags: self.tags.clone(),
        }
    }
}

/// The caller-supplied attributes of a resource: desired state and write body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource name; must not be empty.
    pub name: String,
    /// Optional description, omitted from the body when absent.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Whether the resource is enabled (defaults to true).
    #[serde(default = "default_enabled", deserialize_with = "null_as_enabled")]
    pub enabled: bool,
    /// String tags, omitted from the body when empty.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub tags: BTreeMap<String, String>,
}

impl ResourceSpec {
    /// Create a spec with the given name, no description, enabled and untagged.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled: true,
            tags: BTreeMap::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Names of the attributes whose value differs between `self` and `desired`.
    pub fn changed_fields(&self, desired: &ResourceSpec) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.name != desired.name {
            changed.push("name");
        }
        if self.description != desired.description {
            changed.push("description");
        }
        if self.enabled != desired.enabled {
            changed.push("enabled");
        }
        if self.tags != desired.tags {
            changed.push("tags");
        }
        changed
    }

    /// Per-attribute changes from `self` to `desired`, as JSON values.
    pub fn diff(&self, desired: &ResourceSpec) -> Vec<AttributeChange> {
        self.changed_fields(desired)
            .into_iter()
            .map(|field| AttributeChange::modified(field, self.field(field), desired.field(field)))
            .collect()
    }

    fn field(&self, name: &str) -> Value {
        match name {
            "name" => Value::from(self.name.clone()),
            "description" => self
                .description
                .clone()
                .map(Value::from)
                .unwrap_or(Value::Null),
            "enabled" => Value::from(self.enabled),
            "tags" => serde_json::to_value(&self.tags).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_enabled))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if unknown until apply).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes. Every change is applied in place.
    pub changes: Vec<AttributeChange>,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(planned_state: Value, changes: Vec<AttributeChange>) -> Self {
        Self {
            planned_state,
            changes,
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata: the type names the provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}
