//! Test harness for driving a provider without a host.
//!
//! [`ProviderTester`] is bound to one resource type and replays what a host
//! does on apply: plan first, then create, update or delete depending on the
//! prior state and the configuration.
//!
//! # Example
//!
//! ```ignore
//! use custom_provider::testing::ProviderTester;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_resource() {
//!     let tester = ProviderTester::configured(&server.uri(), "test").await.unwrap();
//!
//!     let state = tester.apply(None, json!({"name": "svc-a"})).await.unwrap();
//!     assert_eq!(state["name"], "svc-a");
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::ProviderError;
use crate::provider::{CustomProvider, ProviderService, RESOURCE_TYPE};
use crate::schema::Diagnostic;
use crate::types::{ImportedResource, PlanResult};

/// Drives one resource type of a [`ProviderService`].
pub struct ProviderTester<P: ProviderService = CustomProvider> {
    provider: P,
    resource_type: String,
}

impl ProviderTester<CustomProvider> {
    /// An unconfigured [`CustomProvider`] driving `custom_resource`.
    pub fn new() -> Self {
        Self::for_resource(CustomProvider::new(), RESOURCE_TYPE)
    }

    /// A [`CustomProvider`] configured against `api_url`.
    pub async fn configured(api_url: &str, api_key: &str) -> Result<Self, TestError> {
        let tester = Self::new();
        tester
            .configure(serde_json::json!({"api_url": api_url, "api_key": api_key}))
            .await?;
        Ok(tester)
    }
}

impl Default for ProviderTester<CustomProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProviderService> ProviderTester<P> {
    /// Drive `resource_type` of `provider`.
    pub fn for_resource(provider: P, resource_type: impl Into<String>) -> Self {
        Self {
            provider,
            resource_type: resource_type.into(),
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resource type names the provider serves.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate provider configuration; error diagnostics fail the call.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider; error diagnostics fail the call.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate resource configuration; error diagnostics fail the call.
    pub async fn validate_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(&self.resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan `config` against `prior` (`None` plans a create).
    pub async fn plan(&self, prior: Option<Value>, config: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(&self.resource_type, prior, config.clone(), config)
            .await
    }

    /// Create from a planned state.
    pub async fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        self.provider.create(&self.resource_type, planned).await
    }

    /// Refresh tracked state. `null` means the resource is gone.
    pub async fn read(&self, state: Value) -> Result<Value, ProviderError> {
        self.provider.read(&self.resource_type, state).await
    }

    /// Update `prior` towards a planned state.
    pub async fn update(&self, prior: Value, planned: Value) -> Result<Value, ProviderError> {
        self.provider.update(&self.resource_type, prior, planned).await
    }

    /// Delete tracked state.
    pub async fn delete(&self, state: Value) -> Result<(), ProviderError> {
        self.provider.delete(&self.resource_type, state).await
    }

    /// Import a backend resource by id.
    pub async fn import(&self, id: &str) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(&self.resource_type, id).await
    }

    /// Look up the data source of the same name.
    pub async fn read_data_source(&self, config: Value) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(&self.resource_type, config)
            .await
    }

    /// Plan, then create, update or delete as the host would.
    ///
    /// A `null` config deletes `prior`. Returns the new tracked state, `null`
    /// once the resource is gone.
    pub async fn apply(&self, prior: Option<Value>, config: Value) -> Result<Value, ProviderError> {
        let prior = prior.filter(|state| !state.is_null());

        match (prior, config.is_null()) {
            (None, true) => Ok(Value::Null),
            (Some(prior), true) => {
                self.delete(prior).await?;
                Ok(Value::Null)
            }
            (None, false) => {
                let plan = self.plan(None, config).await?;
                self.create(plan.planned_state).await
            }
            (Some(prior), false) => {
                let plan = self.plan(Some(prior.clone()), config).await?;
                self.update(prior, plan.planned_state).await
            }
        }
    }

    /// Apply `initial`, then `updated`, then destroy.
    ///
    /// Returns the state after the update.
    pub async fn lifecycle_crud(&self, initial: Value, updated: Value) -> Result<Value, ProviderError> {
        let created = self.apply(None, initial).await?;
        let state = self.apply(Some(created), updated).await?;
        self.apply(Some(state.clone()), Value::Null).await?;
        Ok(state)
    }
}

/// Failure of a tester call that reports diagnostics.
#[derive(Debug, Error)]
pub enum TestError {
    /// Error diagnostics were returned.
    #[error("{}", describe(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The provider call itself failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn describe(diagnostics: &[Diagnostic]) -> String {
    let lines: Vec<String> = diagnostics
        .iter()
        .map(|d| {
            let mut line = format!("  [{:?}] {}", d.severity, d.summary);
            if let Some(detail) = &d.detail {
                line.push_str(&format!(": {}", detail));
            }
            if let Some(attr) = &d.attribute {
                line.push_str(&format!(" (at {})", attr));
            }
            line
        })
        .collect();
    format!(
        "Operation failed with {} diagnostic(s):\n{}",
        diagnostics.len(),
        lines.join("\n")
    )
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

/// Assert that a plan changes nothing.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, got {:?}",
        changed_paths(plan)
    );
}

/// Assert that a plan changes exactly `paths`, in order.
///
/// # Panics
///
/// Panics if the changed attribute paths differ.
pub fn assert_plan_changes(plan: &PlanResult, paths: &[&str]) {
    assert_eq!(changed_paths(plan), paths, "unexpected planned changes");
}

/// Assert that some error diagnostic mentions `substring` in its summary or detail.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let matches = diagnostics.iter().filter(|d| d.is_error()).any(|d| {
        d.summary.contains(substring) || d.detail.as_deref().is_some_and(|detail| detail.contains(substring))
    });

    assert!(
        matches,
        "Expected an error containing '{}', got {:?}",
        substring, diagnostics
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributeChange;
    use serde_json::json;

    #[test]
    fn test_assert_error_contains_checks_detail() {
        let diagnostics = vec![Diagnostic::error("Unable to create client").with_detail("API key is required")];
        assert_error_contains(&diagnostics, "Unable to create");
        assert_error_contains(&diagnostics, "API key");
    }

    #[test]
    #[should_panic(expected = "Expected an error containing")]
    fn test_assert_error_contains_ignores_warnings() {
        assert_error_contains(&[Diagnostic::warning("API key is deprecated")], "API key");
    }

    #[test]
    fn test_plan_assertions() {
        let plan = PlanResult::with_changes(
            json!({"name": "svc-b"}),
            vec![AttributeChange::modified("name", json!("svc-a"), json!("svc-b"))],
        );
        assert_plan_changes(&plan, &["name"]);

        assert_plan_no_changes(&PlanResult::no_change(json!({"name": "svc-a"})));
    }

    #[test]
    #[should_panic(expected = "unexpected planned changes")]
    fn test_assert_plan_changes_is_exact() {
        let plan = PlanResult::with_changes(
            json!({}),
            vec![
                AttributeChange::modified("name", json!("a"), json!("b")),
                AttributeChange::modified("enabled", json!(true), json!(false)),
            ],
        );
        assert_plan_changes(&plan, &["enabled"]);
    }

    #[test]
    fn test_check_diagnostics_ignores_warnings() {
        assert!(check_diagnostics(vec![Diagnostic::warning("w")]).is_ok());
        let err = check_diagnostics(vec![Diagnostic::error("e"), Diagnostic::warning("w")]).unwrap_err();
        match err {
            TestError::Diagnostics(d) => assert_eq!(d.len(), 1),
            TestError::Provider(_) => panic!("expected diagnostics"),
        }
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("name"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = err.to_string();
        assert!(display.starts_with("Operation failed with 2 diagnostic(s):"));
        assert!(display.contains("First error (at name)"));
        assert!(display.contains("Second error: More info"));

        let err = TestError::from(ProviderError::NotFound("r-1".into()));
        assert_eq!(err.to_string(), "Provider error: Resource not found: r-1");
    }

    #[tokio::test]
    async fn test_apply_without_prior_or_config_is_a_no_op() {
        let tester = ProviderTester::new();
        assert_eq!(tester.resource_types(), vec![RESOURCE_TYPE.to_string()]);
        assert!(tester.apply(None, Value::Null).await.unwrap().is_null());
    }

    #[tokio::test]
    async fn test_apply_requires_configuration() {
        let tester = ProviderTester::new();
        let err = tester.apply(None, json!({"name": "svc-a"})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }
}
