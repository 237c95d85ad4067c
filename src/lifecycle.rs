//! Resource lifecycle: desired state in, tracked state out.
//!
//! [`ResourceLifecycle`] is the four-transition interface the provider drives.
//! A transition returning `Ok(None)` means the tracked identity is cleared:
//! the resource no longer exists at the backend and must be recreated.
//!
//! ```text
//! absent --create--> present --update*--> present --delete--> absent
//!                       \--read finds nothing (drift)--> absent
//! ```

use tracing::{debug, info, instrument, warn};

use crate::client::ResourceApi;
use crate::error::ProviderError;
use crate::types::{Resource, ResourceSpec};

/// The four transitions of a custom resource.
#[async_trait::async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// Create the resource, then read it back to populate computed fields.
    ///
    /// Once the backend has assigned an id it is never dropped: if the
    /// read-back fails, the create response is returned instead.
    async fn create(&self, desired: &ResourceSpec) -> Result<Option<Resource>, ProviderError>;

    /// Refresh tracked state from the backend.
    async fn read(&self, id: &str) -> Result<Option<Resource>, ProviderError>;

    /// Push changed attributes to the backend, then read it back.
    ///
    /// Fails with [`ProviderError::Validation`] if `tracked` has no id.
    async fn update(
        &self,
        tracked: &Resource,
        desired: &ResourceSpec,
    ) -> Result<Option<Resource>, ProviderError>;

    /// Delete the resource.
    async fn delete(&self, id: &str) -> Result<(), ProviderError>;
}

/// [`ResourceLifecycle`] implemented on top of a [`ResourceApi`].
#[derive(Debug, Clone)]
pub struct ResourceAdapter<A> {
    api: A,
}

impl<A: ResourceApi> ResourceAdapter<A> {
    /// Wrap an API client.
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// The wrapped API client.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Import an existing backend resource by id.
    ///
    /// Fails with [`ProviderError::NotFound`] if the backend doesn't know the id.
    #[instrument(skip(self), name = "lifecycle.import")]
    pub async fn import(&self, id: &str) -> Result<Resource, ProviderError> {
        self.read(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}

fn check_spec(spec: &ResourceSpec) -> Result<(), ProviderError> {
    if spec.name.is_empty() {
        return Err(ProviderError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait::async_trait]
impl<A: ResourceApi> ResourceLifecycle for ResourceAdapter<A> {
    #[instrument(skip(self, desired), fields(resource_name = %desired.name), name = "lifecycle.create")]
    async fn create(&self, desired: &ResourceSpec) -> Result<Option<Resource>, ProviderError> {
        check_spec(desired)?;

        let created = self.api.create(desired).await?;
        if created.id.is_empty() {
            return Err(ProviderError::Validation(
                "API did not assign an id to the created resource".to_string(),
            ));
        }
        info!(id = %created.id, "resource created");

        // The backend has confirmed the resource; its id must survive a failed read-back.
        match self.read(&created.id).await {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(id = %created.id, error = %e, "read-back after create failed, keeping create response");
                Ok(Some(created))
            }
        }
    }

    #[instrument(skip(self), name = "lifecycle.read")]
    async fn read(&self, id: &str) -> Result<Option<Resource>, ProviderError> {
        if id.is_empty() {
            return Ok(None);
        }

        match self.api.read(id).await? {
            Some(mut resource) => {
                // Keep the identity we asked for if the body omits it.
                if resource.id.is_empty() {
                    resource.id = id.to_string();
                }
                debug!("resource refreshed");
                Ok(Some(resource))
            }
            None => {
                warn!("resource no longer exists, clearing identity");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, tracked, desired), fields(id = %tracked.id), name = "lifecycle.update")]
    async fn update(
        &self,
        tracked: &Resource,
        desired: &ResourceSpec,
    ) -> Result<Option<Resource>, ProviderError> {
        if tracked.id.is_empty() {
            return Err(ProviderError::Validation(
                "tracked state has no resource id".to_string(),
            ));
        }

        let changed = tracked.spec().changed_fields(desired);

        if changed.is_empty() {
            debug!("no attribute changes, skipping update call");
        } else {
            check_spec(desired)?;
            self.api.update(&tracked.id, desired).await?;
            info!(changed = ?changed, "resource updated");
        }

        self.read(&tracked.id).await
    }

    #[instrument(skip(self), name = "lifecycle.delete")]
    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.api.delete(id).await?;
        info!("resource deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Create(String),
        Read(String),
        Update(String),
        Delete(String),
    }

    /// In-memory backend that records every call it receives.
    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<Call>>,
        store: Mutex<HashMap<String, Resource>>,
        next_id: Mutex<u32>,
        fail_create: Option<(u16, String)>,
        fail_read: Option<(u16, String)>,
    }

    impl RecordingApi {
        fn failing_create(status: u16, body: &str) -> Self {
            Self {
                fail_create: Some((status, body.to_string())),
                ..Default::default()
            }
        }

        fn failing_read(status: u16, body: &str) -> Self {
            Self {
                fail_read: Some((status, body.to_string())),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn remove(&self, id: &str) {
            self.store.lock().unwrap().remove(id);
        }
    }

    fn materialize(id: &str, spec: &ResourceSpec, created_at: &str, updated_at: &str) -> Resource {
        Resource {
            id: id.to_string(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            enabled: spec.enabled,
            tags: spec.tags.clone(),
            created_at: Some(created_at.to_string()),
            updated_at: Some(updated_at.to_string()),
        }
    }

    #[async_trait::async_trait]
    impl ResourceApi for RecordingApi {
        async fn create(&self, spec: &ResourceSpec) -> Result<Resource, ProviderError> {
            self.record(Call::Create(spec.name.clone()));
            if let Some((status, body)) = &self.fail_create {
                return Err(ProviderError::Api {
                    status: *status,
                    body: body.clone(),
                });
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = format!("r-{}", *next);
            let resource = materialize(&id, spec, "t0", "t0");
            self.store.lock().unwrap().insert(id, resource.clone());
            Ok(resource)
        }

        async fn read(&self, id: &str) -> Result<Option<Resource>, ProviderError> {
            self.record(Call::Read(id.to_string()));
            if let Some((status, body)) = &self.fail_read {
                return Err(ProviderError::Api {
                    status: *status,
                    body: body.clone(),
                });
            }
            Ok(self.store.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, id: &str, spec: &ResourceSpec) -> Result<Resource, ProviderError> {
            self.record(Call::Update(id.to_string()));
            let mut store = self.store.lock().unwrap();
            let existing = store.get(id).cloned().ok_or_else(|| ProviderError::Api {
                status: 404,
                body: "not found".to_string(),
            })?;
            let created_at = existing.created_at.unwrap_or_default();
            let resource = materialize(id, spec, &created_at, "t1");
            store.insert(id.to_string(), resource.clone());
            Ok(resource)
        }

        async fn delete(&self, id: &str) -> Result<(), ProviderError> {
            self.record(Call::Delete(id.to_string()));
            self.remove(id);
            Ok(())
        }
    }

    fn svc_a() -> ResourceSpec {
        ResourceSpec::new("svc-a").with_tag("env", "prod")
    }

    #[tokio::test]
    async fn test_create_reads_back_computed_fields() {
        let adapter = ResourceAdapter::new(RecordingApi::default());

        let state = adapter.create(&svc_a()).await.unwrap().unwrap();

        assert_eq!(state.id, "r-1");
        assert_eq!(state.spec(), svc_a());
        assert_eq!(state.created_at.as_deref(), Some("t0"));
        assert_eq!(
            adapter.api().calls(),
            vec![Call::Create("svc-a".into()), Call::Read("r-1".into())]
        );
    }

    #[tokio::test]
    async fn test_create_failure_assigns_no_identity() {
        let adapter =
            ResourceAdapter::new(RecordingApi::failing_create(500, r#"{"error":"internal"}"#));

        let err = adapter.create(&svc_a()).await.unwrap_err();

        assert_eq!(err.message(), r#"{"error":"internal"}"#);
        assert_eq!(adapter.api().calls(), vec![Call::Create("svc-a".into())]);
    }

    #[tokio::test]
    async fn test_create_keeps_identity_when_read_back_fails() {
        let adapter = ResourceAdapter::new(RecordingApi::failing_read(503, "busy"));

        let state = adapter.create(&svc_a()).await.unwrap().unwrap();

        assert_eq!(state.id, "r-1");
        assert_eq!(state.spec(), svc_a());
        assert_eq!(
            adapter.api().calls(),
            vec![Call::Create("svc-a".into()), Call::Read("r-1".into())]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        let err = adapter.create(&ResourceSpec::new("")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(adapter.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_clears_identity() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        assert!(adapter.read("r-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_detects_drift() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        let state = adapter.create(&svc_a()).await.unwrap().unwrap();

        adapter.api().remove(&state.id);

        assert!(adapter.read(&state.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_empty_id_skips_network() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        assert!(adapter.read("").await.unwrap().is_none());
        assert!(adapter.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_enabled_only() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        let tracked = adapter.create(&svc_a()).await.unwrap().unwrap();
        let before = adapter.api().calls().len();

        let desired = tracked.spec().with_enabled(false);
        let state = adapter.update(&tracked, &desired).await.unwrap().unwrap();

        assert_eq!(
            adapter.api().calls()[before..].to_vec(),
            vec![Call::Update("r-1".into()), Call::Read("r-1".into())]
        );
        assert!(!state.enabled);
        assert_eq!(state.name, tracked.name);
        assert_eq!(state.description, tracked.description);
        assert_eq!(state.tags, tracked.tags);
        assert_eq!(state.updated_at.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_update_without_changes_still_reads() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        let tracked = adapter.create(&svc_a()).await.unwrap().unwrap();
        let before = adapter.api().calls().len();

        let state = adapter.update(&tracked, &tracked.spec()).await.unwrap();

        assert_eq!(state, Some(tracked));
        assert_eq!(
            adapter.api().calls()[before..].to_vec(),
            vec![Call::Read("r-1".into())]
        );
    }

    #[tokio::test]
    async fn test_update_without_id_is_rejected() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        let tracked: Resource = serde_json::from_value(serde_json::json!({"name": "a"})).unwrap();

        let err = adapter
            .update(&tracked, &ResourceSpec::new("b"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(adapter.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_read_is_absent() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        let tracked = adapter.create(&svc_a()).await.unwrap().unwrap();

        adapter.delete(&tracked.id).await.unwrap();

        assert!(adapter.read(&tracked.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import() {
        let adapter = ResourceAdapter::new(RecordingApi::default());
        let tracked = adapter.create(&svc_a()).await.unwrap().unwrap();

        assert_eq!(adapter.import(&tracked.id).await.unwrap(), tracked);

        let err = adapter.import("r-999").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
