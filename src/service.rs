//! The provider service seam.
//!
//! [`ProviderService`] is the trait a provider implements, expressed in
//! plain Rust types and JSON documents. [`ServiceHandle`] wraps an
//! implementation the way a protocol adapter drives it: every call is
//! logged inside a span and failures come back as diagnostics instead of
//! errors.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{report_http_error, ProviderError};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ReadResult};

/// Trait that provider implementations must implement.
///
/// # Example
///
/// ```ignore
/// use pingdirectory_provider::{ProviderService, ProviderError, PlanResult, ProviderSchema};
/// use pingdirectory_provider::schema::Diagnostic;
///
/// struct MyProvider;
///
/// #[async_trait::async_trait]
/// impl ProviderService for MyProvider {
///     fn schema(&self) -> ProviderSchema {
///         ProviderSchema::new()
///     }
///
///     async fn configure(
///         &self,
///         config: serde_json::Value,
///     ) -> Result<Vec<Diagnostic>, ProviderError> {
///         Ok(vec![])
///     }
///
///     // ... implement other methods
/// }
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return the registered type names, derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
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

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create (or adopt) a resource.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Refresh a resource.
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<ReadResult, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing configuration into management.
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

    /// Read a data source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Unknown data source type: {}",
            data_source_type
        )))
    }
}

/// The outcome of a call made through [`ServiceHandle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    /// The result, absent when the call failed.
    pub value: Option<T>,
    /// Errors and warnings raised by the call.
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Reply<T> {
    fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostics: Vec::new(),
        }
    }

    fn failed(err: &ProviderError) -> Self {
        let mut diagnostics = Vec::new();
        report_http_error(&mut diagnostics, err);
        Self {
            value: None,
            diagnostics,
        }
    }

    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

impl<T> From<Result<T, ProviderError>> for Reply<T> {
    fn from(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(err) => Self::failed(&err),
        }
    }
}

/// Drives a [`ProviderService`] the way a host protocol would.
pub struct ServiceHandle<P: ProviderService> {
    provider: Arc<P>,
}

impl<P: ProviderService> Clone for ServiceHandle<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: ProviderService> ServiceHandle<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Validate and apply the provider configuration.
    #[instrument(skip(self, config), name = "provider.configure")]
    pub async fn configure(&self, config: Value) -> Reply<()> {
        let mut diagnostics = match self.provider.validate_provider_config(config.clone()).await {
            Ok(diagnostics) => diagnostics,
            Err(err) => return Reply::failed(&err),
        };
        if has_errors(&diagnostics) {
            warn!("provider configuration is invalid");
            return Reply {
                value: None,
                diagnostics,
            };
        }
        match self.provider.configure(config).await {
            Ok(warnings) => {
                info!("provider configured");
                diagnostics.extend(warnings);
                Reply {
                    value: Some(()),
                    diagnostics,
                }
            },
            Err(err) => {
                error!(error = %err, "configure failed");
                Reply::failed(&err)
            },
        }
    }

    /// Validate a resource configuration.
    #[instrument(skip(self, config), name = "provider.validate_resource_config")]
    pub async fn validate_resource_config(&self, resource_type: &str, config: Value) -> Reply<()> {
        match self.provider.validate_resource_config(resource_type, config).await {
            Ok(diagnostics) => Reply {
                value: (!has_errors(&diagnostics)).then_some(()),
                diagnostics,
            },
            Err(err) => Reply::failed(&err),
        }
    }

    /// Validate a data source configuration.
    #[instrument(skip(self, config), name = "provider.validate_data_source_config")]
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Reply<()> {
        match self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await
        {
            Ok(diagnostics) => Reply {
                value: (!has_errors(&diagnostics)).then_some(()),
                diagnostics,
            },
            Err(err) => Reply::failed(&err),
        }
    }

    /// Plan a resource.
    #[instrument(skip(self, prior_state, config), name = "provider.plan")]
    pub async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        config: Value,
    ) -> Reply<PlanResult> {
        debug!(is_create = prior_state.is_none(), "plan called");
        let result = self.provider.plan(resource_type, prior_state, config).await;
        if let Ok(plan) = &result {
            info!(
                changes = plan.changes.len(),
                requires_replace = plan.requires_replace,
                "plan completed"
            );
        }
        result.into()
    }

    /// Create a resource.
    #[instrument(skip(self, planned_state), name = "provider.create")]
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Reply<Value> {
        info!("create called");
        self.provider.create(resource_type, planned_state).await.into()
    }

    /// Read a resource. A removed resource yields no state and a warning.
    #[instrument(skip(self, current_state), name = "provider.read")]
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Reply<Option<Value>> {
        match self.provider.read(resource_type, current_state).await {
            Ok(ReadResult { state, diagnostics }) => Reply {
                value: Some(state),
                diagnostics,
            },
            Err(err) => Reply::failed(&err),
        }
    }

    /// Update a resource.
    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Reply<Value> {
        info!("update called");
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
            .into()
    }

    /// Delete a resource.
    #[instrument(skip(self, current_state), name = "provider.delete")]
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Reply<()> {
        info!("delete called");
        self.provider.delete(resource_type, current_state).await.into()
    }

    /// Import a resource.
    #[instrument(skip(self), name = "provider.import_resource")]
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Reply<Vec<ImportedResource>> {
        self.provider.import_resource(resource_type, id).await.into()
    }

    /// Read a data source.
    #[instrument(skip(self, config), name = "provider.read_data_source")]
    pub async fn read_data_source(&self, data_source_type: &str, config: Value) -> Reply<Value> {
        self.provider.read_data_source(data_source_type, config).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Schema};
    use serde_json::json;

    struct StaticProvider;

    #[async_trait::async_trait]
    impl ProviderService for StaticProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new().with_resource(
                "test_object",
                Schema::v0().with_attribute("name", Attribute::required_string()),
            )
        }

        async fn validate_provider_config(
            &self,
            config: Value,
        ) -> Result<Vec<Diagnostic>, ProviderError> {
            if config.get("https_host").is_none() {
                return Ok(vec![Diagnostic::error("https_host is required")]);
            }
            Ok(vec![])
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![Diagnostic::warning("insecure")])
        }

        async fn plan(
            &self,
            _resource_type: &str,
            _prior_state: Option<Value>,
            config: Value,
        ) -> Result<PlanResult, ProviderError> {
            Ok(PlanResult::no_change(config))
        }

        async fn create(
            &self,
            _resource_type: &str,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn read(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<ReadResult, ProviderError> {
            if current_state["name"] == "gone" {
                return Ok(ReadResult::removed(Diagnostic::warning("not found")));
            }
            Ok(ReadResult::found(current_state))
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            _planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Err(ProviderError::Api {
                status: 500,
                message: "PATCH /test".to_string(),
                body: "boom".to_string(),
            }
            .context("An error occurred while updating the Test Object"))
        }

        async fn delete(
            &self,
            _resource_type: &str,
            _current_state: Value,
        ) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[test]
    fn test_metadata_from_schema() {
        let metadata = StaticProvider.metadata();
        assert_eq!(metadata.resources, vec!["test_object"]);
        assert!(metadata.data_sources.is_empty());
    }

    #[tokio::test]
    async fn test_configure_stops_on_validation_errors() {
        let handle = ServiceHandle::new(StaticProvider);
        let reply = handle.configure(json!({})).await;
        assert!(reply.value.is_none());
        assert!(reply.has_errors());

        let reply = handle.configure(json!({"https_host": "https://localhost"})).await;
        assert_eq!(reply.value, Some(()));
        assert_eq!(reply.diagnostics.len(), 1);
        assert!(!reply.has_errors());
    }

    #[tokio::test]
    async fn test_errors_become_diagnostics() {
        let handle = ServiceHandle::new(StaticProvider);
        let reply = handle.update("test_object", json!({}), json!({})).await;
        assert!(reply.value.is_none());
        assert_eq!(
            reply.diagnostics[0].summary,
            "An error occurred while updating the Test Object"
        );
        assert!(reply.diagnostics[0].detail.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_read_removed() {
        let handle = ServiceHandle::new(StaticProvider);
        let reply = handle.read("test_object", json!({"name": "gone"})).await;
        assert_eq!(reply.value, Some(None));
        assert_eq!(reply.diagnostics.len(), 1);
        assert!(!reply.has_errors());
    }

    #[tokio::test]
    async fn test_default_import_unsupported() {
        let handle = ServiceHandle::new(StaticProvider);
        let reply = handle.import_resource("test_object", "x").await;
        assert!(reply.has_errors());
    }
}
