//! The PingDirectory provider: dispatches service calls to resources and
//! data sources by type name.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::{debug, info};

use crate::client::ConfigClient;
use crate::config::{self, ProviderConfig};
use crate::error::ProviderError;
use crate::plan::plan_resource;
use crate::resources::{all_data_sources, all_resources, DataSource, Resource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, ReadResult};
use crate::validation;

/// Provider for the PingDirectory configuration API.
pub struct PingDirectoryProvider {
    client: OnceLock<Arc<ConfigClient>>,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl Default for PingDirectoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PingDirectoryProvider {
    /// An unconfigured provider with every resource and data source registered.
    pub fn new() -> Self {
        Self {
            client: OnceLock::new(),
            resources: all_resources().into_iter().map(|r| (r.type_name(), r)).collect(),
            data_sources: all_data_sources().into_iter().map(|d| (d.type_name(), d)).collect(),
        }
    }

    /// A provider that is already configured with the given client.
    pub fn with_client(client: ConfigClient) -> Self {
        let provider = Self::new();
        let _ = provider.client.set(Arc::new(client));
        provider
    }

    fn client(&self) -> Result<&ConfigClient, ProviderError> {
        self.client
            .get()
            .map(Arc::as_ref)
            .ok_or_else(|| {
                ProviderError::Configuration("the provider has not been configured".to_string())
            })
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

#[async_trait::async_trait]
impl ProviderService for PingDirectoryProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(config::provider_schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(config::validate_config(&config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let resolved = ProviderConfig::from_value(&config)?;
        debug!(config = ?resolved, "resolved provider configuration");
        let client = ConfigClient::from_config(&resolved)?;
        info!(
            base_url = %client.base_url(),
            version = %resolved.product_version,
            "configured PingDirectory client"
        );
        self.client
            .set(Arc::new(client))
            .map_err(|_| {
                ProviderError::Configuration("the provider is already configured".to_string())
            })?;
        Ok(Vec::new())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let mut diagnostics = validation::validate(&resource.schema(), &config);
        diagnostics.extend(resource.validate_config(&config));
        Ok(diagnostics)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(plan_resource(&resource.schema(), prior_state.as_ref(), &config))
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)?
            .create(self.client()?, planned_state)
            .await
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<ReadResult, ProviderError> {
        self.resource(resource_type)?
            .read(self.client()?, current_state)
            .await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)?
            .update(self.client()?, prior_state, planned_state)
            .await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.resource(resource_type)?
            .delete(self.client()?, current_state)
            .await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(vec![ImportedResource::new(resource_type, resource.import_state(id))])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        Ok(validation::validate(&data_source.schema(), &config))
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.data_source(data_source_type)?
            .read(self.client()?, config)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_registers_every_type() {
        let provider = PingDirectoryProvider::new();
        let schema = provider.schema();
        for name in [
            "pingdirectory_default_group_implementation",
            "pingdirectory_license",
            "pingdirectory_log_field_mapping",
            "pingdirectory_default_log_field_mapping",
            "pingdirectory_log_retention_policy",
            "pingdirectory_default_log_retention_policy",
            "pingdirectory_default_server_instance",
        ] {
            assert!(schema.resources.contains_key(name), "missing resource {}", name);
        }
        assert_eq!(schema.data_sources.len(), 9);
        assert!(schema.provider.attributes["password"].flags.sensitive);
    }

    #[test]
    fn test_validate_provider_config() {
        let provider = PingDirectoryProvider::new();
        let diagnostics = tokio_test::block_on(provider.validate_provider_config(json!({
            "https_host": "https://localhost:1443",
            "username": "cn=administrator",
            "password": "2FederateM0re",
            "product_version": "9.3.0.0"
        })))
        .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("product_version"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_rejects_crud() {
        let provider = PingDirectoryProvider::new();
        let err = provider
            .read("pingdirectory_license", json!({"id": "license"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not been configured"));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let provider = PingDirectoryProvider::with_client(ConfigClient::with_base_url(
            "https://localhost:1443/config",
            "cn=administrator",
            "password",
        ));
        let err = provider.create("pingdirectory_widget", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config_combines_checks() {
        let provider = PingDirectoryProvider::new();
        let diagnostics = provider
            .validate_resource_config(
                "pingdirectory_log_retention_policy",
                json!({"name": "p", "type": "size-limit", "id": "p"}),
            )
            .await
            .unwrap();
        // `id` is computed-only and `disk_space_used` is missing for size-limit.
        assert_eq!(diagnostics.len(), 2);
    }

    #[tokio::test]
    async fn test_configure_once() {
        let provider = PingDirectoryProvider::new();
        let config = json!({
            "https_host": "https://localhost:1443",
            "username": "cn=administrator",
            "password": "2FederateM0re",
            "product_version": "10.3.0.0"
        });
        provider.configure(config.clone()).await.unwrap();
        assert!(provider.configure(config).await.is_err());
    }
}
