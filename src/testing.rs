//! Testing utilities for provider implementations.
//!
//! [`ProviderTester`] drives a [`ProviderService`] through the same steps
//! Terraform would (plan, apply, refresh) without any plugin transport.
//!
//! # Example
//!
//! ```ignore
//! use pingdirectory_provider::client::ConfigClient;
//! use pingdirectory_provider::testing::ProviderTester;
//! use pingdirectory_provider::PingDirectoryProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_policy() {
//!     let client = ConfigClient::with_base_url(mock_uri, "cn=administrator", "password");
//!     let tester = ProviderTester::new(PingDirectoryProvider::with_client(client));
//!
//!     let state = tester
//!         .lifecycle_create(
//!             "pingdirectory_log_retention_policy",
//!             json!({"name": "old-logs", "type": "file-count", "number_of_files": 5}),
//!         )
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(state["number_of_files"], 5);
//! }
//! ```

use crate::error::ProviderError;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, ReadResult};
use serde_json::Value;

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the error diagnostics if there are any.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
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

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider.plan(resource_type, None, config).await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config)
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<ReadResult, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan, create, read.
    ///
    /// Returns the refreshed state.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.refresh(resource_type, created).await
    }

    /// Run a full update lifecycle: plan, update, read.
    ///
    /// A plan without changes skips the update and refreshes the prior state.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        if plan.changes.is_empty() {
            return self.refresh(resource_type, prior_state).await;
        }
        if plan.requires_replace {
            self.delete(resource_type, prior_state).await?;
            let created = self.create(resource_type, plan.planned_state).await?;
            return self.refresh(resource_type, created).await;
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.refresh(resource_type, updated).await
    }

    /// Run a full delete lifecycle: plan, delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Run create, update and delete in sequence.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }

    async fn refresh(&self, resource_type: &str, state: Value) -> Result<Value, TestError> {
        let result = self.read(resource_type, state).await?;
        check_diagnostics(result.diagnostics)?;
        result.state.ok_or(TestError::Removed)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
    /// The resource disappeared from the server during a refresh.
    Removed,
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
            TestError::Removed => write!(f, "Resource was removed from state on refresh"),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

/// Check diagnostics and return an error if there are any errors.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result indicates the resource will be created.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan leaves an attribute unknown until apply.
///
/// # Panics
///
/// Panics if the attribute has no pending change.
pub fn assert_plan_unknown(plan: &PlanResult, path: &str) {
    let unknown = plan
        .changes
        .iter()
        .any(|c| c.path == path && c.after.is_none());
    assert!(unknown, "Expected '{}' to be unknown after plan", path);
}

/// Assert that a refresh dropped the resource from state.
///
/// # Panics
///
/// Panics if the read still returned a state.
pub fn assert_removed(result: &ReadResult) {
    assert!(
        result.state.is_none(),
        "Expected the resource to be removed, but read returned {:?}",
        result.state
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

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
/// Panics if no error diagnostic contains the given substring.
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
            .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ConfigClient;
    use crate::provider::PingDirectoryProvider;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const POLICY: &str = "pingdirectory_log_retention_policy";

    fn policy_response(files: i64) -> Value {
        json!({
            "schemas": [
                "urn:pingidentity:schemas:configuration:2.0:log-retention-policy:file-count"
            ],
            "id": "old-logs",
            "numberOfFiles": files
        })
    }

    async fn tester(server: &MockServer) -> ProviderTester<PingDirectoryProvider> {
        let client = ConfigClient::with_base_url(
            format!("{}/config", server.uri()),
            "cn=administrator",
            "password",
        );
        ProviderTester::new(PingDirectoryProvider::with_client(client))
    }

    #[tokio::test]
    async fn test_tester_resource_types() {
        let server = MockServer::start().await;
        let tester = tester(&server).await;
        let types = tester.resource_types();
        assert!(types.contains(&POLICY.to_string()));
        assert!(tester
            .data_source_types()
            .contains(&"pingdirectory_log_retention_policies".to_string()));
    }

    #[tokio::test]
    async fn test_tester_validate_provider_config() {
        let server = MockServer::start().await;
        let tester = tester(&server).await;
        let err = tester
            .validate_provider_config(json!({"https_host": "ldap://localhost"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(_)));
    }

    #[tokio::test]
    async fn test_tester_plan_create() {
        let server = MockServer::start().await;
        let tester = tester(&server).await;
        let plan = tester
            .plan_create(
                POLICY,
                json!({"name": "old-logs", "type": "file-count", "number_of_files": 5}),
            )
            .await
            .unwrap();

        assert_plan_creates(&plan);
        assert_plan_unknown(&plan, "id");
        assert_plan_unknown(&plan, "last_updated");
        assert_eq!(plan.planned_state["description"], Value::Null);
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config/log-retention-policies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(policy_response(5)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/config/log-retention-policies/old-logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(policy_response(7)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/config/log-retention-policies/old-logs"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/config/log-retention-policies/old-logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(policy_response(5)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/config/log-retention-policies/old-logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(policy_response(7)))
            .mount(&server)
            .await;

        let tester = tester(&server).await;
        let state = tester
            .lifecycle_crud(
                POLICY,
                json!({"name": "old-logs", "type": "file-count", "number_of_files": 5}),
                json!({"name": "old-logs", "type": "file-count", "number_of_files": 7}),
            )
            .await
            .unwrap();

        assert_eq!(state["number_of_files"], 7);
        assert_eq!(state["id"], "old-logs");
    }

    #[tokio::test]
    async fn test_tester_rename_replaces() {
        let server = MockServer::start().await;
        let tester = tester(&server).await;
        let prior = json!({
            "id": "old-logs",
            "name": "old-logs",
            "type": "file-count",
            "number_of_files": 5,
            "last_updated": "Monday, 19-Oct-26 09:05:03 UTC"
        });
        let plan = tester
            .plan_update(
                POLICY,
                prior,
                json!({"name": "new-logs", "type": "file-count", "number_of_files": 5}),
            )
            .await
            .unwrap();
        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, "name");
    }

    #[tokio::test]
    async fn test_tester_read_missing_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/log-retention-policies/old-logs"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tester = tester(&server).await;
        let state = json!({"name": "old-logs", "type": "file-count", "number_of_files": 5});
        let plan = tester.plan_update(POLICY, state.clone(), state).await.unwrap();
        assert_plan_no_changes(&plan);

        let result = tester
            .read(POLICY, json!({"name": "old-logs", "type": "file-count"}))
            .await
            .unwrap();
        assert_removed(&result);

        let err = tester
            .lifecycle_update(
                POLICY,
                json!({"name": "old-logs", "type": "file-count", "number_of_files": 5}),
                json!({"name": "old-logs", "type": "file-count", "number_of_files": 5}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Removed));
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("Invalid attribute combination")];
        assert_error_contains(&diagnostics, "Invalid");
        assert_error_contains(&diagnostics, "combination");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }
}
