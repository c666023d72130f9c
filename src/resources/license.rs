//! License resource and data source.
//!
//! The license is a singleton: there is exactly one, addressed without a
//! name, and it is edited in place rather than created.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{
    adopt_existing, data_source_schema, error_summary, from_state, read_existing, read_messages,
    retain_schema_attributes, to_state, update_existing, with_common_attributes, ConfigModel,
    DataSource, Resource,
};
use crate::client::{ConfigClient, Messages};
use crate::error::ProviderError;
use crate::internaltypes::{is_empty_string, string_type_or_nil};
use crate::operations::{add_string_operation_if_necessary, Operation};
use crate::schema::{Attribute, Schema};
use crate::types::{ReadResult, Value, ValueString, ValueStringSet};

const PATH: &str = "/license";
const OBJECT_ID: &str = "license";
const OBJECT_NAME: &str = "License";

/// The license as returned by the configuration API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseResponse {
    /// Schema URNs naming the object kind.
    #[serde(default)]
    pub schemas: Vec<String>,
    /// License key for the Directory Server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_platform_license_key: Option<String>,
    /// License key for the Directory Proxy Server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_proxy_server_license_key: Option<String>,
    /// License key for the Data Sync Server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_sync_server_license_key: Option<String>,
    /// Notifications and required actions from the server.
    #[serde(
        rename = "urn:pingidentity:schemas:configuration:messages:2.0",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Messages>,
}

impl ConfigClient {
    /// GET the license.
    pub async fn get_license(&self) -> Result<LicenseResponse, ProviderError> {
        self.get(PATH).await
    }
}

/// Plan and state of the license.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LicenseModel {
    /// Name of the object.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub id: ValueString,
    /// Timestamp of the last update made by this provider.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub last_updated: ValueString,
    /// Notifications returned by the configuration API.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub notifications: ValueStringSet,
    /// Required actions returned by the configuration API.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub required_actions: ValueStringSet,
    /// License key for the Directory Server.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub directory_platform_license_key: ValueString,
    /// License key for the Directory Proxy Server.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub directory_proxy_server_license_key: ValueString,
    /// License key for the Data Sync Server.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub data_sync_server_license_key: ValueString,
}

/// Copy the license response into state.
pub fn read_license_response(
    response: &LicenseResponse,
    state: &mut LicenseModel,
    expected: Option<&LicenseModel>,
) {
    let empty = |value: Option<&ValueString>| value.is_some_and(is_empty_string);

    if !state.id.is_known() {
        state.id = ValueString::from(OBJECT_ID);
    }
    state.directory_platform_license_key = string_type_or_nil(
        response.directory_platform_license_key.as_deref(),
        empty(expected.map(|e| &e.directory_platform_license_key)),
    );
    state.directory_proxy_server_license_key = string_type_or_nil(
        response.directory_proxy_server_license_key.as_deref(),
        empty(expected.map(|e| &e.directory_proxy_server_license_key)),
    );
    state.data_sync_server_license_key = string_type_or_nil(
        response.data_sync_server_license_key.as_deref(),
        empty(expected.map(|e| &e.data_sync_server_license_key)),
    );

    let (notifications, required_actions) = read_messages(response.messages.as_ref());
    state.notifications = notifications;
    state.required_actions = required_actions;
}

/// Operations turning `state` into `plan`.
pub fn create_license_operations(plan: &LicenseModel, state: &LicenseModel) -> Vec<Operation> {
    let mut ops = Vec::new();
    add_string_operation_if_necessary(
        &mut ops,
        &plan.directory_platform_license_key,
        &state.directory_platform_license_key,
        "directoryPlatformLicenseKey",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.directory_proxy_server_license_key,
        &state.directory_proxy_server_license_key,
        "directoryProxyServerLicenseKey",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.data_sync_server_license_key,
        &state.data_sync_server_license_key,
        "dataSyncServerLicenseKey",
    );
    ops
}

impl ConfigModel for LicenseModel {
    type Response = LicenseResponse;

    fn read_response(&mut self, response: &Self::Response, expected: Option<&Self>) {
        read_license_response(response, self, expected);
    }

    fn operations(plan: &Self, state: &Self) -> Vec<Operation> {
        create_license_operations(plan, state)
    }

    fn populate_unknown_values(&mut self) {
        self.id.null_if_unknown();
        self.last_updated.null_if_unknown();
        self.notifications.null_if_unknown();
        self.required_actions.null_if_unknown();
        self.directory_platform_license_key.null_if_unknown();
        self.directory_proxy_server_license_key.null_if_unknown();
        self.data_sync_server_license_key.null_if_unknown();
    }

    fn set_last_updated(&mut self, value: ValueString) {
        self.last_updated = value;
    }
}

/// Schema of `pingdirectory_license`.
pub fn license_schema() -> Schema {
    let key = |product: &str| {
        Attribute::optional_computed_string()
            .sensitive()
            .with_description(format!("License key for {}.", product))
    };
    let schema = Schema::v0()
        .with_description("Manages the server License.")
        .with_attribute("directory_platform_license_key", key("the PingDirectory platform"))
        .with_attribute("directory_proxy_server_license_key", key("PingDirectoryProxy"))
        .with_attribute("data_sync_server_license_key", key("PingDataSync"));
    with_common_attributes(schema, OBJECT_NAME)
}

/// `pingdirectory_license`.
pub struct LicenseResource;

#[async_trait]
impl Resource for LicenseResource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_license"
    }

    fn schema(&self) -> Schema {
        license_schema()
    }

    async fn create(
        &self,
        client: &ConfigClient,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let plan: LicenseModel = from_state(plan)?;
        let state = adopt_existing(client, PATH, plan, OBJECT_NAME).await?;
        to_state(&state)
    }

    async fn read(
        &self,
        client: &ConfigClient,
        state: JsonValue,
    ) -> Result<ReadResult, ProviderError> {
        let state: LicenseModel = from_state(state)?;
        read_existing(client, PATH, state, OBJECT_NAME).await
    }

    async fn update(
        &self,
        client: &ConfigClient,
        prior: JsonValue,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        update_existing(
            client,
            PATH,
            from_state::<LicenseModel>(prior)?,
            from_state(plan)?,
            OBJECT_NAME,
        )
        .await
    }

    async fn delete(&self, _client: &ConfigClient, _state: JsonValue) -> Result<(), ProviderError> {
        debug!("License is left in place on delete");
        Ok(())
    }

    fn import_attribute(&self) -> &'static str {
        "id"
    }
}

/// `pingdirectory_license` data source.
pub struct LicenseDataSource;

#[async_trait]
impl DataSource for LicenseDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_license"
    }

    fn schema(&self) -> Schema {
        data_source_schema(&license_schema(), None)
    }

    async fn read(
        &self,
        client: &ConfigClient,
        _config: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let response = client
            .get_license()
            .await
            .map_err(|e| e.context(error_summary("getting", OBJECT_NAME)))?;
        let mut state = LicenseModel::default();
        read_license_response(&response, &mut state, None);
        state.populate_unknown_values();
        Ok(retain_schema_attributes(to_state(&state)?, &self.schema()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ConfigClient {
        ConfigClient::with_base_url(
            format!("{}/config", server.uri()),
            "cn=administrator",
            "password",
        )
    }

    fn license_response() -> JsonValue {
        json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:license"],
            "directoryPlatformLicenseKey": "PD-KEY",
            "urn:pingidentity:schemas:configuration:messages:2.0": {
                "requiredActions": [{"type": "componentRestart", "synopsis": "Restart the server"}]
            }
        })
    }

    #[test]
    fn test_absent_keys_follow_expected_values() {
        let response: LicenseResponse = serde_json::from_value(license_response()).unwrap();
        let expected = LicenseModel {
            data_sync_server_license_key: ValueString::from(""),
            ..Default::default()
        };
        let mut state = LicenseModel::default();
        read_license_response(&response, &mut state, Some(&expected));

        assert_eq!(state.id, ValueString::from("license"));
        assert_eq!(state.directory_platform_license_key, ValueString::from("PD-KEY"));
        assert!(state.directory_proxy_server_license_key.is_null());
        assert_eq!(state.data_sync_server_license_key, ValueString::from(""));
        assert!(create_license_operations(&state, &state).is_empty());
    }

    #[test]
    fn test_license_keys_are_sensitive() {
        let schema = license_schema();
        assert!(schema.attributes["directory_platform_license_key"].flags.sensitive);
        let ds = LicenseDataSource.schema();
        assert!(ds.attributes["directory_platform_license_key"].flags.sensitive);
        assert!(ds.attributes["directory_platform_license_key"].flags.computed);
    }

    #[tokio::test]
    async fn test_set_license_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/license"))
            .respond_with(ResponseTemplate::new(200).set_body_json(license_response()))
            .mount(&server)
            .await;
        let mut updated = license_response();
        updated["directoryProxyServerLicenseKey"] = json!("PROXY-KEY");
        Mock::given(method("PATCH"))
            .and(path("/config/license"))
            .and(body_json(json!({"operations": [
                {"op": "replace", "path": "directoryProxyServerLicenseKey", "value": "PROXY-KEY"}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(updated))
            .expect(1)
            .mount(&server)
            .await;

        let state = LicenseResource
            .create(
                &client(&server),
                json!({"directory_proxy_server_license_key": "PROXY-KEY"}),
            )
            .await
            .unwrap();
        assert_eq!(state["id"], "license");
        assert_eq!(state["directory_platform_license_key"], "PD-KEY");
        assert_eq!(state["directory_proxy_server_license_key"], "PROXY-KEY");
        assert_eq!(
            state["required_actions"],
            json!(["componentRestart: Restart the server"])
        );
    }

    #[tokio::test]
    async fn test_read_not_found_removes_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/license"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = LicenseResource
            .read(&client(&server), json!({"id": "license"}))
            .await
            .unwrap();
        assert!(result.state.is_none());
        assert_eq!(LicenseResource.import_state("license"), json!({"id": "license"}));
    }
}
