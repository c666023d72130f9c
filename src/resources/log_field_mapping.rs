//! Log Field Mapping resources and data sources.
//!
//! An `access` mapping renames the fields written by JSON-formatted access
//! loggers; a `default` mapping carries no fields of its own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{
    add_new, adopt_existing, data_source_schema, delete_existing, error_summary, from_state,
    list_data_source_schema, list_filter, list_state, name_attribute, read_existing, read_messages,
    required_value, retain_schema_attributes, to_state, type_attribute, update_existing,
    with_common_attributes, ConfigModel, DataSource, Resource, TypeRules,
};
use crate::client::wire::{oneof_response, schema_urn};
use crate::client::{collection_path, object_path, ConfigClient, ListResponse, Messages};
use crate::error::ProviderError;
use crate::internaltypes::{is_empty_string, string_type_or_nil};
use crate::operations::{add_string_operation_if_necessary, Operation};
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::types::{ReadResult, Value, ValueString, ValueStringSet};

const COLLECTION: &str = "log-field-mappings";
const OBJECT: &str = "log-field-mapping";
const OBJECT_NAME: &str = "Log Field Mapping";

/// Declares the `access` field set once: the wire struct, the model struct,
/// and their mapping, diff and schema functions.
macro_rules! access_log_fields {
    ($($field:ident => $wire:literal),+ $(,)?) => {
        /// Access log field names as sent and received on the wire.
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub struct AccessLogFields {
            $(
                #[doc = concat!("The `", $wire, "` field name.")]
                #[serde(rename = $wire, default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<String>,
            )+
        }

        /// Access log field names in plan and state.
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub struct AccessLogFieldsModel {
            $(
                #[doc = concat!("Field name for `", stringify!($field), "`.")]
                #[serde(default, skip_serializing_if = "Value::is_unknown")]
                pub $field: ValueString,
            )+
        }

        impl AccessLogFieldsModel {
            fn read(&mut self, fields: Option<&AccessLogFields>, expected: Option<&Self>) {
                $(
                    self.$field = match fields {
                        Some(fields) => string_type_or_nil(
                            fields.$field.as_deref(),
                            expected.is_some_and(|e| is_empty_string(&e.$field)),
                        ),
                        None => Value::Null,
                    };
                )+
            }

            fn add_operations(&self, state: &Self, ops: &mut Vec<Operation>) {
                $(add_string_operation_if_necessary(ops, &self.$field, &state.$field, $wire);)+
            }

            fn populate_unknown_values(&mut self) {
                $(self.$field.null_if_unknown();)+
            }

            fn to_wire(&self) -> AccessLogFields {
                AccessLogFields {
                    $($field: self.$field.as_ref().cloned(),)+
                }
            }
        }

        const ACCESS_RULES: TypeRules = TypeRules {
            allowed: &[$((stringify!($field), &["access"])),+],
            required: &[],
        };

        fn with_access_attributes(mut schema: Schema, is_default: bool) -> Schema {
            $(
                let attr = if is_default {
                    Attribute::optional_computed_string()
                } else {
                    Attribute::optional_string()
                };
                schema = schema.with_attribute(
                    stringify!($field),
                    attr.with_description(format!(
                        "When the `type` attribute is set to `access`: the name to use for the \
                         `{}` field in the log.",
                        $wire
                    )),
                );
            )+
            schema
        }
    };
}

access_log_fields! {
    log_field_timestamp => "logFieldTimestamp",
    log_field_connection_id => "logFieldConnectionID",
    log_field_startup_id => "logFieldStartupid",
    log_field_product_name => "logFieldProductName",
    log_field_instance_name => "logFieldInstanceName",
    log_field_operation_id => "logFieldOperationID",
    log_field_message_type => "logFieldMessageType",
    log_field_operation_type => "logFieldOperationType",
    log_field_message_id => "logFieldMessageID",
    log_field_result_code => "logFieldResultCode",
    log_field_message => "logFieldMessage",
    log_field_origin => "logFieldOrigin",
    log_field_requester_dn => "logFieldRequesterDN",
    log_field_disconnect_reason => "logFieldDisconnectReason",
    log_field_processing_time => "logFieldProcessingTime",
    log_field_requester_ip_address => "logFieldRequesterIPAddress",
}

/// Attributes shared by both kinds of mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogFieldMappingCommon {
    /// Schema URNs naming the object kind.
    #[serde(default)]
    pub schemas: Vec<String>,
    /// Name of the object.
    pub id: String,
    /// A description for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Notifications and required actions from the server.
    #[serde(
        rename = "urn:pingidentity:schemas:configuration:messages:2.0",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Messages>,
}

/// An `access` mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccessLogFieldMappingResponse {
    /// Attributes every kind carries.
    #[serde(flatten)]
    pub common: LogFieldMappingCommon,
    /// Access log field names.
    #[serde(flatten)]
    pub fields: AccessLogFields,
}

oneof_response!(
    /// A log field mapping as returned by the configuration API.
    LogFieldMappingResponse, "log-field-mapping" {
        "access" => Access(AccessLogFieldMappingResponse),
        "default" => DefaultMapping(LogFieldMappingCommon),
    }
);

impl LogFieldMappingResponse {
    /// The attributes both kinds carry.
    pub fn common(&self) -> &LogFieldMappingCommon {
        match self {
            Self::Access(r) => &r.common,
            Self::DefaultMapping(r) => r,
        }
    }
}

/// Body of a POST creating a mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLogFieldMappingRequest {
    /// Schema URNs naming the object kind.
    pub schemas: Vec<String>,
    /// Name of the new mapping.
    pub map_name: String,
    /// A description for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Access log field names.
    #[serde(flatten)]
    pub fields: AccessLogFields,
}

impl ConfigClient {
    /// GET a log field mapping.
    pub async fn get_log_field_mapping(
        &self,
        name: &str,
    ) -> Result<LogFieldMappingResponse, ProviderError> {
        self.get(&object_path(COLLECTION, name)).await
    }

    /// List log field mappings.
    pub async fn list_log_field_mappings(
        &self,
        filter: Option<&str>,
    ) -> Result<ListResponse<LogFieldMappingResponse>, ProviderError> {
        self.list(&collection_path(COLLECTION), filter).await
    }
}

/// Plan and state of a log field mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogFieldMappingModel {
    /// Name of the object.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub id: ValueString,
    /// Name of the object.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub name: ValueString,
    /// Timestamp of the last update made by this provider.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub last_updated: ValueString,
    /// Notifications returned by the configuration API.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub notifications: ValueStringSet,
    /// Required actions returned by the configuration API.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub required_actions: ValueStringSet,
    /// The object's kind.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub r#type: ValueString,
    /// A description for this object.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub description: ValueString,
    /// Access log field names, set when `type` is `access`.
    #[serde(flatten)]
    pub access: AccessLogFieldsModel,
}

/// Copy a mapping response into state.
pub fn read_log_field_mapping_response(
    response: &LogFieldMappingResponse,
    state: &mut LogFieldMappingModel,
    expected: Option<&LogFieldMappingModel>,
) {
    let common = response.common();
    state.r#type = Value::Known(response.type_name().to_string());
    state.id = Value::Known(common.id.clone());
    if state.name.is_unknown() {
        state.name = Value::Known(common.id.clone());
    }
    state.description = string_type_or_nil(
        common.description.as_deref(),
        expected.is_some_and(|e| is_empty_string(&e.description)),
    );

    let fields = match response {
        LogFieldMappingResponse::Access(r) => Some(&r.fields),
        LogFieldMappingResponse::DefaultMapping(_) => None,
    };
    state.access.read(fields, expected.map(|e| &e.access));

    let (notifications, required_actions) = read_messages(common.messages.as_ref());
    state.notifications = notifications;
    state.required_actions = required_actions;
}

/// Operations turning `state` into `plan`.
pub fn create_log_field_mapping_operations(
    plan: &LogFieldMappingModel,
    state: &LogFieldMappingModel,
) -> Vec<Operation> {
    let mut ops = Vec::new();
    add_string_operation_if_necessary(
        &mut ops,
        &plan.description,
        &state.description,
        "description",
    );
    plan.access.add_operations(&state.access, &mut ops);
    ops
}

/// Build the Add request for the plan's `type`.
pub fn create_log_field_mapping_request(
    plan: &LogFieldMappingModel,
) -> Result<AddLogFieldMappingRequest, ProviderError> {
    let kind = required_value(&plan.r#type, "type")?;
    let fields = match kind.as_str() {
        "access" => plan.access.to_wire(),
        "default" => AccessLogFields::default(),
        other => {
            return Err(ProviderError::Validation(format!(
                "unsupported {} type '{}'",
                OBJECT_NAME, other
            )))
        },
    };
    Ok(AddLogFieldMappingRequest {
        schemas: vec![schema_urn(OBJECT, Some(&kind))],
        map_name: required_value(&plan.name, "name")?,
        description: plan.description.as_ref().cloned(),
        fields,
    })
}

impl ConfigModel for LogFieldMappingModel {
    type Response = LogFieldMappingResponse;

    fn read_response(&mut self, response: &Self::Response, expected: Option<&Self>) {
        read_log_field_mapping_response(response, self, expected);
    }

    fn operations(plan: &Self, state: &Self) -> Vec<Operation> {
        create_log_field_mapping_operations(plan, state)
    }

    fn populate_unknown_values(&mut self) {
        self.id.null_if_unknown();
        self.name.null_if_unknown();
        self.last_updated.null_if_unknown();
        self.notifications.null_if_unknown();
        self.required_actions.null_if_unknown();
        self.r#type.null_if_unknown();
        self.description.null_if_unknown();
        self.access.populate_unknown_values();
    }

    fn set_last_updated(&mut self, value: ValueString) {
        self.last_updated = value;
    }

    fn type_attr(&self) -> Option<&ValueString> {
        Some(&self.r#type)
    }
}

/// Schema for the created (`is_default = false`) or adopted resource.
pub fn log_field_mapping_schema(is_default: bool) -> Schema {
    let description = if is_default {
        Attribute::optional_computed_string()
    } else {
        Attribute::optional_string()
    };
    let schema = Schema::v0()
        .with_description(if is_default {
            "Manages a Log Field Mapping that already exists on the server."
        } else {
            "Manages a Log Field Mapping."
        })
        .with_attribute("name", name_attribute(OBJECT_NAME))
        .with_attribute(
            "type",
            type_attribute(LogFieldMappingResponse::TYPES, OBJECT_NAME, is_default),
        )
        .with_attribute(
            "description",
            description.with_description("A description for this Log Field Mapping"),
        );
    with_common_attributes(with_access_attributes(schema, is_default), OBJECT_NAME)
}

/// `pingdirectory_log_field_mapping` and
/// `pingdirectory_default_log_field_mapping`.
pub struct LogFieldMappingResource {
    is_default: bool,
}

impl LogFieldMappingResource {
    /// The adopting (`true`) or creating (`false`) resource.
    pub fn new(is_default: bool) -> Self {
        Self { is_default }
    }
}

#[async_trait]
impl Resource for LogFieldMappingResource {
    fn type_name(&self) -> &'static str {
        if self.is_default {
            "pingdirectory_default_log_field_mapping"
        } else {
            "pingdirectory_log_field_mapping"
        }
    }

    fn schema(&self) -> Schema {
        log_field_mapping_schema(self.is_default)
    }

    fn validate_config(&self, config: &JsonValue) -> Vec<Diagnostic> {
        ACCESS_RULES.check(config, self.type_name(), !self.is_default)
    }

    async fn create(
        &self,
        client: &ConfigClient,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let plan: LogFieldMappingModel = from_state(plan)?;
        let name = required_value(&plan.name, "name")?;
        let state = if self.is_default {
            adopt_existing(client, &object_path(COLLECTION, &name), plan, OBJECT_NAME).await?
        } else {
            let body = create_log_field_mapping_request(&plan)
                .map_err(|e| e.context(error_summary("creating", OBJECT_NAME)))?;
            add_new(client, &collection_path(COLLECTION), &body, plan, OBJECT_NAME).await?
        };
        to_state(&state)
    }

    async fn read(
        &self,
        client: &ConfigClient,
        state: JsonValue,
    ) -> Result<ReadResult, ProviderError> {
        let state: LogFieldMappingModel = from_state(state)?;
        let name = required_value(&state.name, "name")?;
        read_existing(client, &object_path(COLLECTION, &name), state, OBJECT_NAME).await
    }

    async fn update(
        &self,
        client: &ConfigClient,
        prior: JsonValue,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let prior: LogFieldMappingModel = from_state(prior)?;
        let plan: LogFieldMappingModel = from_state(plan)?;
        let name = required_value(&prior.name, "name")?;
        update_existing(client, &object_path(COLLECTION, &name), prior, plan, OBJECT_NAME).await
    }

    async fn delete(&self, client: &ConfigClient, state: JsonValue) -> Result<(), ProviderError> {
        let state: LogFieldMappingModel = from_state(state)?;
        let name = required_value(&state.name, "name")?;
        if self.is_default {
            debug!(name = %name, "default Log Field Mapping is left in place on delete");
            return Ok(());
        }
        delete_existing(client, &object_path(COLLECTION, &name), OBJECT_NAME).await
    }
}

/// `pingdirectory_log_field_mapping` data source.
pub struct LogFieldMappingDataSource;

#[async_trait]
impl DataSource for LogFieldMappingDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_log_field_mapping"
    }

    fn schema(&self) -> Schema {
        data_source_schema(&log_field_mapping_schema(false), Some("name"))
    }

    async fn read(
        &self,
        client: &ConfigClient,
        config: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let mut state: LogFieldMappingModel = from_state(config)?;
        let name = required_value(&state.name, "name")?;
        let response = client
            .get_log_field_mapping(&name)
            .await
            .map_err(|e| e.context(error_summary("getting", OBJECT_NAME)))?;
        read_log_field_mapping_response(&response, &mut state, None);
        state.populate_unknown_values();
        Ok(retain_schema_attributes(to_state(&state)?, &self.schema()))
    }
}

/// `pingdirectory_log_field_mappings` list data source.
pub struct LogFieldMappingsDataSource;

#[async_trait]
impl DataSource for LogFieldMappingsDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_log_field_mappings"
    }

    fn schema(&self) -> Schema {
        list_data_source_schema(OBJECT_NAME)
    }

    async fn read(
        &self,
        client: &ConfigClient,
        config: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let filter = list_filter(&config);
        let list = client
            .list_log_field_mappings(filter)
            .await
            .map_err(|e| e.context(error_summary("listing", OBJECT_NAME)))?;
        Ok(list_state(filter, list.resources.iter().map(|r| r.common().id.clone())))
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

    fn access_response() -> JsonValue {
        json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:log-field-mapping:access"],
            "id": "Splunk",
            "logFieldTimestamp": "time",
            "logFieldConnectionID": "conn",
            "logFieldRequesterDN": ""
        })
    }

    #[test]
    fn test_read_access_mapping() {
        let response: LogFieldMappingResponse = serde_json::from_value(access_response()).unwrap();
        let mut state = LogFieldMappingModel::default();
        read_log_field_mapping_response(&response, &mut state, None);

        assert_eq!(state.r#type, ValueString::from("access"));
        assert_eq!(state.access.log_field_timestamp, ValueString::from("time"));
        assert_eq!(state.access.log_field_connection_id, ValueString::from("conn"));
        assert_eq!(state.access.log_field_requester_dn, ValueString::from(""));
        assert!(state.access.log_field_message.is_null());
        assert!(create_log_field_mapping_operations(&state, &state).is_empty());
    }

    #[test]
    fn test_default_mapping_nulls_access_fields() {
        let response: LogFieldMappingResponse = serde_json::from_value(json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:log-field-mapping:default"],
            "id": "Plain"
        }))
        .unwrap();
        let mut state = LogFieldMappingModel::default();
        read_log_field_mapping_response(&response, &mut state, None);
        assert_eq!(state.r#type, ValueString::from("default"));
        assert!(state.access.log_field_timestamp.is_null());
        assert_eq!(to_state(&state).unwrap()["log_field_timestamp"], JsonValue::Null);
    }

    #[test]
    fn test_flattened_model_keys() {
        let model: LogFieldMappingModel = serde_json::from_value(json!({
            "name": "Splunk",
            "log_field_message": "msg",
            "log_field_origin": null
        }))
        .unwrap();
        assert_eq!(model.access.log_field_message, ValueString::from("msg"));
        assert!(model.access.log_field_origin.is_null());
        assert!(model.access.log_field_timestamp.is_unknown());
    }

    #[test]
    fn test_access_field_change_uses_wire_name() {
        let response: LogFieldMappingResponse = serde_json::from_value(access_response()).unwrap();
        let mut state = LogFieldMappingModel::default();
        read_log_field_mapping_response(&response, &mut state, None);

        let mut plan = state.clone();
        plan.access.log_field_requester_ip_address = ValueString::from("ip");
        assert_eq!(
            create_log_field_mapping_operations(&plan, &state),
            vec![Operation::replace("logFieldRequesterIPAddress", json!("ip"))]
        );
    }

    #[test]
    fn test_access_fields_rejected_for_default_type() {
        let resource = LogFieldMappingResource::new(false);
        let diagnostics = resource.validate_config(&json!({
            "name": "m",
            "type": "default",
            "log_field_message": "msg"
        }));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("log_field_message"));
    }

    #[tokio::test]
    async fn test_create_access_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config/log-field-mappings"))
            .and(body_json(json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:log-field-mapping:access"],
                "mapName": "Splunk",
                "logFieldTimestamp": "time",
                "logFieldConnectionID": "conn",
                "logFieldRequesterDN": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(access_response()))
            .expect(1)
            .mount(&server)
            .await;

        let state = LogFieldMappingResource::new(false)
            .create(
                &client(&server),
                json!({
                    "name": "Splunk",
                    "type": "access",
                    "description": null,
                    "log_field_timestamp": "time",
                    "log_field_connection_id": "conn",
                    "log_field_requester_dn": ""
                }),
            )
            .await
            .unwrap();
        assert_eq!(state["log_field_requester_dn"], "");
        assert_eq!(state["log_field_message"], JsonValue::Null);
        assert!(state["last_updated"].is_string());
    }

    #[tokio::test]
    async fn test_delete_sends_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/config/log-field-mappings/Splunk"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        LogFieldMappingResource::new(false)
            .delete(&client(&server), json!({"name": "Splunk"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_failure_carries_summary() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(
                ResponseTemplate::new(409).set_body_string("in use by Splunk Access Logger"),
            )
            .mount(&server)
            .await;

        let err = LogFieldMappingResource::new(false)
            .delete(&client(&server), json!({"name": "Splunk"}))
            .await
            .unwrap_err();
        let diagnostic = err.to_diagnostic();
        assert_eq!(
            diagnostic.summary,
            "An error occurred while deleting the Log Field Mapping"
        );
        assert!(diagnostic.detail.unwrap().contains("in use by Splunk Access Logger"));
    }
}
