//! Group Implementation resource and data sources.
//!
//! Group implementations ship with the server and cannot be created or
//! deleted, so only the adopting `pingdirectory_default_group_implementation`
//! resource exists.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{
    adopt_existing, data_source_schema, error_summary, from_state, list_data_source_schema,
    list_filter, list_state, name_attribute, read_existing, read_messages, required_value,
    retain_schema_attributes, to_state, type_attribute, update_existing, with_common_attributes,
    ConfigModel, DataSource, Resource,
};
use crate::client::wire::oneof_response;
use crate::client::{collection_path, object_path, ConfigClient, ListResponse, Messages};
use crate::error::ProviderError;
use crate::internaltypes::{bool_type_or_nil, is_empty_string, string_type_or_nil};
use crate::operations::{
    add_bool_operation_if_necessary, add_string_operation_if_necessary, Operation,
};
use crate::schema::{Attribute, Schema};
use crate::types::{ReadResult, Value, ValueBool, ValueString, ValueStringSet};

const COLLECTION: &str = "group-implementations";
const OBJECT_NAME: &str = "Group Implementation";

/// Wire shape shared by every group implementation kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupImplementationFields {
    /// Schema URNs naming the object kind.
    #[serde(default)]
    pub schemas: Vec<String>,
    /// Name of the object.
    pub id: String,
    /// A description for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the object is enabled.
    pub enabled: bool,
    /// Notifications and required actions from the server.
    #[serde(
        rename = "urn:pingidentity:schemas:configuration:messages:2.0",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Messages>,
}

oneof_response!(
    /// A group implementation as returned by the configuration API.
    GroupImplementationResponse, "group-implementation" {
        "static" => Static(GroupImplementationFields),
        "dynamic" => Dynamic(GroupImplementationFields),
        "virtual-static" => VirtualStatic(GroupImplementationFields),
        "inverted-static" => InvertedStatic(GroupImplementationFields),
    }
);

impl GroupImplementationResponse {
    /// The populated variant's fields.
    pub fn fields(&self) -> &GroupImplementationFields {
        match self {
            Self::Static(f)
            | Self::Dynamic(f)
            | Self::VirtualStatic(f)
            | Self::InvertedStatic(f) => f,
        }
    }
}

impl ConfigClient {
    /// GET a group implementation.
    pub async fn get_group_implementation(
        &self,
        name: &str,
    ) -> Result<GroupImplementationResponse, ProviderError> {
        self.get(&object_path(COLLECTION, name)).await
    }

    /// List group implementations.
    pub async fn list_group_implementations(
        &self,
        filter: Option<&str>,
    ) -> Result<ListResponse<GroupImplementationResponse>, ProviderError> {
        self.list(&collection_path(COLLECTION), filter).await
    }
}

/// Plan and state of a group implementation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupImplementationModel {
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
    /// Whether the object is enabled.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub enabled: ValueBool,
}

/// Copy a group implementation response into state.
pub fn read_group_implementation_response(
    response: &GroupImplementationResponse,
    state: &mut GroupImplementationModel,
    expected: Option<&GroupImplementationModel>,
) {
    let fields = response.fields();
    state.r#type = Value::Known(response.type_name().to_string());
    state.id = Value::Known(fields.id.clone());
    if state.name.is_unknown() {
        state.name = Value::Known(fields.id.clone());
    }
    state.description = string_type_or_nil(
        fields.description.as_deref(),
        expected.is_some_and(|e| is_empty_string(&e.description)),
    );
    state.enabled = bool_type_or_nil(Some(fields.enabled));

    let (notifications, required_actions) = read_messages(fields.messages.as_ref());
    state.notifications = notifications;
    state.required_actions = required_actions;
}

/// Operations turning `state` into `plan`.
pub fn create_group_implementation_operations(
    plan: &GroupImplementationModel,
    state: &GroupImplementationModel,
) -> Vec<Operation> {
    let mut ops = Vec::new();
    add_string_operation_if_necessary(
        &mut ops,
        &plan.description,
        &state.description,
        "description",
    );
    add_bool_operation_if_necessary(&mut ops, &plan.enabled, &state.enabled, "enabled");
    ops
}

impl ConfigModel for GroupImplementationModel {
    type Response = GroupImplementationResponse;

    fn read_response(&mut self, response: &Self::Response, expected: Option<&Self>) {
        read_group_implementation_response(response, self, expected);
    }

    fn operations(plan: &Self, state: &Self) -> Vec<Operation> {
        create_group_implementation_operations(plan, state)
    }

    fn populate_unknown_values(&mut self) {
        self.id.null_if_unknown();
        self.name.null_if_unknown();
        self.last_updated.null_if_unknown();
        self.notifications.null_if_unknown();
        self.required_actions.null_if_unknown();
        self.r#type.null_if_unknown();
        self.description.null_if_unknown();
        self.enabled.null_if_unknown();
    }

    fn set_last_updated(&mut self, value: ValueString) {
        self.last_updated = value;
    }

    fn type_attr(&self) -> Option<&ValueString> {
        Some(&self.r#type)
    }
}

/// Schema of `pingdirectory_default_group_implementation`.
pub fn group_implementation_schema() -> Schema {
    let schema = Schema::v0()
        .with_description("Manages a Group Implementation that already exists on the server.")
        .with_attribute("name", name_attribute(OBJECT_NAME))
        .with_attribute(
            "type",
            type_attribute(GroupImplementationResponse::TYPES, OBJECT_NAME, true),
        )
        .with_attribute(
            "description",
            Attribute::optional_computed_string()
                .with_description("A description for this Group Implementation"),
        )
        .with_attribute(
            "enabled",
            Attribute::optional_computed_bool()
                .with_description("Indicates whether the Group Implementation is enabled."),
        );
    with_common_attributes(schema, OBJECT_NAME)
}

/// `pingdirectory_default_group_implementation`.
pub struct DefaultGroupImplementationResource;

#[async_trait]
impl Resource for DefaultGroupImplementationResource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_default_group_implementation"
    }

    fn schema(&self) -> Schema {
        group_implementation_schema()
    }

    async fn create(
        &self,
        client: &ConfigClient,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let plan: GroupImplementationModel = from_state(plan)?;
        let name = required_value(&plan.name, "name")?;
        let state =
            adopt_existing(client, &object_path(COLLECTION, &name), plan, OBJECT_NAME).await?;
        to_state(&state)
    }

    async fn read(
        &self,
        client: &ConfigClient,
        state: JsonValue,
    ) -> Result<ReadResult, ProviderError> {
        let state: GroupImplementationModel = from_state(state)?;
        let name = required_value(&state.name, "name")?;
        read_existing(client, &object_path(COLLECTION, &name), state, OBJECT_NAME).await
    }

    async fn update(
        &self,
        client: &ConfigClient,
        prior: JsonValue,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let prior: GroupImplementationModel = from_state(prior)?;
        let plan: GroupImplementationModel = from_state(plan)?;
        let name = required_value(&prior.name, "name")?;
        update_existing(client, &object_path(COLLECTION, &name), prior, plan, OBJECT_NAME).await
    }

    async fn delete(&self, _client: &ConfigClient, state: JsonValue) -> Result<(), ProviderError> {
        debug!(state = %state, "Group Implementation is left in place on delete");
        Ok(())
    }
}

/// `pingdirectory_group_implementation` data source.
pub struct GroupImplementationDataSource;

#[async_trait]
impl DataSource for GroupImplementationDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_group_implementation"
    }

    fn schema(&self) -> Schema {
        data_source_schema(&group_implementation_schema(), Some("name"))
    }

    async fn read(
        &self,
        client: &ConfigClient,
        config: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let mut state: GroupImplementationModel = from_state(config)?;
        let name = required_value(&state.name, "name")?;
        let response = client
            .get_group_implementation(&name)
            .await
            .map_err(|e| e.context(error_summary("getting", OBJECT_NAME)))?;
        read_group_implementation_response(&response, &mut state, None);
        state.populate_unknown_values();
        Ok(retain_schema_attributes(to_state(&state)?, &self.schema()))
    }
}

/// `pingdirectory_group_implementations` list data source.
pub struct GroupImplementationsDataSource;

#[async_trait]
impl DataSource for GroupImplementationsDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_group_implementations"
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
            .list_group_implementations(filter)
            .await
            .map_err(|e| e.context(error_summary("listing", OBJECT_NAME)))?;
        Ok(list_state(filter, list.resources.iter().map(|r| r.fields().id.clone())))
    }
}
