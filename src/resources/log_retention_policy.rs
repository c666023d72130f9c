//! Log Retention Policy resources and data sources.
//!
//! `pingdirectory_log_retention_policy` creates and deletes policies;
//! `pingdirectory_default_log_retention_policy` adopts one that already
//! exists on the server.

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
use crate::internaltypes::{int64_type_or_nil, is_empty_string, string_type_or_nil};
use crate::operations::{
    add_int64_operation_if_necessary, add_string_operation_if_necessary, Operation,
};
use crate::schema::{Attribute, Diagnostic, Schema, Validator};
use crate::types::{ReadResult, Value, ValueInt64, ValueString, ValueStringSet};

const COLLECTION: &str = "log-retention-policies";
const OBJECT: &str = "log-retention-policy";
const OBJECT_NAME: &str = "Log Retention Policy";

/// Attributes shared by every kind of log retention policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogRetentionPolicyCommon {
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

/// A `time-limit` policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLimitLogRetentionPolicyResponse {
    /// Attributes every kind carries.
    #[serde(flatten)]
    pub common: LogRetentionPolicyCommon,
    /// How long log files are kept.
    pub retain_duration: String,
}

/// A `file-count` policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCountLogRetentionPolicyResponse {
    /// Attributes every kind carries.
    #[serde(flatten)]
    pub common: LogRetentionPolicyCommon,
    /// Number of log files kept.
    pub number_of_files: i64,
}

/// A `free-disk-space` policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeDiskSpaceLogRetentionPolicyResponse {
    /// Attributes every kind carries.
    #[serde(flatten)]
    pub common: LogRetentionPolicyCommon,
    /// Free disk space to keep available.
    pub free_disk_space: String,
}

/// A `size-limit` policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeLimitLogRetentionPolicyResponse {
    /// Attributes every kind carries.
    #[serde(flatten)]
    pub common: LogRetentionPolicyCommon,
    /// Disk space the log files may use.
    pub disk_space_used: String,
}

oneof_response!(
    /// A log retention policy as returned by the configuration API.
    LogRetentionPolicyResponse, "log-retention-policy" {
        "time-limit" => TimeLimit(TimeLimitLogRetentionPolicyResponse),
        "file-count" => FileCount(FileCountLogRetentionPolicyResponse),
        "free-disk-space" => FreeDiskSpace(FreeDiskSpaceLogRetentionPolicyResponse),
        "size-limit" => SizeLimit(SizeLimitLogRetentionPolicyResponse),
        "never-delete" => NeverDelete(LogRetentionPolicyCommon),
    }
);

impl LogRetentionPolicyResponse {
    /// The attributes every kind carries.
    pub fn common(&self) -> &LogRetentionPolicyCommon {
        match self {
            Self::TimeLimit(r) => &r.common,
            Self::FileCount(r) => &r.common,
            Self::FreeDiskSpace(r) => &r.common,
            Self::SizeLimit(r) => &r.common,
            Self::NeverDelete(r) => r,
        }
    }
}

/// Body of a POST creating a policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLogRetentionPolicyRequest {
    /// Schema URNs naming the object kind.
    pub schemas: Vec<String>,
    /// Name of the new policy.
    pub policy_name: String,
    /// A description for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// How long log files are kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retain_duration: Option<String>,
    /// Number of log files kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_files: Option<i64>,
    /// Free disk space to keep available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_disk_space: Option<String>,
    /// Disk space the log files may use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_space_used: Option<String>,
}

impl AddLogRetentionPolicyRequest {
    fn new(kind: &str, policy_name: String) -> Self {
        Self {
            schemas: vec![schema_urn(OBJECT, Some(kind))],
            policy_name,
            description: None,
            retain_duration: None,
            number_of_files: None,
            free_disk_space: None,
            disk_space_used: None,
        }
    }
}

impl ConfigClient {
    /// GET a log retention policy.
    pub async fn get_log_retention_policy(
        &self,
        name: &str,
    ) -> Result<LogRetentionPolicyResponse, ProviderError> {
        self.get(&object_path(COLLECTION, name)).await
    }

    /// List log retention policies.
    pub async fn list_log_retention_policies(
        &self,
        filter: Option<&str>,
    ) -> Result<ListResponse<LogRetentionPolicyResponse>, ProviderError> {
        self.list(&collection_path(COLLECTION), filter).await
    }
}

/// Plan and state of a log retention policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogRetentionPolicyModel {
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
    /// How long log files are kept.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub retain_duration: ValueString,
    /// Number of log files kept.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub number_of_files: ValueInt64,
    /// Free disk space to keep available.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub free_disk_space: ValueString,
    /// Disk space the log files may use.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub disk_space_used: ValueString,
}

/// Copy a policy response into state.
pub fn read_log_retention_policy_response(
    response: &LogRetentionPolicyResponse,
    state: &mut LogRetentionPolicyModel,
    expected: Option<&LogRetentionPolicyModel>,
) {
    let empty_description = expected.is_some_and(|e| is_empty_string(&e.description));
    let common = response.common();

    state.r#type = Value::Known(response.type_name().to_string());
    state.id = Value::Known(common.id.clone());
    if state.name.is_unknown() {
        state.name = Value::Known(common.id.clone());
    }
    state.description = string_type_or_nil(common.description.as_deref(), empty_description);
    state.retain_duration = Value::Null;
    state.number_of_files = Value::Null;
    state.free_disk_space = Value::Null;
    state.disk_space_used = Value::Null;

    match response {
        LogRetentionPolicyResponse::TimeLimit(r) => {
            state.retain_duration = Value::Known(r.retain_duration.clone());
        },
        LogRetentionPolicyResponse::FileCount(r) => {
            state.number_of_files = int64_type_or_nil(Some(r.number_of_files));
        },
        LogRetentionPolicyResponse::FreeDiskSpace(r) => {
            state.free_disk_space = Value::Known(r.free_disk_space.clone());
        },
        LogRetentionPolicyResponse::SizeLimit(r) => {
            state.disk_space_used = Value::Known(r.disk_space_used.clone());
        },
        LogRetentionPolicyResponse::NeverDelete(_) => {},
    }

    let (notifications, required_actions) = read_messages(common.messages.as_ref());
    state.notifications = notifications;
    state.required_actions = required_actions;
}

/// Operations turning `state` into `plan`.
pub fn create_log_retention_policy_operations(
    plan: &LogRetentionPolicyModel,
    state: &LogRetentionPolicyModel,
) -> Vec<Operation> {
    let mut ops = Vec::new();
    add_string_operation_if_necessary(
        &mut ops,
        &plan.description,
        &state.description,
        "description",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.retain_duration,
        &state.retain_duration,
        "retainDuration",
    );
    add_int64_operation_if_necessary(
        &mut ops,
        &plan.number_of_files,
        &state.number_of_files,
        "numberOfFiles",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.free_disk_space,
        &state.free_disk_space,
        "freeDiskSpace",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.disk_space_used,
        &state.disk_space_used,
        "diskSpaceUsed",
    );
    ops
}

/// Build the Add request for the plan's `type`.
pub fn create_log_retention_policy_request(
    plan: &LogRetentionPolicyModel,
) -> Result<AddLogRetentionPolicyRequest, ProviderError> {
    let kind = required_value(&plan.r#type, "type")?;
    let mut request = AddLogRetentionPolicyRequest::new(&kind, required_value(&plan.name, "name")?);
    request.description = plan.description.as_ref().cloned();

    match kind.as_str() {
        "time-limit" => {
            request.retain_duration =
                Some(required_value(&plan.retain_duration, "retain_duration")?)
        },
        "file-count" => {
            request.number_of_files =
                Some(required_value(&plan.number_of_files, "number_of_files")?)
        },
        "free-disk-space" => {
            request.free_disk_space =
                Some(required_value(&plan.free_disk_space, "free_disk_space")?)
        },
        "size-limit" => {
            request.disk_space_used =
                Some(required_value(&plan.disk_space_used, "disk_space_used")?)
        },
        "never-delete" => {},
        other => {
            return Err(ProviderError::Validation(format!(
                "unsupported {} type '{}'",
                OBJECT_NAME, other
            )))
        },
    }
    Ok(request)
}

impl ConfigModel for LogRetentionPolicyModel {
    type Response = LogRetentionPolicyResponse;

    fn read_response(&mut self, response: &Self::Response, expected: Option<&Self>) {
        read_log_retention_policy_response(response, self, expected);
    }

    fn operations(plan: &Self, state: &Self) -> Vec<Operation> {
        create_log_retention_policy_operations(plan, state)
    }

    fn populate_unknown_values(&mut self) {
        self.id.null_if_unknown();
        self.name.null_if_unknown();
        self.last_updated.null_if_unknown();
        self.notifications.null_if_unknown();
        self.required_actions.null_if_unknown();
        self.r#type.null_if_unknown();
        self.description.null_if_unknown();
        self.retain_duration.null_if_unknown();
        self.number_of_files.null_if_unknown();
        self.free_disk_space.null_if_unknown();
        self.disk_space_used.null_if_unknown();
    }

    fn set_last_updated(&mut self, value: ValueString) {
        self.last_updated = value;
    }

    fn type_attr(&self) -> Option<&ValueString> {
        Some(&self.r#type)
    }
}

const RULES: TypeRules = TypeRules {
    allowed: &[
        ("retain_duration", &["time-limit"]),
        ("number_of_files", &["file-count"]),
        ("free_disk_space", &["free-disk-space"]),
        ("disk_space_used", &["size-limit"]),
    ],
    required: &[
        ("time-limit", &["retain_duration"]),
        ("file-count", &["number_of_files"]),
        ("free-disk-space", &["free_disk_space"]),
        ("size-limit", &["disk_space_used"]),
    ],
};

/// Schema for the created (`is_default = false`) or adopted resource.
pub fn log_retention_policy_schema(is_default: bool) -> Schema {
    let attr = |plain: Attribute, adopted: Attribute| if is_default { adopted } else { plain };
    let string = || attr(Attribute::optional_string(), Attribute::optional_computed_string());

    let schema = Schema::v0()
        .with_description(if is_default {
            "Manages a Log Retention Policy that already exists on the server."
        } else {
            "Manages a Log Retention Policy."
        })
        .with_attribute("name", name_attribute(OBJECT_NAME))
        .with_attribute(
            "type",
            type_attribute(LogRetentionPolicyResponse::TYPES, OBJECT_NAME, is_default),
        )
        .with_attribute(
            "description",
            string().with_description("A description for this Log Retention Policy"),
        )
        .with_attribute(
            "retain_duration",
            string().with_description(
                "When the `type` attribute is set to `time-limit`: the maximum length of time \
                 that rotated log files should be retained.",
            ),
        )
        .with_attribute(
            "number_of_files",
            attr(Attribute::optional_int64(), Attribute::optional_computed_int64())
                .with_validator(Validator::AtLeast(1))
                .with_description(
                    "When the `type` attribute is set to `file-count`: the number of rotated log \
                     files to retain.",
                ),
        )
        .with_attribute(
            "free_disk_space",
            string().with_description(
                "When the `type` attribute is set to `free-disk-space`: the minimum amount of \
                 free disk space to keep on the volume.",
            ),
        )
        .with_attribute(
            "disk_space_used",
            string().with_description(
                "When the `type` attribute is set to `size-limit`: the maximum total disk space \
                 used by rotated log files.",
            ),
        );
    with_common_attributes(schema, OBJECT_NAME)
}

/// `pingdirectory_log_retention_policy` and
/// `pingdirectory_default_log_retention_policy`.
pub struct LogRetentionPolicyResource {
    is_default: bool,
}

impl LogRetentionPolicyResource {
    /// The adopting (`true`) or creating (`false`) resource.
    pub fn new(is_default: bool) -> Self {
        Self { is_default }
    }
}

#[async_trait]
impl Resource for LogRetentionPolicyResource {
    fn type_name(&self) -> &'static str {
        if self.is_default {
            "pingdirectory_default_log_retention_policy"
        } else {
            "pingdirectory_log_retention_policy"
        }
    }

    fn schema(&self) -> Schema {
        log_retention_policy_schema(self.is_default)
    }

    fn validate_config(&self, config: &JsonValue) -> Vec<Diagnostic> {
        RULES.check(config, self.type_name(), !self.is_default)
    }

    async fn create(
        &self,
        client: &ConfigClient,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let plan: LogRetentionPolicyModel = from_state(plan)?;
        let name = required_value(&plan.name, "name")?;
        let state = if self.is_default {
            adopt_existing(client, &object_path(COLLECTION, &name), plan, OBJECT_NAME).await?
        } else {
            let body = create_log_retention_policy_request(&plan)
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
        let state: LogRetentionPolicyModel = from_state(state)?;
        let name = required_value(&state.name, "name")?;
        read_existing(client, &object_path(COLLECTION, &name), state, OBJECT_NAME).await
    }

    async fn update(
        &self,
        client: &ConfigClient,
        prior: JsonValue,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let prior: LogRetentionPolicyModel = from_state(prior)?;
        let plan: LogRetentionPolicyModel = from_state(plan)?;
        let name = required_value(&prior.name, "name")?;
        update_existing(client, &object_path(COLLECTION, &name), prior, plan, OBJECT_NAME).await
    }

    async fn delete(&self, client: &ConfigClient, state: JsonValue) -> Result<(), ProviderError> {
        let state: LogRetentionPolicyModel = from_state(state)?;
        let name = required_value(&state.name, "name")?;
        if self.is_default {
            debug!(name = %name, "default Log Retention Policy is left in place on delete");
            return Ok(());
        }
        delete_existing(client, &object_path(COLLECTION, &name), OBJECT_NAME).await
    }
}

/// `pingdirectory_log_retention_policy` data source.
pub struct LogRetentionPolicyDataSource;

#[async_trait]
impl DataSource for LogRetentionPolicyDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_log_retention_policy"
    }

    fn schema(&self) -> Schema {
        data_source_schema(&log_retention_policy_schema(false), Some("name"))
    }

    async fn read(
        &self,
        client: &ConfigClient,
        config: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let mut state: LogRetentionPolicyModel = from_state(config)?;
        let name = required_value(&state.name, "name")?;
        let response = client
            .get_log_retention_policy(&name)
            .await
            .map_err(|e| e.context(error_summary("getting", OBJECT_NAME)))?;
        read_log_retention_policy_response(&response, &mut state, None);
        state.populate_unknown_values();
        Ok(retain_schema_attributes(to_state(&state)?, &self.schema()))
    }
}

/// `pingdirectory_log_retention_policies` list data source.
pub struct LogRetentionPoliciesDataSource;

#[async_trait]
impl DataSource for LogRetentionPoliciesDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_log_retention_policies"
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
            .list_log_retention_policies(filter)
            .await
            .map_err(|e| e.context(error_summary("listing", OBJECT_NAME)))?;
        Ok(list_state(filter, list.resources.iter().map(|r| r.common().id.clone())))
    }
}
