//! Resources and data sources, one module per configuration object type.
//!
//! Every object type follows the same four steps: a schema declaration, a
//! read mapping from the wire response into the state model, an operation
//! diff from plan vs. state, and CRUD handlers. The handlers for the common
//! lifecycles (adopt an existing object, add a new one, read, update,
//! delete) live here and are driven through [`ConfigModel`].

pub mod group_implementation;
pub mod license;
pub mod log_field_mapping;
pub mod log_retention_policy;
pub mod server_instance;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::client::{ConfigClient, Messages};
use crate::error::ProviderError;
use crate::internaltypes;
use crate::operations::{log_update_operations, Operation};
use crate::schema::{Attribute, AttributeFlags, Diagnostic, Schema, Validator};
use crate::types::{ReadResult, Value, ValueString, ValueStringSet};

/// A managed resource type.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Terraform type name, e.g. `pingdirectory_log_retention_policy`.
    fn type_name(&self) -> &'static str;

    /// The resource schema.
    fn schema(&self) -> Schema;

    /// Checks beyond the schema, e.g. attributes that only apply to some
    /// values of `type`.
    fn validate_config(&self, config: &JsonValue) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Create (or adopt) the object described by the plan.
    async fn create(&self, client: &ConfigClient, plan: JsonValue)
        -> Result<JsonValue, ProviderError>;

    /// Refresh state from the server.
    async fn read(&self, client: &ConfigClient, state: JsonValue)
        -> Result<ReadResult, ProviderError>;

    /// Apply the difference between prior state and plan.
    async fn update(
        &self,
        client: &ConfigClient,
        prior: JsonValue,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError>;

    /// Delete the object, or just forget it for edit-only resources.
    async fn delete(&self, client: &ConfigClient, state: JsonValue) -> Result<(), ProviderError>;

    /// The attribute an import identifier is written to.
    fn import_attribute(&self) -> &'static str {
        "name"
    }

    /// State produced by `terraform import`; the identifier is not parsed.
    fn import_state(&self, id: &str) -> JsonValue {
        let mut state = serde_json::Map::new();
        state.insert(self.import_attribute().to_string(), JsonValue::from(id));
        JsonValue::Object(state)
    }
}

/// A read-only data source type.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Terraform type name.
    fn type_name(&self) -> &'static str;

    /// The data source schema.
    fn schema(&self) -> Schema;

    /// Read the object selected by the configuration.
    async fn read(&self, client: &ConfigClient, config: JsonValue)
        -> Result<JsonValue, ProviderError>;
}

/// A plan/state model backed by a configuration API object.
pub trait ConfigModel: Serialize + DeserializeOwned + Clone + Default + Send + Sync {
    /// The wire response for this object type.
    type Response: DeserializeOwned + Send;

    /// Copy the response into this model. `expected` is the plan or prior
    /// state used to decide between null and the empty string.
    fn read_response(&mut self, response: &Self::Response, expected: Option<&Self>);

    /// Operations that turn `state` into `plan`.
    fn operations(plan: &Self, state: &Self) -> Vec<Operation>;

    /// Replace every remaining unknown value with null.
    fn populate_unknown_values(&mut self);

    /// Set the `last_updated` bookkeeping attribute.
    fn set_last_updated(&mut self, value: ValueString);

    /// The `type` discriminator, for object types that have sub-kinds.
    fn type_attr(&self) -> Option<&ValueString> {
        None
    }
}

/// Summary used when a request for `object_name` fails.
pub fn error_summary(verb: &str, object_name: &str) -> String {
    format!("An error occurred while {} the {}", verb, object_name)
}

/// Decode a state document into a model.
pub fn from_state<M: DeserializeOwned>(value: JsonValue) -> Result<M, ProviderError> {
    Ok(serde_json::from_value(value)?)
}

/// Encode a model into a state document.
pub fn to_state<M: Serialize>(model: &M) -> Result<JsonValue, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

/// Notifications and required actions from the messages extension.
pub fn read_messages(messages: Option<&Messages>) -> (ValueStringSet, ValueStringSet) {
    let messages = messages.cloned().unwrap_or_default();
    let notifications = Value::Known(messages.notifications.into_iter().collect());
    let required_actions = Value::Known(
        messages
            .required_actions
            .iter()
            .map(ToString::to_string)
            .collect(),
    );
    (notifications, required_actions)
}

/// Keep only the attributes the schema declares.
pub fn retain_schema_attributes(value: JsonValue, schema: &Schema) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .filter(|(k, _)| schema.attributes.contains_key(k))
                .collect(),
        ),
        other => other,
    }
}

/// Copy attributes that are unknown (absent) in `plan` from `prior`.
pub fn fill_unknown_from(plan: JsonValue, prior: &JsonValue) -> JsonValue {
    match (plan, prior) {
        (JsonValue::Object(mut plan), JsonValue::Object(prior)) => {
            for (key, value) in prior {
                plan.entry(key.clone()).or_insert_with(|| value.clone());
            }
            JsonValue::Object(plan)
        },
        (plan, _) => plan,
    }
}

/// Derive a data source schema from a resource schema: every attribute
/// becomes computed except the lookup key, and `last_updated` is dropped.
pub fn data_source_schema(resource: &Schema, key: Option<&str>) -> Schema {
    let mut schema = Schema::v0();
    schema.description = resource.description.clone();
    for (name, attr) in &resource.attributes {
        if name == "last_updated" {
            continue;
        }
        let flags = if Some(name.as_str()) == key {
            AttributeFlags::required()
        } else {
            AttributeFlags::computed()
        };
        let mut derived = Attribute::new(attr.attr_type.clone(), flags);
        derived.description = attr.description.clone();
        derived.flags.sensitive = attr.flags.sensitive;
        schema.attributes.insert(name.clone(), derived);
    }
    schema
}

/// Schema of a list data source: an optional SCIM filter and the matching ids.
pub fn list_data_source_schema(object_name: &str) -> Schema {
    Schema::v0()
        .with_description(format!("Lists {} objects.", object_name))
        .with_attribute(
            "filter",
            Attribute::optional_string()
                .with_description("SCIM filter used when searching the configuration."),
        )
        .with_attribute(
            "ids",
            Attribute::computed_string_set()
                .with_description(format!("{} objects found in the configuration", object_name)),
        )
        .with_attribute("id", Attribute::computed_string())
}

/// Attributes that only apply to some values of `type`.
pub struct TypeRules {
    /// Attribute name and the types it applies to.
    pub allowed: &'static [(&'static str, &'static [&'static str])],
    /// Type and the attributes it needs when creating a new object.
    pub required: &'static [(&'static str, &'static [&'static str])],
}

impl TypeRules {
    /// Check a configuration against the rules. Requirements are only
    /// enforced when `enforce_required` is set (objects created by Terraform).
    pub fn check(
        &self,
        config: &JsonValue,
        resource_type: &str,
        enforce_required: bool,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let Some(kind) = config.get("type").and_then(JsonValue::as_str) else {
            return diagnostics;
        };
        let is_set = |attr: &str| config.get(attr).is_some_and(|v| !v.is_null());

        for (attr, types) in self.allowed {
            if is_set(attr) && !types.contains(&kind) {
                diagnostics.push(
                    Diagnostic::error("Invalid attribute combination")
                        .with_detail(format!(
                            "Attribute '{}' not supported by {} resources with 'type' '{}'",
                            attr, resource_type, kind
                        ))
                        .with_attribute(*attr),
                );
            }
        }
        if enforce_required {
            for (required_kind, attrs) in self.required {
                if *required_kind != kind {
                    continue;
                }
                for attr in attrs.iter().filter(|a| !is_set(a)) {
                    diagnostics.push(
                        Diagnostic::error("Missing required attribute")
                            .with_detail(format!(
                                "Attribute '{}' is required when 'type' is '{}'",
                                attr, kind
                            ))
                            .with_attribute(*attr),
                    );
                }
            }
        }
        diagnostics
    }
}

/// The common `id`, `notifications`, `required_actions` and `last_updated`
/// attributes.
pub fn with_common_attributes(schema: Schema, object_name: &str) -> Schema {
    schema
        .with_attribute(
            "id",
            Attribute::computed_string()
                .use_state_for_unknown()
                .with_description(format!("The ID of this {}.", object_name)),
        )
        .with_attribute(
            "last_updated",
            Attribute::computed_string()
                .with_description("Timestamp of the last Terraform update of this resource."),
        )
        .with_attribute(
            "notifications",
            Attribute::computed_string_set()
                .with_description("Notifications returned by the configuration API."),
        )
        .with_attribute(
            "required_actions",
            Attribute::computed_string_set()
                .with_description("Required actions returned by the configuration API."),
        )
}

/// The `type` attribute: required and replacing for objects Terraform
/// creates, optional and taken from the server for adopted ones.
pub fn type_attribute(types: &[&str], object_name: &str, is_default: bool) -> Attribute {
    let attr = if is_default {
        Attribute::optional_computed_string().use_state_for_unknown()
    } else {
        Attribute::required_string().requires_replace()
    };
    attr.with_validator(Validator::one_of(types))
        .with_description(format!("The type of {} resource.", object_name))
}

/// The `name` key attribute.
pub fn name_attribute(object_name: &str) -> Attribute {
    Attribute::required_string()
        .requires_replace()
        .with_description(format!("Name of this {}.", object_name))
}

/// An existing object's `type` cannot be changed in place.
fn check_type_matches<M: ConfigModel>(
    plan: &M,
    existing: &M,
    object_name: &str,
) -> Result<(), ProviderError> {
    if let (Some(Value::Known(planned)), Some(Value::Known(existing))) =
        (plan.type_attr(), existing.type_attr())
    {
        if planned != existing {
            return Err(ProviderError::Validation(format!(
                "{} type mismatch: plan has '{}', server has '{}'",
                object_name, planned, existing
            )));
        }
    }
    Ok(())
}

/// Adopt an existing object: read it, diff against the plan, PATCH if needed.
pub async fn adopt_existing<M: ConfigModel>(
    client: &ConfigClient,
    path: &str,
    plan: M,
    object_name: &str,
) -> Result<M, ProviderError> {
    let response: M::Response = client
        .get(path)
        .await
        .map_err(|e| e.context(error_summary("getting", object_name)))?;

    let mut state = plan.clone();
    state.read_response(&response, Some(&plan));

    check_type_matches(&plan, &state, object_name)?;

    let ops = M::operations(&plan, &state);
    if !ops.is_empty() {
        log_update_operations(&ops);
        let response: M::Response = client
            .update(path, ops)
            .await
            .map_err(|e| e.context(error_summary("updating", object_name)))?;
        state.read_response(&response, Some(&plan));
        state.set_last_updated(internaltypes::last_updated_now());
    }
    state.populate_unknown_values();
    info!(object = object_name, path, "adopted existing configuration object");
    Ok(state)
}

/// Add a new object and map the response into state.
pub async fn add_new<M, B>(
    client: &ConfigClient,
    collection: &str,
    body: &B,
    plan: M,
    object_name: &str,
) -> Result<M, ProviderError>
where
    M: ConfigModel,
    B: Serialize + Sync,
{
    let response: M::Response = client
        .add(collection, body)
        .await
        .map_err(|e| e.context(error_summary("creating", object_name)))?;

    let mut state = plan.clone();
    state.read_response(&response, Some(&plan));
    state.set_last_updated(internaltypes::last_updated_now());
    state.populate_unknown_values();
    info!(object = object_name, collection, "created configuration object");
    Ok(state)
}

/// Read an object. A 404 drops the resource from state with a warning.
pub async fn read_existing<M: ConfigModel>(
    client: &ConfigClient,
    path: &str,
    state: M,
    object_name: &str,
) -> Result<ReadResult, ProviderError> {
    let response: M::Response = match client.get(path).await {
        Ok(response) => response,
        Err(e) if e.is_not_found() => {
            warn!(object = object_name, path, "object not found, removing from state");
            return Ok(ReadResult::removed(
                Diagnostic::warning(format!("The {} could not be found", object_name))
                    .with_detail(format!(
                        "{} was not found on the server and will be removed from state",
                        path
                    )),
            ));
        },
        Err(e) => return Err(e.context(error_summary("getting", object_name))),
    };

    let expected = state.clone();
    let mut state = state;
    state.read_response(&response, Some(&expected));
    state.populate_unknown_values();
    Ok(ReadResult::found(to_state(&state)?))
}

/// PATCH the difference between prior state and plan.
pub async fn update_existing<M: ConfigModel>(
    client: &ConfigClient,
    path: &str,
    prior: M,
    plan: M,
    object_name: &str,
) -> Result<JsonValue, ProviderError> {
    check_type_matches(&plan, &prior, object_name)?;

    let ops = M::operations(&plan, &prior);
    if ops.is_empty() {
        warn!(
            object = object_name,
            path, "no configuration API operations created for update"
        );
        return Ok(fill_unknown_from(to_state(&plan)?, &to_state(&prior)?));
    }

    log_update_operations(&ops);
    let response: M::Response = client
        .update(path, ops)
        .await
        .map_err(|e| e.context(error_summary("updating", object_name)))?;

    let mut state = plan.clone();
    state.read_response(&response, Some(&plan));
    state.set_last_updated(internaltypes::last_updated_now());
    state.populate_unknown_values();
    info!(object = object_name, path, "updated configuration object");
    to_state(&state)
}

/// DELETE an object; a 404 means it is already gone.
pub async fn delete_existing(
    client: &ConfigClient,
    path: &str,
    object_name: &str,
) -> Result<(), ProviderError> {
    match client.delete(path).await {
        Ok(()) => {
            info!(object = object_name, path, "deleted configuration object");
            Ok(())
        },
        Err(e) if e.is_not_found() => {
            warn!(object = object_name, path, "object already deleted");
            Ok(())
        },
        Err(e) => Err(e.context(error_summary("deleting", object_name))),
    }
}

/// State of a list data source.
pub fn list_state(filter: Option<&str>, ids: impl IntoIterator<Item = String>) -> JsonValue {
    let ids: BTreeSet<String> = ids.into_iter().collect();
    serde_json::json!({
        "filter": filter,
        "ids": ids,
        "id": "id",
    })
}

/// The `filter` of a list data source configuration.
pub fn list_filter(config: &JsonValue) -> Option<&str> {
    config.get("filter").and_then(JsonValue::as_str)
}

/// The known value of an attribute Terraform must have set.
pub fn required_value<T: Clone>(value: &Value<T>, attr: &str) -> Result<T, ProviderError> {
    value
        .as_ref()
        .cloned()
        .ok_or_else(|| ProviderError::Validation(format!("attribute '{}' must be set", attr)))
}

/// Resources exposed by the provider.
pub fn all_resources() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(group_implementation::DefaultGroupImplementationResource),
        Box::new(license::LicenseResource),
        Box::new(log_field_mapping::LogFieldMappingResource::new(false)),
        Box::new(log_field_mapping::LogFieldMappingResource::new(true)),
        Box::new(log_retention_policy::LogRetentionPolicyResource::new(false)),
        Box::new(log_retention_policy::LogRetentionPolicyResource::new(true)),
        Box::new(server_instance::DefaultServerInstanceResource),
    ]
}

/// Data sources exposed by the provider.
pub fn all_data_sources() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(group_implementation::GroupImplementationDataSource),
        Box::new(group_implementation::GroupImplementationsDataSource),
        Box::new(license::LicenseDataSource),
        Box::new(log_field_mapping::LogFieldMappingDataSource),
        Box::new(log_field_mapping::LogFieldMappingsDataSource),
        Box::new(log_retention_policy::LogRetentionPolicyDataSource),
        Box::new(log_retention_policy::LogRetentionPoliciesDataSource),
        Box::new(server_instance::ServerInstanceDataSource),
        Box::new(server_instance::ServerInstancesDataSource),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RequiredAction;
    use crate::schema::AttributeType;
    use serde_json::json;

    const RULES: TypeRules = TypeRules {
        allowed: &[("number_of_files", &["file-count"])],
        required: &[("file-count", &["number_of_files"])],
    };

    #[test]
    fn test_type_rules_reject_foreign_attribute() {
        let diagnostics = RULES.check(
            &json!({"type": "time-limit", "number_of_files": 3}),
            "pingdirectory_log_retention_policy",
            true,
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("'type' 'time-limit'"));
    }

    #[test]
    fn test_type_rules_required() {
        let config = json!({"type": "file-count"});
        assert_eq!(RULES.check(&config, "r", true).len(), 1);
        assert!(RULES.check(&config, "r", false).is_empty());
    }

    #[test]
    fn test_read_messages() {
        let messages = Messages {
            notifications: vec!["restart needed".to_string()],
            required_actions: vec![RequiredAction {
                property: None,
                kind: "componentRestart".to_string(),
                synopsis: "Restart the server".to_string(),
            }],
        };
        let (notifications, required_actions) = read_messages(Some(&messages));
        assert_eq!(
            internaltypes::set_to_strings(&notifications),
            vec!["restart needed"]
        );
        assert_eq!(
            internaltypes::set_to_strings(&required_actions),
            vec!["componentRestart: Restart the server"]
        );
        let (notifications, _) = read_messages(None);
        assert_eq!(notifications, Value::Known(Default::default()));
    }

    #[test]
    fn test_fill_unknown_from() {
        let plan = json!({"name": "p", "description": null});
        let prior = json!({"name": "p", "description": "old", "id": "p", "last_updated": "t"});
        let merged = fill_unknown_from(plan, &prior);
        assert_eq!(
            merged,
            json!({"name": "p", "description": null, "id": "p", "last_updated": "t"})
        );
    }

    #[test]
    fn test_data_source_schema() {
        let resource = with_common_attributes(
            Schema::v0().with_attribute("name", name_attribute("Log Retention Policy")),
            "Log Retention Policy",
        );
        let ds = data_source_schema(&resource, Some("name"));
        assert!(ds.attribute("last_updated").is_none());
        assert!(ds.attributes["name"].flags.required);
        assert!(ds.attributes["id"].flags.computed);
        assert!(ds.attributes["id"].plan_modifiers.is_empty());
        assert_eq!(
            ds.attributes["notifications"].attr_type,
            AttributeType::set(AttributeType::String)
        );
    }

    #[test]
    fn test_list_state_and_required_value() {
        let state = list_state(Some("id eq \"a\""), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(state["ids"], json!(["a", "b"]));
        assert_eq!(list_filter(&state), Some("id eq \"a\""));
        assert_eq!(list_state(None, Vec::new())["filter"], JsonValue::Null);

        assert_eq!(required_value(&ValueString::from("x"), "name").unwrap(), "x");
        let err = required_value(&ValueString::Unknown, "name").unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_retain_schema_attributes() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());
        let value = retain_schema_attributes(json!({"id": "a", "last_updated": null}), &schema);
        assert_eq!(value, json!({"id": "a"}));
    }

    #[test]
    fn test_import_state_passthrough() {
        struct Dummy;
        #[async_trait]
        impl Resource for Dummy {
            fn type_name(&self) -> &'static str {
                "dummy"
            }
            fn schema(&self) -> Schema {
                Schema::v0()
            }
            async fn create(
                &self,
                _: &ConfigClient,
                plan: JsonValue,
            ) -> Result<JsonValue, ProviderError> {
                Ok(plan)
            }
            async fn read(
                &self,
                _: &ConfigClient,
                state: JsonValue,
            ) -> Result<ReadResult, ProviderError> {
                Ok(ReadResult::found(state))
            }
            async fn update(
                &self,
                _: &ConfigClient,
                _: JsonValue,
                plan: JsonValue,
            ) -> Result<JsonValue, ProviderError> {
                Ok(plan)
            }
            async fn delete(&self, _: &ConfigClient, _: JsonValue) -> Result<(), ProviderError> {
                Ok(())
            }
        }
        assert_eq!(Dummy.import_state("Error Log"), json!({"name": "Error Log"}));
    }

    #[test]
    fn test_registered_type_names_unique() {
        let mut names: Vec<_> = all_resources().iter().map(|r| r.type_name()).collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);

        let mut names: Vec<_> = all_data_sources().iter().map(|d| d.type_name()).collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
    }
}
