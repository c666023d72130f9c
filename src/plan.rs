//! Plan computation for resources.
//!
//! Given the resource schema, the prior state (absent on create) and the
//! configuration, [`plan_resource`] produces the planned state and the list
//! of attribute changes:
//!
//! - configured attributes take the configured value;
//! - unconfigured, non-computed attributes are null;
//! - unconfigured computed attributes keep the prior value when they carry
//!   [`PlanModifier::UseStateForUnknown`] or when nothing else changes, and
//!   become unknown (absent) otherwise;
//! - a change to an attribute carrying [`PlanModifier::RequiresReplace`]
//!   plans a replacement, which is planned like a create;
//! - a null configuration plans the destroy: the planned state is null.

use serde_json::{Map, Value};

use crate::schema::{PlanModifier, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Compute the plan for a resource.
pub fn plan_resource(schema: &Schema, prior_state: Option<&Value>, config: &Value) -> PlanResult {
    let prior = prior_state.filter(|p| !p.is_null());
    let Some(prior) = prior else {
        return plan_create(schema, config, None);
    };
    if config.is_null() {
        return plan_destroy(prior);
    }

    let requires_replace = schema.attributes.iter().any(|(name, attr)| {
        attr.has_plan_modifier(PlanModifier::RequiresReplace)
            && configured(config, name).is_some_and(|v| Some(v) != prior.get(name))
    });
    if requires_replace {
        return plan_create(schema, config, Some(prior));
    }

    let mut planned = Map::new();
    let mut pending = Vec::new();
    for (name, attr) in &schema.attributes {
        if let Some(value) = configured(config, name) {
            planned.insert(name.clone(), value.clone());
        } else if !attr.flags.computed {
            planned.insert(name.clone(), Value::Null);
        } else if attr.has_plan_modifier(PlanModifier::UseStateForUnknown) {
            if let Some(value) = prior.get(name) {
                planned.insert(name.clone(), value.clone());
            }
        } else {
            pending.push(name);
        }
    }

    let changed = planned
        .iter()
        .any(|(name, value)| prior.get(name).unwrap_or(&Value::Null) != value);
    if !changed {
        return PlanResult::no_change(prior.clone());
    }

    let mut changes: Vec<AttributeChange> = planned
        .iter()
        .filter(|(name, value)| prior.get(name.as_str()).unwrap_or(&Value::Null) != *value)
        .map(|(name, value)| {
            AttributeChange::modified(
                name.as_str(),
                prior.get(name.as_str()).cloned().unwrap_or(Value::Null),
                value.clone(),
            )
        })
        .collect();
    for name in pending {
        changes.push(AttributeChange::new(name.as_str(), prior.get(name.as_str()).cloned(), None));
    }
    changes.sort_by(|a, b| a.path.cmp(&b.path));

    PlanResult::with_changes(Value::Object(planned), changes, false)
}

fn plan_create(schema: &Schema, config: &Value, replaced: Option<&Value>) -> PlanResult {
    let mut planned = Map::new();
    let mut changes = Vec::new();
    for (name, attr) in &schema.attributes {
        let before = replaced.and_then(|p| p.get(name)).cloned();
        if let Some(value) = configured(config, name) {
            planned.insert(name.clone(), value.clone());
            changes.push(AttributeChange::new(name.as_str(), before, Some(value.clone())));
        } else if attr.flags.computed {
            changes.push(AttributeChange::new(name.as_str(), before, None));
        } else {
            planned.insert(name.clone(), Value::Null);
        }
    }
    PlanResult::with_changes(Value::Object(planned), changes, replaced.is_some())
}

fn plan_destroy(prior: &Value) -> PlanResult {
    let changes = prior
        .as_object()
        .into_iter()
        .flatten()
        .map(|(name, value)| AttributeChange::modified(name.as_str(), value.clone(), Value::Null))
        .collect();
    PlanResult::with_changes(Value::Null, changes, false)
}

/// The configured, non-null value of an attribute.
fn configured<'a>(config: &'a Value, name: &str) -> Option<&'a Value> {
    config.get(name).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string().use_state_for_unknown())
            .with_attribute("name", Attribute::required_string().requires_replace())
            .with_attribute("last_updated", Attribute::computed_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("enabled", Attribute::optional_computed_bool())
    }

    fn prior() -> Value {
        json!({
            "id": "Static",
            "name": "Static",
            "last_updated": "Monday, 19-Oct-26 09:05:03 UTC",
            "description": null,
            "enabled": true
        })
    }

    #[test]
    fn test_create_marks_computed_unknown() {
        let result = plan_resource(&schema(), None, &json!({"name": "Static", "description": "d"}));
        assert_eq!(
            result.planned_state,
            json!({"name": "Static", "description": "d"})
        );
        assert!(!result.requires_replace);
        let unknown: Vec<_> = result
            .changes
            .iter()
            .filter(|c| c.after.is_none())
            .map(|c| c.path.as_str())
            .collect();
        assert_eq!(unknown, vec!["enabled", "id", "last_updated"]);
    }

    #[test]
    fn test_no_change_keeps_prior_state() {
        let result = plan_resource(&schema(), Some(&prior()), &json!({"name": "Static"}));
        assert!(result.changes.is_empty());
        assert_eq!(result.planned_state, prior());
    }

    #[test]
    fn test_update_keeps_id_and_unknowns_the_rest() {
        let result = plan_resource(
            &schema(),
            Some(&prior()),
            &json!({"name": "Static", "description": "foo"}),
        );
        assert!(!result.requires_replace);
        assert_eq!(
            result.planned_state,
            json!({"id": "Static", "name": "Static", "description": "foo"})
        );
        let paths: Vec<_> = result.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["description", "enabled", "last_updated"]);
        assert_eq!(result.changes[0].after, Some(json!("foo")));
    }

    #[test]
    fn test_configured_computed_value_is_used() {
        let result = plan_resource(
            &schema(),
            Some(&prior()),
            &json!({"name": "Static", "enabled": false}),
        );
        assert_eq!(result.planned_state["enabled"], json!(false));
        assert!(result.planned_state.get("last_updated").is_none());
    }

    #[test]
    fn test_rename_requires_replace() {
        let result = plan_resource(&schema(), Some(&prior()), &json!({"name": "Dynamic"}));
        assert!(result.requires_replace);
        assert!(result.planned_state.get("id").is_none());
        let name = result.changes.iter().find(|c| c.path == "name").unwrap();
        assert_eq!(name.before, Some(json!("Static")));
        assert_eq!(name.after, Some(json!("Dynamic")));
    }

    #[test]
    fn test_null_config_plans_destroy() {
        let result = plan_resource(&schema(), Some(&prior()), &Value::Null);
        assert!(result.planned_state.is_null());
        assert!(!result.requires_replace);
        assert_eq!(result.changes.len(), 5);
        assert!(result.changes.iter().all(|c| c.after == Some(Value::Null)));
    }
}
