//! Plan/state diffing into configuration API PATCH operations.
//!
//! Each `add_*_operation_if_necessary` helper compares one planned attribute
//! with its prior state and appends at most one [`Operation`]:
//!
//! - an unknown plan value keeps whatever is in state (no operation);
//! - equal values produce no operation;
//! - a null plan, an empty string or an empty set removes the attribute;
//! - anything else replaces it.
//!
//! The configuration API takes every scalar as a string and every
//! multi-valued attribute as a list of strings.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Value, ValueBool, ValueInt64, ValueString};

/// The kind of change an operation applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Add values to a multi-valued attribute.
    Add,
    /// Remove the attribute (or the given values).
    Remove,
    /// Replace the attribute's value.
    Replace,
}

/// A single attribute-level PATCH instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// The change kind.
    pub op: OperationKind,
    /// The wire attribute name, e.g. `numberOfFiles`.
    pub path: String,
    /// The new value; absent for removals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl Operation {
    /// A `replace` operation.
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: OperationKind::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    /// A `remove` operation.
    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: OperationKind::Remove,
            path: path.into(),
            value: None,
        }
    }
}

/// The PATCH request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Operations applied atomically by the server.
    pub operations: Vec<Operation>,
}

impl UpdateRequest {
    /// Wrap a list of operations.
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

/// Diff a string attribute.
pub fn add_string_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &ValueString,
    state: &ValueString,
    path: &str,
) {
    if plan.is_unknown() || plan == state {
        return;
    }
    match plan.as_str() {
        Some(v) if !v.is_empty() => ops.push(Operation::replace(path, v.into())),
        _ => ops.push(Operation::remove(path)),
    }
}

/// Diff a bool attribute.
pub fn add_bool_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &ValueBool,
    state: &ValueBool,
    path: &str,
) {
    add_scalar_operation_if_necessary(ops, plan, state, path);
}

/// Diff an int64 attribute.
pub fn add_int64_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &ValueInt64,
    state: &ValueInt64,
    path: &str,
) {
    add_scalar_operation_if_necessary(ops, plan, state, path);
}

fn add_scalar_operation_if_necessary<T: Display + PartialEq>(
    ops: &mut Vec<Operation>,
    plan: &Value<T>,
    state: &Value<T>,
    path: &str,
) {
    if plan.is_unknown() || plan == state {
        return;
    }
    match plan.as_ref() {
        Some(v) => ops.push(Operation::replace(path, v.to_string().into())),
        None => ops.push(Operation::remove(path)),
    }
}

/// Diff a set attribute (of strings or integers).
pub fn add_set_operation_if_necessary<T: Display + Ord>(
    ops: &mut Vec<Operation>,
    plan: &Value<BTreeSet<T>>,
    state: &Value<BTreeSet<T>>,
    path: &str,
) {
    if plan.is_unknown() || plan == state {
        return;
    }
    match plan.as_ref() {
        Some(values) if !values.is_empty() => {
            let values: Vec<serde_json::Value> =
                values.iter().map(|v| v.to_string().into()).collect();
            ops.push(Operation::replace(path, serde_json::Value::Array(values)));
        },
        _ => ops.push(Operation::remove(path)),
    }
}

/// Log the operations about to be sent.
pub fn log_update_operations(ops: &[Operation]) {
    for op in ops {
        match &op.value {
            Some(value) => debug!(op = ?op.op, path = %op.path, value = %value, "update operation"),
            None => debug!(op = ?op.op, path = %op.path, "update operation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_replace_from_null() {
        let mut ops = Vec::new();
        add_string_operation_if_necessary(
            &mut ops,
            &ValueString::from("foo"),
            &ValueString::Null,
            "description",
        );
        assert_eq!(ops, vec![Operation::replace("description", json!("foo"))]);
    }

    #[test]
    fn test_string_unknown_and_equal_skip() {
        let mut ops = Vec::new();
        add_string_operation_if_necessary(
            &mut ops,
            &ValueString::Unknown,
            &ValueString::from("x"),
            "description",
        );
        add_string_operation_if_necessary(
            &mut ops,
            &ValueString::from("x"),
            &ValueString::from("x"),
            "description",
        );
        assert!(ops.is_empty());
    }

    #[test]
    fn test_string_empty_removes() {
        let mut ops = Vec::new();
        add_string_operation_if_necessary(
            &mut ops,
            &ValueString::from(""),
            &ValueString::from("x"),
            "description",
        );
        add_string_operation_if_necessary(
            &mut ops,
            &ValueString::Null,
            &ValueString::from("x"),
            "retainDuration",
        );
        assert_eq!(
            ops,
            vec![
                Operation::remove("description"),
                Operation::remove("retainDuration")
            ]
        );
    }

    #[test]
    fn test_scalars_encoded_as_strings() {
        let mut ops = Vec::new();
        add_int64_operation_if_necessary(
            &mut ops,
            &Value::Known(5),
            &Value::Known(4),
            "numberOfFiles",
        );
        add_bool_operation_if_necessary(
            &mut ops,
            &Value::Known(false),
            &Value::Known(true),
            "enabled",
        );
        assert_eq!(
            ops,
            vec![
                Operation::replace("numberOfFiles", json!("5")),
                Operation::replace("enabled", json!("false")),
            ]
        );
    }

    #[test]
    fn test_set_operations() {
        let mut ops = Vec::new();
        let plan: Value<BTreeSet<i64>> = Value::Known([2, 1].into_iter().collect());
        let state: Value<BTreeSet<i64>> = Value::Known([1, 2].into_iter().collect());
        add_set_operation_if_necessary(&mut ops, &plan, &state, "replicationDomainServerID");
        assert!(ops.is_empty());

        let plan: Value<BTreeSet<String>> = Value::Known(["dc=example,dc=com".to_string()].into());
        add_set_operation_if_necessary(&mut ops, &plan, &Value::Null, "baseDN");
        add_set_operation_if_necessary(
            &mut ops,
            &Value::Known(BTreeSet::<String>::new()),
            &plan,
            "memberOfServerGroup",
        );
        assert_eq!(
            ops,
            vec![
                Operation::replace("baseDN", json!(["dc=example,dc=com"])),
                Operation::remove("memberOfServerGroup"),
            ]
        );
    }

    #[test]
    fn test_update_request_body() {
        let body = UpdateRequest::new(vec![
            Operation::replace("description", json!("foo")),
            Operation::remove("retainDuration"),
        ]);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"operations": [
                {"op": "replace", "path": "description", "value": "foo"},
                {"op": "remove", "path": "retainDuration"}
            ]})
        );
    }
}
