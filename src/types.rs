//! Convenience types for provider implementations.
//!
//! [`Value`] is the tri-state attribute value (known, null, unknown) used by
//! every plan/state model. The remaining types describe the results handed
//! back through [`ProviderService`](crate::service::ProviderService).

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single attribute value as Terraform sees it.
///
/// In JSON documents a present value is [`Value::Known`], an explicit `null`
/// is [`Value::Null`] and a missing key is [`Value::Unknown`]. Model structs
/// therefore mark every field with
/// `#[serde(default, skip_serializing_if = "Value::is_unknown")]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value<T> {
    /// A concrete value.
    Known(T),
    /// Explicitly unset.
    Null,
    /// Not known until apply.
    #[default]
    Unknown,
}

/// A string attribute.
pub type ValueString = Value<String>;
/// A boolean attribute.
pub type ValueBool = Value<bool>;
/// A 64-bit integer attribute.
pub type ValueInt64 = Value<i64>;
/// A set of strings. Ordering is irrelevant to equality.
pub type ValueStringSet = Value<BTreeSet<String>>;
/// A set of 64-bit integers.
pub type ValueInt64Set = Value<BTreeSet<i64>>;

impl<T> Value<T> {
    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Whether the value is known (neither null nor unknown).
    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known(_))
    }

    /// Borrow the known value, if any.
    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Replace an unknown value with null. Known and null values are kept.
    pub fn or_null(self) -> Self {
        match self {
            Value::Unknown => Value::Null,
            other => other,
        }
    }

    /// In-place form of [`Value::or_null`].
    pub fn null_if_unknown(&mut self) {
        if self.is_unknown() {
            *self = Value::Null;
        }
    }
}

impl ValueString {
    /// Borrow the string, if known.
    pub fn as_str(&self) -> Option<&str> {
        self.as_ref().map(String::as_str)
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Known(v),
            None => Value::Null,
        }
    }
}

impl From<&str> for ValueString {
    fn from(value: &str) -> Self {
        Value::Known(value.to_string())
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Known(v) => v.serialize(serializer),
            Value::Null | Value::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The attribute that changed.
    pub path: String,
    /// The value before the change (None if the attribute was absent).
    pub before: Option<serde_json::Value>,
    /// The value after the change (None if unknown until apply).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation. Unknown attributes are absent.
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: serde_json::Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// The result of reading a resource.
///
/// `state` is `None` when the remote object is gone and the resource should
/// be dropped from state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    /// The refreshed state, if the object still exists.
    pub state: Option<serde_json::Value>,
    /// Warnings raised while reading.
    pub diagnostics: Vec<crate::schema::Diagnostic>,
}

impl ReadResult {
    /// A successful read.
    pub fn found(state: serde_json::Value) -> Self {
        Self {
            state: Some(state),
            diagnostics: Vec::new(),
        }
    }

    /// The object no longer exists; remove it from state with a warning.
    pub fn removed(warning: crate::schema::Diagnostic) -> Self {
        Self {
            state: None,
            diagnostics: vec![warning],
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata: the registered type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}
