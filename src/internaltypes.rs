//! Conversions between wire values and Terraform attribute values.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::types::{Value, ValueBool, ValueInt64, ValueInt64Set, ValueString, ValueStringSet};

/// Convert an optional wire string into a string attribute.
///
/// An absent wire value becomes `""` when `use_empty_string_for_nil` is set,
/// and null otherwise.
pub fn string_type_or_nil(value: Option<&str>, use_empty_string_for_nil: bool) -> ValueString {
    match value {
        Some(v) => Value::Known(v.to_string()),
        None if use_empty_string_for_nil => Value::Known(String::new()),
        None => Value::Null,
    }
}

/// Convert an optional wire bool into a bool attribute.
pub fn bool_type_or_nil(value: Option<bool>) -> ValueBool {
    value.into()
}

/// Convert an optional wire integer into an int64 attribute.
pub fn int64_type_or_nil(value: Option<i64>) -> ValueInt64 {
    value.into()
}

/// Convert a wire list into a known set. An absent list is the empty set.
pub fn string_set(values: Option<&[String]>) -> ValueStringSet {
    Value::Known(values.unwrap_or_default().iter().cloned().collect())
}

/// Convert a wire list of integers into a known set.
pub fn int64_set(values: Option<&[i64]>) -> ValueInt64Set {
    Value::Known(values.unwrap_or_default().iter().copied().collect())
}

/// Whether the value is the known empty string.
pub fn is_empty_string(value: &ValueString) -> bool {
    value.as_str() == Some("")
}

/// Known set contents as a sorted list of strings.
pub fn set_to_strings<T: ToString>(value: &Value<BTreeSet<T>>) -> Vec<String> {
    value
        .as_ref()
        .map(|set| set.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Format a timestamp the way Terraform's `last_updated` attributes are
/// rendered (RFC 850).
pub fn rfc850(time: DateTime<Utc>) -> String {
    time.format("%A, %d-%b-%y %H:%M:%S UTC").to_string()
}

/// The current time as a `last_updated` value.
pub fn last_updated_now() -> ValueString {
    Value::Known(rfc850(Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_type_or_nil() {
        assert_eq!(string_type_or_nil(Some("x"), false), ValueString::from("x"));
        assert_eq!(string_type_or_nil(None, true), ValueString::from(""));
        assert!(string_type_or_nil(None, false).is_null());
    }

    #[test]
    fn test_int64_type_or_nil() {
        assert_eq!(int64_type_or_nil(Some(5)), Value::Known(5));
        assert!(int64_type_or_nil(None).is_null());
    }

    #[test]
    fn test_sets() {
        let names = vec!["b".to_string(), "a".to_string()];
        let set = string_set(Some(&names));
        assert_eq!(set_to_strings(&set), vec!["a", "b"]);
        assert_eq!(string_set(None), Value::Known(BTreeSet::new()));
        assert_eq!(set_to_strings(&int64_set(Some(&[3, 1]))), vec!["1", "3"]);
    }

    #[test]
    fn test_string_predicates() {
        assert!(is_empty_string(&ValueString::from("")));
        assert!(!is_empty_string(&ValueString::Null));
        assert!(!is_empty_string(&ValueString::Unknown));
        assert!(!is_empty_string(&ValueString::from("a")));
    }

    #[test]
    fn test_rfc850() {
        let time = Utc.with_ymd_and_hms(2026, 10, 19, 9, 5, 3).unwrap();
        assert_eq!(rfc850(time), "Monday, 19-Oct-26 09:05:03 UTC");
    }
}
