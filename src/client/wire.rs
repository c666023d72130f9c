//! Wire types shared by every configuration object.

use serde::{Deserialize, Serialize};

use crate::config::api;

/// The messages extension attached to configuration responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    /// Informational notifications.
    #[serde(default)]
    pub notifications: Vec<String>,
    /// Actions needed for a change to take effect.
    #[serde(default)]
    pub required_actions: Vec<RequiredAction>,
}

/// An action required before a configuration change takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAction {
    /// The property that triggered the action, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// The action kind, e.g. `componentRestart`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description.
    pub synopsis: String,
}

impl std::fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.property {
            Some(property) => write!(f, "{} ({}): {}", self.kind, property, self.synopsis),
            None => write!(f, "{}: {}", self.kind, self.synopsis),
        }
    }
}

/// The SCIM-style list envelope returned by collection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Envelope schemas.
    #[serde(default)]
    pub schemas: Vec<String>,
    /// Number of matching objects.
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<i64>,
    /// The matching objects.
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}

/// Schema URN of a configuration object: `<prefix><object>` or
/// `<prefix><object>:<kind>`.
pub fn schema_urn(object: &str, kind: Option<&str>) -> String {
    match kind {
        Some(kind) => format!("{}{}:{}", api::SCHEMA_PREFIX, object, kind),
        None => format!("{}{}", api::SCHEMA_PREFIX, object),
    }
}

/// Find the sub-kind of a configuration object from its `schemas` list.
///
/// For `urn:pingidentity:schemas:configuration:2.0:log-retention-policy:time-limit`
/// and object `log-retention-policy` this returns `time-limit`.
pub fn schema_subtype<'a>(value: &'a serde_json::Value, object: &str) -> Result<&'a str, String> {
    let prefix = format!("{}{}:", api::SCHEMA_PREFIX, object);
    let schemas = value
        .get("schemas")
        .and_then(|s| s.as_array())
        .ok_or_else(|| format!("{} response has no schemas", object))?;
    schemas
        .iter()
        .filter_map(|s| s.as_str())
        .find_map(|s| s.strip_prefix(prefix.as_str()))
        .ok_or_else(|| format!("{} response has no {} schema", object, prefix))
}

/// Declare a response enum with one variant per object sub-kind.
///
/// The variant is selected by the `schemas` URN on decode; `type_name()`
/// returns the Terraform `type` value for the populated variant.
macro_rules! oneof_response {
    (
        $(#[$meta:meta])*
        $name:ident, $object:literal {
            $($kind:literal => $variant:ident($ty:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $(
                #[doc = concat!("A `", $kind, "` ", $object, ".")]
                $variant($ty),
            )+
        }

        impl $name {
            /// Every `type` value, in declaration order.
            pub const TYPES: &'static [&'static str] = &[$($kind),+];

            /// The `type` value of the populated variant.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $kind,)+
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                use serde::de::Error;
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                let kind = $crate::client::wire::schema_subtype(&value, $object)
                    .map_err(D::Error::custom)?
                    .to_string();
                match kind.as_str() {
                    $($kind => serde_json::from_value(value)
                        .map(Self::$variant)
                        .map_err(D::Error::custom),)+
                    other => Err(D::Error::custom(format!(
                        "unsupported {} type '{}'",
                        $object, other
                    ))),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $(Self::$variant(inner) => serde::Serialize::serialize(inner, serializer),)+
                }
            }
        }
    };
}

pub(crate) use oneof_response;
