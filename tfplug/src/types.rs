//! Core value and diagnostic types for tfplug
//!
//! Terraform exchanges attribute data as dynamically typed values. The
//! `Dynamic` enum mirrors that type system; `Config` and `State` are the
//! attribute maps handed to providers and resources.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel used on the wire for values Terraform has not computed yet.
const UNKNOWN_SENTINEL: &str = "__unknown__";

/// Dynamic represents Terraform values that can be of any type.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    /// Explicit null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Number value (all numbers are f64 to match Terraform)
    Number(f64),
    /// String value
    String(String),
    /// List of values (ordered, allows duplicates; also carries set values)
    List(Vec<Dynamic>),
    /// Map of string keys to values (objects are represented as Maps)
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            Dynamic::Unknown => serializer.serialize_str(UNKNOWN_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a valid Dynamic value")
            }

            fn visit_unit<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Dynamic, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Dynamic::deserialize(deserializer)
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                if value == UNKNOWN_SENTINEL {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value.to_string()))
                }
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                if value == UNKNOWN_SENTINEL {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value))
                }
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Dynamic::List(vec))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut hashmap = HashMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    hashmap.insert(key, value);
                }
                Ok(Dynamic::Map(hashmap))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// Config holds the attribute values Terraform passed for a provider or
/// resource configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub values: HashMap<String, Dynamic>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }
}

/// State holds the attribute values persisted for a resource instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub values: HashMap<String, Dynamic>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A single diagnostic message with an optional longer detail.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticItem {
    pub summary: String,
    pub detail: Option<String>,
}

/// Diagnostics collects errors and warnings produced while handling a
/// request. Errors abort the operation on the Terraform side; warnings are
/// shown to the user but do not stop the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub errors: Vec<DiagnosticItem>,
    pub warnings: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: Option<impl Into<String>>) {
        self.errors.push(DiagnosticItem {
            summary: summary.into(),
            detail: detail.map(Into::into),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: Option<impl Into<String>>) {
        self.warnings.push(DiagnosticItem {
            summary: summary.into(),
            detail: detail.map(Into::into),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_accessors_return_expected_variants() {
        assert_eq!(Dynamic::String("x".to_string()).as_string(), Some("x"));
        assert_eq!(Dynamic::Number(4.0).as_number(), Some(4.0));
        assert_eq!(Dynamic::Bool(true).as_bool(), Some(true));
        assert!(Dynamic::Null.as_string().is_none());
        assert!(Dynamic::Null.is_null());
        assert!(Dynamic::Unknown.is_unknown());
    }

    #[test]
    fn dynamic_msgpack_round_trip() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), Dynamic::String("pool".to_string()));
        values.insert("slots".to_string(), Dynamic::Number(3.0));
        values.insert("deferred".to_string(), Dynamic::Bool(false));
        values.insert(
            "roles".to_string(),
            Dynamic::List(vec![Dynamic::String("Admin".to_string())]),
        );

        let encoded = rmp_serde::encode::to_vec_named(&values).unwrap();
        let decoded: HashMap<String, Dynamic> = rmp_serde::decode::from_slice(&encoded).unwrap();

        assert_eq!(decoded, values);
    }

    #[test]
    fn dynamic_json_round_trip_preserves_null_and_nesting() {
        let mut inner = HashMap::new();
        inner.insert("empty".to_string(), Dynamic::Null);
        let value = Dynamic::Map(inner);

        let encoded = serde_json::to_vec(&value).unwrap();
        let decoded: Dynamic = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(decoded, value);
    }

    #[test]
    fn unknown_survives_serialization() {
        let encoded = serde_json::to_string(&Dynamic::Unknown).unwrap();
        let decoded: Dynamic = serde_json::from_str(&encoded).unwrap();
        assert!(decoded.is_unknown());
    }

    #[test]
    fn diagnostics_collects_errors_and_warnings() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());

        diags.add_warning("heads up", None::<String>);
        assert!(!diags.has_errors());

        diags.add_error("boom", Some("it broke"));
        assert!(diags.has_errors());
        assert_eq!(diags.errors[0].summary, "boom");
        assert_eq!(diags.errors[0].detail.as_deref(), Some("it broke"));
        assert_eq!(diags.warnings.len(), 1);
    }
}
