//! Terraform attribute type system

use std::collections::HashMap;

/// AttributeType mirrors Terraform's cty type system for schema attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    /// Encode the type constraint in the JSON form Terraform expects inside
    /// schema attributes ("string", ["set", "string"], ...).
    pub fn to_wire_json(&self) -> Vec<u8> {
        self.wire_value().to_string().into_bytes()
    }

    fn wire_value(&self) -> serde_json::Value {
        use serde_json::{json, Value};

        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(elem) => json!(["list", elem.wire_value()]),
            AttributeType::Set(elem) => json!(["set", elem.wire_value()]),
            AttributeType::Map(elem) => json!(["map", elem.wire_value()]),
            AttributeType::Object(attrs) => {
                let fields: serde_json::Map<String, Value> = attrs
                    .iter()
                    .map(|(name, attr_type)| (name.clone(), attr_type.wire_value()))
                    .collect();
                json!(["object", fields])
            }
        }
    }
}
