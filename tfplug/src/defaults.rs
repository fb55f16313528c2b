//! Default value providers for attributes
//!
//! Defaults are evaluated during planning when an optional attribute is
//! absent from the configuration. They differ from plan modifiers in that
//! they only run when the value is missing, not when it is explicitly set.

use crate::types::Dynamic;
use std::sync::Arc;

pub struct DefaultRequest {
    pub attribute_path: String,
}

pub struct DefaultResponse {
    pub value: Dynamic,
}

pub trait DefaultValue: Send + Sync {
    /// Human-readable description, surfaced in trace logs.
    fn description(&self) -> String;

    /// Produce the default value for the attribute.
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

/// StaticDefault provides a fixed default value.
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Arc<dyn DefaultValue> {
        Arc::new(Self { value })
    }

    pub fn string(value: &str) -> Arc<dyn DefaultValue> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Arc<dyn DefaultValue> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Arc<dyn DefaultValue> {
        Self::create(Dynamic::Bool(value))
    }
}

impl DefaultValue for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}
