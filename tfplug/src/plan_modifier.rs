//! Plan modifiers
//!
//! Plan modifiers run per attribute after Terraform has proposed a new
//! state. They can rewrite the planned value, mark the attribute as
//! requiring resource replacement, or attach diagnostics to the plan.

use crate::types::{Diagnostics, Dynamic};

#[derive(Debug, Clone)]
pub struct PlanModifyRequest {
    pub state: Dynamic,
    pub plan: Dynamic,
    pub config: Dynamic,
    pub attribute_path: String,
}

#[derive(Debug, Clone)]
pub struct PlanModifyResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Diagnostics,
}

pub trait PlanModifier: Send + Sync {
    /// Human-readable description, surfaced in trace logs.
    fn description(&self) -> String;

    /// Modify the plan for one attribute.
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse;
}

/// Marks an attribute as requiring replacement when its value changes.
///
/// Unknown values never trigger replacement; Terraform has not decided what
/// they are yet.
pub struct RequiresReplaceIfChanged;

impl PlanModifier for RequiresReplaceIfChanged {
    fn description(&self) -> String {
        "requires resource replacement when the value changes".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let requires_replace = !matches!(
            (&request.state, &request.plan),
            (Dynamic::Null, _) | (Dynamic::Unknown, _) | (_, Dynamic::Unknown)
        ) && !values_equal(&request.state, &request.plan);

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Uses the current state value when the planned value is unknown.
///
/// Computed attributes keep their last known value during planning instead
/// of showing up as "(known after apply)" on every run.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "keeps the prior state value while the planned value is unknown".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let plan_value = match &request.plan {
            // Unknown may be decoded as Null due to msgpack limitations
            Dynamic::Unknown | Dynamic::Null => match &request.state {
                Dynamic::Null => request.plan,
                _ => request.state.clone(),
            },
            _ => request.plan,
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Structural equality over Dynamic values. Number comparison tolerates
/// floating point representation noise; map comparison ignores ordering.
pub(crate) fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::Null, Dynamic::Null) => true,
        (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
        (Dynamic::Number(a), Dynamic::Number(b)) => (a - b).abs() < f64::EPSILON,
        (Dynamic::String(a), Dynamic::String(b)) => a == b,
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Dynamic::Map(a), Dynamic::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|v2| values_equal(v, v2)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request(state: Dynamic, plan: Dynamic) -> PlanModifyRequest {
        PlanModifyRequest {
            state,
            config: plan.clone(),
            plan,
            attribute_path: "test.field".to_string(),
        }
    }

    #[test]
    fn requires_replace_does_not_trigger_on_same_value() {
        let response = RequiresReplaceIfChanged.modify_plan(request(
            Dynamic::String("hello".to_string()),
            Dynamic::String("hello".to_string()),
        ));

        assert!(!response.requires_replace);
        assert!(!response.diagnostics.has_errors());
    }

    #[test]
    fn requires_replace_triggers_on_changed_value() {
        let response = RequiresReplaceIfChanged.modify_plan(request(
            Dynamic::String("hello".to_string()),
            Dynamic::String("world".to_string()),
        ));

        assert!(response.requires_replace);
    }

    #[test]
    fn requires_replace_ignores_create_and_unknown() {
        // Create: no prior state value
        let response = RequiresReplaceIfChanged
            .modify_plan(request(Dynamic::Null, Dynamic::String("new".to_string())));
        assert!(!response.requires_replace);

        // Unknown planned value
        let response = RequiresReplaceIfChanged
            .modify_plan(request(Dynamic::String("old".to_string()), Dynamic::Unknown));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_preserves_state() {
        let response = UseStateForUnknown.modify_plan(request(
            Dynamic::Number(7.0),
            Dynamic::Unknown,
        ));

        assert_eq!(response.plan_value, Dynamic::Number(7.0));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_keeps_known_plan_value() {
        let response = UseStateForUnknown.modify_plan(request(
            Dynamic::Number(7.0),
            Dynamic::Number(9.0),
        ));

        assert_eq!(response.plan_value, Dynamic::Number(9.0));
    }

    #[test]
    fn values_equal_handles_collections() {
        let list_a = Dynamic::List(vec![Dynamic::String("a".to_string()), Dynamic::Number(1.0)]);
        let list_b = Dynamic::List(vec![Dynamic::String("a".to_string()), Dynamic::Number(1.0)]);
        let list_c = Dynamic::List(vec![Dynamic::String("b".to_string()), Dynamic::Number(1.0)]);
        assert!(values_equal(&list_a, &list_b));
        assert!(!values_equal(&list_a, &list_c));

        let mut map_a = HashMap::new();
        map_a.insert("key".to_string(), Dynamic::Bool(true));
        let mut map_b = HashMap::new();
        map_b.insert("key".to_string(), Dynamic::Bool(true));
        assert!(values_equal(&Dynamic::Map(map_a), &Dynamic::Map(map_b)));
    }
}
