//! Diff suppression for JSON-valued connection secrets
//!
//! Airflow reformats the `extra` blob on its way through the API and masks
//! sensitive values with `***`. Compared textually, both would surface a
//! pending change on every plan. `suppress_equivalent_json` decides whether
//! a stored value and a newly proposed one are equivalent renditions, and
//! `SuppressEquivalentJson` plugs that decision into the planning pipeline.

use serde_json::Value;
use tfplug::plan_modifier::{PlanModifier, PlanModifyRequest, PlanModifyResponse};
use tfplug::{Diagnostics, Dynamic};

/// Decide whether `candidate` is an equivalent rendition of `stored`.
///
/// The comparison degrades through tiers and never fails:
///
/// 1. Textual equality after trimming.
/// 2. A fully masked candidate opposite a non-empty stored value. The
///    substitution is one-directional: a masked *stored* value never
///    suppresses a real new candidate.
/// 3. Both sides parse as JSON: structural equality ignoring key order and
///    number formatting, after replacing masked string leaves of the
///    candidate with the stored string at the same position. Failing that,
///    null, `{}` and `[]` count as the same empty state.
/// 4. Exactly one side parses as JSON: equivalent only when the parsed side
///    is such an empty state and the other side is the empty string. The
///    asymmetry is deliberate — a change from non-JSON garbage to an
///    explicit empty object is still a change.
pub fn suppress_equivalent_json(stored: &str, candidate: &str) -> bool {
    let stored = stored.trim();
    let candidate = candidate.trim();

    if stored == candidate {
        return true;
    }

    if is_masked(candidate) && !stored.is_empty() {
        return true;
    }

    match (
        serde_json::from_str::<Value>(stored),
        serde_json::from_str::<Value>(candidate),
    ) {
        (Ok(stored_json), Ok(candidate_json)) => {
            let unmasked = substitute_masked(&candidate_json, Some(&stored_json));
            if json_equal(&stored_json, &unmasked) {
                return true;
            }
            is_empty_json(&stored_json) && is_empty_json(&candidate_json)
        }
        (Ok(parsed), Err(_)) => is_empty_json(&parsed) && candidate.is_empty(),
        (Err(_), Ok(parsed)) => is_empty_json(&parsed) && stored.is_empty(),
        (Err(_), Err(_)) => false,
    }
}

/// Non-empty and consisting of nothing but `*`.
fn is_masked(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c == '*')
}

/// Null, the empty object, and the empty sequence all describe "no content".
fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Rebuild `candidate` with every masked string leaf replaced by the
/// non-empty stored string at the corresponding position (same object key
/// or array index). Produces a fresh tree; neither input is mutated.
fn substitute_masked(candidate: &Value, stored: Option<&Value>) -> Value {
    match candidate {
        Value::String(s) if is_masked(s) => match stored {
            Some(Value::String(stored_str)) if !stored_str.is_empty() => {
                Value::String(stored_str.clone())
            }
            _ => candidate.clone(),
        },
        Value::Object(map) => {
            let stored_map = match stored {
                Some(Value::Object(m)) => Some(m),
                _ => None,
            };
            Value::Object(
                map.iter()
                    .map(|(key, value)| {
                        let counterpart = stored_map.and_then(|m| m.get(key));
                        (key.clone(), substitute_masked(value, counterpart))
                    })
                    .collect(),
            )
        }
        Value::Array(items) => {
            let stored_items = match stored {
                Some(Value::Array(a)) => Some(a),
                _ => None,
            };
            Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, value)| {
                        let counterpart = stored_items.and_then(|a| a.get(idx));
                        substitute_masked(value, counterpart)
                    })
                    .collect(),
            )
        }
        _ => candidate.clone(),
    }
}

/// Structural equality with order-insensitive objects and numeric
/// comparison by value, so `1` and `1.0` are the same number.
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|v2| json_equal(v, v2)))
        }
        _ => false,
    }
}

/// Plan modifier applying `suppress_equivalent_json` to a string attribute:
/// when the planned value is an equivalent rendition of the stored one, the
/// plan keeps the stored value and Terraform reports no change.
pub struct SuppressEquivalentJson;

impl PlanModifier for SuppressEquivalentJson {
    fn description(&self) -> String {
        "treats equivalent JSON renditions and masked secrets as unchanged".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let suppress = match (&request.state, &request.plan) {
            (Dynamic::String(stored), Dynamic::String(candidate)) => {
                suppress_equivalent_json(stored, candidate)
            }
            _ => false,
        };

        let plan_value = if suppress {
            request.state.clone()
        } else {
            request.plan
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }
}
