//! Attribute validators, run during ValidateResourceConfig.

use crate::types::{Diagnostics, Dynamic};

pub trait Validator: Send + Sync {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics);
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(n) = value.as_number() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.add_error(
                        format!("{} must be at least {}", attribute_path, min),
                        Some(format!("Got {}", n)),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.add_error(
                        format!("{} must be at most {}", attribute_path, max),
                        Some(format!("Got {}", n)),
                    );
                }
            }
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Dynamic::List(items) = value {
            if let Some(min) = self.min {
                if items.len() < min {
                    diagnostics.add_error(
                        format!("{} must have at least {} items", attribute_path, min),
                        Some(format!("Got {} items", items.len())),
                    );
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    diagnostics.add_error(
                        format!("{} must have at most {} items", attribute_path, max),
                        Some(format!("Got {} items", items.len())),
                    );
                }
            }
        }
    }
}

/// Rejects string values that do not parse as JSON.
pub struct StringIsJsonValidator;

impl Validator for StringIsJsonValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if let Err(e) = serde_json::from_str::<serde_json::Value>(s) {
                diagnostics.add_error(
                    format!("{} must contain valid JSON", attribute_path),
                    Some(format!("Parse error: {}", e)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_range_validator_accepts_valid_number() {
        let validator = NumberRangeValidator {
            min: Some(0.0),
            max: Some(65535.0),
        };

        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::Number(8080.0), "port", &mut diags);

        assert!(!diags.has_errors());
    }

    #[test]
    fn number_range_validator_rejects_out_of_range() {
        let validator = NumberRangeValidator {
            min: Some(0.0),
            max: Some(65535.0),
        };

        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::Number(70000.0), "port", &mut diags);

        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("at most"));
    }

    #[test]
    fn number_range_validator_ignores_non_numbers() {
        let validator = NumberRangeValidator {
            min: Some(0.0),
            max: None,
        };

        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::Null, "port", &mut diags);

        assert!(!diags.has_errors());
    }

    #[test]
    fn list_length_validator_enforces_minimum() {
        let validator = ListLengthValidator {
            min: Some(1),
            max: None,
        };

        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::List(vec![]), "roles", &mut diags);

        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("at least 1"));
    }

    #[test]
    fn string_is_json_validator_accepts_json_and_rejects_garbage() {
        let mut diags = Diagnostics::new();
        StringIsJsonValidator.validate(
            &Dynamic::String(r#"{"region": "eu-west-1"}"#.to_string()),
            "extra",
            &mut diags,
        );
        assert!(!diags.has_errors());

        StringIsJsonValidator.validate(
            &Dynamic::String("not json".to_string()),
            "extra",
            &mut diags,
        );
        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("valid JSON"));
    }
}
