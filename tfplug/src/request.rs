//! Request and response payloads for provider and resource operations.

use crate::context::Context;
use crate::types::{Config, Diagnostics, State};

#[derive(Clone)]
pub struct ConfigureRequest {
    pub context: Context,
    pub config: Config,
}

#[derive(Clone)]
pub struct ConfigureResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Clone)]
pub struct CreateRequest {
    pub context: Context,
    pub config: Config,
    pub planned_state: State,
}

#[derive(Clone)]
pub struct CreateResponse {
    pub state: State,
    pub diagnostics: Diagnostics,
}

#[derive(Clone)]
pub struct ReadRequest {
    pub context: Context,
    pub current_state: State,
}

/// `state: None` signals that the remote object no longer exists and should
/// be dropped from Terraform state.
#[derive(Clone)]
pub struct ReadResponse {
    pub state: Option<State>,
    pub diagnostics: Diagnostics,
}

#[derive(Clone)]
pub struct UpdateRequest {
    pub context: Context,
    pub config: Config,
    pub planned_state: State,
    pub current_state: State,
}

#[derive(Clone)]
pub struct UpdateResponse {
    pub state: State,
    pub diagnostics: Diagnostics,
}

#[derive(Clone)]
pub struct DeleteRequest {
    pub context: Context,
    pub current_state: State,
}

#[derive(Clone)]
pub struct DeleteResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Clone)]
pub struct ImportRequest {
    pub context: Context,
    pub id: String,
}

#[derive(Clone)]
pub struct ImportResponse {
    pub state: Option<State>,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dynamic;
    use std::collections::HashMap;

    #[test]
    fn read_request_carries_current_state() {
        let mut values = HashMap::new();
        values.insert("id".to_string(), Dynamic::String("test-123".to_string()));

        let req = ReadRequest {
            context: Context::new(),
            current_state: State { values },
        };

        assert_eq!(
            req.current_state
                .values
                .get("id")
                .and_then(|v| v.as_string()),
            Some("test-123")
        );
    }

    #[test]
    fn import_request_carries_id() {
        let req = ImportRequest {
            context: Context::new(),
            id: "my-connection".to_string(),
        };

        assert_eq!(req.id, "my-connection");
    }
}
