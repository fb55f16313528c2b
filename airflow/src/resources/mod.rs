//! Managed resource implementations

pub mod connection;
pub mod pool;
pub mod user;
pub mod user_roles;
pub mod variable;

pub use connection::ConnectionResource;
pub use pool::PoolResource;
pub use user::UserResource;
pub use user_roles::UserRolesResource;
pub use variable::VariableResource;

use std::collections::HashMap;
use tfplug::Dynamic;

/// Fetch an attribute as an owned string, if present and a string.
pub(crate) fn get_string(values: &HashMap<String, Dynamic>, key: &str) -> Option<String> {
    values.get(key).and_then(|v| v.as_string()).map(str::to_string)
}
