//! User API models and endpoints

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::ApiQueryParams;
use super::error::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRole {
    pub name: String,
}

/// User as exchanged with `/users`. The password is write-only; the API
/// never returns it. The login counters and activity flag are maintained by
/// the webserver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub roles: Vec<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_login_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

pub struct UsersApi<'a> {
    client: &'a Client,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, user: &User) -> Result<User, ApiError> {
        self.client.post("/users", user).await
    }

    pub async fn get(&self, username: &str) -> Result<User, ApiError> {
        self.client
            .get(&format!("/users/{}", urlencoding::encode(username)))
            .await
    }

    /// Update a user. With an `update_mask` only the named fields are
    /// applied; the rest of the body still has to be populated to satisfy
    /// the API's request validation.
    pub async fn update(
        &self,
        username: &str,
        user: &User,
        update_mask: Option<&[&str]>,
    ) -> Result<User, ApiError> {
        let params =
            ApiQueryParams::new().add_optional("update_mask", update_mask.map(|m| m.join(",")));

        self.client
            .patch_with_params(
                &format!("/users/{}", urlencoding::encode(username)),
                &params,
                user,
            )
            .await
    }

    pub async fn delete(&self, username: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/users/{}", urlencoding::encode(username)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_parses_roles_and_counters() {
        let user: User = serde_json::from_str(
            r#"{
                "username": "jdoe",
                "email": "jdoe@example.com",
                "first_name": "J",
                "last_name": "Doe",
                "roles": [{"name": "Admin"}, {"name": "Viewer"}],
                "active": true,
                "login_count": 4,
                "failed_login_count": 0,
                "last_login": "2024-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(user.roles.len(), 2);
        assert_eq!(user.roles[0].name, "Admin");
        assert_eq!(user.login_count, Some(4));
        assert!(user.password.is_none());
    }
}
