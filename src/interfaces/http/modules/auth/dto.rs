//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{User, SUPER_ADMIN};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255, message = "The email field is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    /// Whether the caller sees privileged accounts.
    pub is_super_admin: bool,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        let is_super_admin = u.roles.iter().any(|r| r == SUPER_ADMIN);
        Self {
            is_super_admin,
            id: u.id,
            name: u.name,
            email: u.email,
            roles: u.roles.into_iter().collect(),
        }
    }
}
