//! User DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{GetUserDto, SortDirection, UserFields, UserSortField};

/// Create / edit form submission
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UserFieldsRequest {
    pub name: String,
    pub email: String,
    /// Omit or leave blank to keep the current password
    pub password: Option<String>,
    pub is_active: Option<bool>,
    /// Role names
    pub roles: Vec<String>,
}

impl From<UserFieldsRequest> for UserFields {
    fn from(r: UserFieldsRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
            is_active: r.is_active,
            roles: r.roles.into_iter().collect(),
        }
    }
}

/// List users query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersParams {
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    /// Comma-separated role names; users holding any of them match
    pub roles: Option<String>,
    /// `name`, `email` or `created_at` (default)
    #[param(value_type = Option<String>)]
    pub sort_by: Option<UserSortField>,
    /// `asc` or `desc` (default)
    #[param(value_type = Option<String>)]
    pub sort_dir: Option<SortDirection>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl From<ListUsersParams> for GetUserDto {
    fn from(p: ListUsersParams) -> Self {
        let roles = p
            .roles
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            search: p.search,
            roles,
            sort_by: p.sort_by.unwrap_or_default(),
            sort_dir: p.sort_dir.unwrap_or_default(),
            page: p.page,
            page_size: p.page_size,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_list_is_split_and_trimmed() {
        let dto = GetUserDto::from(ListUsersParams {
            roles: Some("editor, ,viewer ".into()),
            ..Default::default()
        });
        assert_eq!(dto.roles, vec!["editor", "viewer"]);
        assert_eq!(dto.sort_by, UserSortField::CreatedAt);
        assert_eq!(dto.sort_dir, SortDirection::Desc);
    }

    #[test]
    fn missing_form_fields_default_to_empty() {
        let req: UserFieldsRequest = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        let fields = UserFields::from(req);
        assert!(fields.name.is_empty());
        assert!(fields.password.is_none());
        assert!(fields.roles.is_empty());
    }
}
