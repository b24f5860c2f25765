use axum::{extract::State, Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Principal, Role};
use crate::interfaces::http::common::{ApiError, ApiResponse};
use crate::interfaces::http::modules::users::UserHandlerState;

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleDto {
    pub id: String,
    pub name: String,
}

impl From<Role> for RoleDto {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "Roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roles the caller may assign", body = ApiResponse<Vec<RoleDto>>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_roles(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<RoleDto>>>, ApiError> {
    let roles = state.directory.assignable_roles(&principal).await?;
    Ok(Json(ApiResponse::success(
        roles.into_iter().map(RoleDto::from).collect(),
    )))
}
