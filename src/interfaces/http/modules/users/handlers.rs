//! User management API handlers
//!
//! Every handler receives the authenticated `Principal` and delegates to
//! `UserDirectory`, which applies the visibility scope.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    BulkDeleteRequest, BulkDeleteResponse, ListUsersParams, UserCountResponse, UserFieldsRequest,
};
use crate::application::{user_resource, ResourceSchema, UserDirectory, UserRow};
use crate::domain::Principal;
use crate::interfaces::http::common::{ApiError, ApiResponse, JsonBody, PaginatedResponse};

/// State shared by the user and role handlers
#[derive(Clone)]
pub struct UserHandlerState {
    pub directory: Arc<UserDirectory>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "Visible users", body = ApiResponse<PaginatedResponse<UserRow>>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<UserRow>>>, ApiError> {
    let result = state.directory.list_users(&principal, params.into()).await?;
    let page = PaginatedResponse::from_result(result, |u| UserRow::from(&u));
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/count",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Number of visible users", body = ApiResponse<UserCountResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn count_users(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<UserCountResponse>>, ApiError> {
    let count = state.directory.count_visible_users(&principal).await?;
    Ok(Json(ApiResponse::success(UserCountResponse { count })))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/schema",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Form, table and filter description", body = ApiResponse<ResourceSchema>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_schema(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<ResourceSchema>>, ApiError> {
    let roles = state.directory.assignable_roles(&principal).await?;
    let schema = user_resource(&roles, state.directory.settings().require_password_on_create);
    Ok(Json(ApiResponse::success(schema)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserRow>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserRow>>, ApiError> {
    let user = state.directory.get_user(&principal, &id).await?;
    Ok(Json(ApiResponse::success(UserRow::from(&user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UserFieldsRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserRow>),
        (status = 400, description = "Malformed JSON body"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
    JsonBody(request): JsonBody<UserFieldsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserRow>>), ApiError> {
    let user = state.directory.create_user(&principal, request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserRow::from(&user))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UserFieldsRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserRow>),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UserFieldsRequest>,
) -> Result<Json<ApiResponse<UserRow>>, ApiError> {
    let user = state
        .directory
        .update_user(&principal, &id, request.into())
        .await?;
    Ok(Json(ApiResponse::success(UserRow::from(&user))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.directory.soft_delete_user(&principal, &id).await?;
    Ok(Json(ApiResponse::success(())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/bulk-delete",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Number of users deleted", body = ApiResponse<BulkDeleteResponse>)
    )
)]
pub async fn bulk_delete_users(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
    JsonBody(request): JsonBody<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<BulkDeleteResponse>>, ApiError> {
    let deleted = state
        .directory
        .soft_delete_users(&principal, &request.ids)
        .await?;
    Ok(Json(ApiResponse::success(BulkDeleteResponse { deleted })))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/restore",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User restored", body = ApiResponse<UserRow>),
        (status = 404, description = "Not found"),
        (status = 422, description = "Email taken meanwhile")
    )
)]
pub async fn restore_user(
    State(state): State<UserHandlerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserRow>>, ApiError> {
    let user = state.directory.restore_user(&principal, &id).await?;
    Ok(Json(ApiResponse::success(UserRow::from(&user))))
}
