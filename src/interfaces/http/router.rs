//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::directory::resource::{
    ColumnKind, ColumnSpec, FieldKind, FilterSpec, FormField, FormSection, NavigationSpec,
    RouteSpec, SelectOption,
};
use crate::application::{IdentityService, ResourceSchema, UserDirectory, UserRow};
use crate::interfaces::http::common::{ApiResponse, PaginatedResponse};
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use crate::interfaces::http::modules::request_id::request_id_middleware;

use super::modules::{auth, health, roles, users};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::get_current_user,
        // Users
        users::list_users,
        users::count_users,
        users::get_schema,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::bulk_delete_users,
        users::restore_user,
        // Roles
        roles::list_roles,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            PaginatedResponse<UserRow>,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Users
            UserRow,
            users::UserFieldsRequest,
            users::BulkDeleteRequest,
            users::BulkDeleteResponse,
            users::UserCountResponse,
            // Resource schema
            ResourceSchema,
            FormSection,
            FormField,
            FieldKind,
            SelectOption,
            ColumnSpec,
            ColumnKind,
            FilterSpec,
            RouteSpec,
            NavigationSpec,
            // Roles
            roles::RoleDto,
            // Health
            health::HealthResponse,
            health::ComponentHealth,
            health::HealthStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check"),
        (name = "Authentication", description = "Login (JWT) and current user"),
        (name = "Users", description = "Scoped user management: list, create, edit, soft delete, restore"),
        (name = "Roles", description = "Assignable roles"),
    ),
    info(
        title = "User Directory API",
        version = "1.0.0",
        description = "REST API for the scoped user directory",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    db: DatabaseConnection,
    directory: Arc<UserDirectory>,
    identity: Arc<IdentityService>,
    prometheus_handle: PrometheusHandle,
) -> Router {
    let middleware_state = AuthState {
        identity: identity.clone(),
    };
    let auth_state = auth::AuthHandlerState { identity };
    let user_state = users::UserHandlerState { directory };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .with_state(auth_state.clone());

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/me", get(auth::get_current_user))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(auth_state);

    // User routes (protected)
    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/count", get(users::count_users))
        .route("/schema", get(users::get_schema))
        .route("/bulk-delete", post(users::bulk_delete_users))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/restore", post(users::restore_user))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(user_state.clone());

    // Role routes (protected)
    let role_routes = Router::new()
        .route("/", get(roles::list_roles))
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(user_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db,
            started_at: Arc::new(Instant::now()),
        });

    let metrics_routes = Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(MetricsState {
            handle: prometheus_handle,
        });

    let swagger_routes =
        SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Auth
        .nest("/api/v1/auth", auth_routes.merge(auth_protected_routes))
        // Users
        .nest("/api/v1/users", user_routes)
        // Roles
        .nest("/api/v1/roles", role_routes)
        // Middleware
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};

    use crate::application::{bootstrap, DirectorySettings};
    use crate::config::AppConfig;
    use crate::domain::{Principal, RepositoryProvider, UserFields, SUPER_ADMIN};
    use crate::infrastructure::crypto::jwt::JwtConfig;
    use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
    use crate::infrastructure::database::testing::memory_db;

    struct TestApp {
        router: Router,
        directory: Arc<UserDirectory>,
        admin: Principal,
    }

    async fn app() -> TestApp {
        let db = memory_db().await;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        let mut config = AppConfig::default();
        config.security.bcrypt_cost = 4;
        config.directory.seed_roles = vec!["editor".into()];
        bootstrap(repos.as_ref(), &config, true).await.unwrap();

        let admin = repos
            .users()
            .get_user_by_email(&config.admin.email)
            .await
            .unwrap()
            .unwrap();

        let directory = Arc::new(UserDirectory::new(
            repos.clone(),
            DirectorySettings {
                bcrypt_cost: 4,
                ..DirectorySettings::default()
            },
        ));
        let identity = Arc::new(IdentityService::new(
            repos,
            JwtConfig {
                secret: "test-secret".into(),
                expiration_hours: 1,
                issuer: "user-directory".into(),
            },
        ));
        let handle = PrometheusBuilder::new().build_recorder().handle();

        TestApp {
            router: create_api_router(db, directory.clone(), identity, handle),
            directory,
            admin: Principal::new(admin.id, admin.roles),
        }
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        use tower::Service;
        let mut svc = router.clone().into_service();
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn login(router: &Router, email: &str, password: &str) -> String {
        let (status, _, body) = send(
            router,
            request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": email, "password": password})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn login_then_list_returns_only_visible_users() {
        let app = app().await;
        app.directory
            .create_user(
                &app.admin,
                UserFields {
                    name: "Ann".into(),
                    email: "ann@example.com".into(),
                    password: Some("ann-password".into()),
                    is_active: None,
                    roles: ["editor".to_string()].into_iter().collect(),
                },
            )
            .await
            .unwrap();

        let token = login(&app.router, "ann@example.com", "ann-password").await;
        let (status, _, body) = send(&app.router, request("GET", "/api/v1/users", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["email"], "ann@example.com");
        assert_eq!(body["data"]["items"][0]["roles_display"], "editor");

        let (_, _, count) = send(&app.router, request("GET", "/api/v1/users/count", Some(&token), None)).await;
        assert_eq!(count["data"]["count"], 1);

        let (_, _, roles) = send(&app.router, request("GET", "/api/v1/roles", Some(&token), None)).await;
        let names: Vec<&str> = roles["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["editor"]);

        let admin_token = login(&app.router, "admin@example.com", "admin123").await;
        let (_, _, body) = send(&app.router, request("GET", "/api/v1/users", Some(&admin_token), None)).await;
        assert_eq!(body["data"]["total"], 2);
    }

    #[tokio::test]
    async fn request_without_token_is_401() {
        let app = app().await;

        let (status, _, body) = send(&app.router, request("GET", "/api/v1/users", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _, _) = send(&app.router, request("GET", "/api/v1/users", Some("garbage"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(
            &app.router,
            request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "admin@example.com", "password": "wrong"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_update_delete_round() {
        let app = app().await;
        let token = login(&app.router, "admin@example.com", "admin123").await;

        let (status, _, body) = send(
            &app.router,
            request(
                "POST",
                "/api/v1/users",
                Some(&token),
                Some(json!({"name": "", "email": "admin@example.com", "roles": ["ghost"]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"roles"));

        let (status, _, body) = send(
            &app.router,
            request(
                "POST",
                "/api/v1/users",
                Some(&token),
                Some(json!({"name": "Bob", "email": "bob@example.com", "roles": ["editor"]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _, body) = send(
            &app.router,
            request(
                "PUT",
                &format!("/api/v1/users/{id}"),
                Some(&token),
                Some(json!({"name": "Robert", "email": "bob@example.com", "roles": []})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Robert");
        assert_eq!(body["data"]["roles_display"], "");

        let uri = format!("/api/v1/users/{id}");
        let (status, _, _) = send(&app.router, request("DELETE", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) = send(&app.router, request("DELETE", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(
            &app.router,
            request("POST", &format!("/api/v1/users/{id}/restore"), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_user_bodies_still_use_the_envelope() {
        let app = app().await;
        let token = login(&app.router, "admin@example.com", "admin123").await;

        let raw = |method: &str, uri: &str, body: &'static str| {
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap()
        };

        let (status, _, body) = send(&app.router, raw("POST", "/api/v1/users", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));

        let (status, _, body) = send(
            &app.router,
            raw(
                "POST",
                "/api/v1/users",
                r#"{"name": "Bob", "email": "bob@example.com", "roles": "editor"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let uri = format!("/api/v1/users/{}", app.admin.user_id);
        let (status, _, body) = send(&app.router, raw("PUT", &uri, "[]")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (status, _, body) = send(&app.router, raw("POST", "/api/v1/users/bulk-delete", "{")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn privileged_user_is_not_found_for_restricted_caller() {
        let app = app().await;
        app.directory
            .create_user(
                &app.admin,
                UserFields {
                    name: "Ann".into(),
                    email: "ann@example.com".into(),
                    password: Some("ann-password".into()),
                    is_active: None,
                    roles: ["editor".to_string()].into_iter().collect(),
                },
            )
            .await
            .unwrap();
        let token = login(&app.router, "ann@example.com", "ann-password").await;

        let uri = format!("/api/v1/users/{}", app.admin.user_id);
        let (status, _, _) = send(&app.router, request("GET", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(
            &app.router,
            request(
                "POST",
                "/api/v1/users",
                Some(&token),
                Some(json!({"name": "Eve", "email": "eve@example.com", "roles": [SUPER_ADMIN]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["data"][0]["code"], "unknown_role");

        let (_, _, schema) = send(&app.router, request("GET", "/api/v1/users/schema", Some(&token), None)).await;
        assert_eq!(schema["data"]["filters"][0]["options"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn health_is_public_and_echoes_request_id() {
        let app = app().await;
        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();

        let (status, headers, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["status"], "ok");
        assert!(body["database"].get("error").is_none());
        assert_eq!(headers.get("x-request-id").unwrap(), "abc-123");
    }
}
