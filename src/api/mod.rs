//! API handlers and router for the library REST endpoints

pub mod auth;
pub mod books;
pub mod guard;
pub mod health;
pub mod issues;
pub mod libraries;
pub mod openapi;
pub mod users;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{models::user::RoleSet, AppState};

pub use guard::{ApiPath, ApiQuery, AuthenticatedUser, ValidatedJson};

/// Plain acknowledgement
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let gate = |roles: RoleSet| {
        middleware::from_fn_with_state(
            guard::Gate::new(state.services.tokens.clone(), roles),
            guard::authorize,
        )
    };

    let owner_routes = Router::new()
        .route("/library", post(libraries::create_library))
        .route("/library/:id", put(libraries::update_library))
        .route("/library/:id", delete(libraries::delete_library))
        .route("/owner", post(users::create_owner))
        .route("/admin", post(users::create_admin))
        .route("/membership", post(users::add_membership))
        .route_layer(gate(RoleSet::OWNER));

    let admin_routes = Router::new()
        .route("/user", post(users::create_user))
        .route("/book", post(books::add_book))
        .route("/book/:isbn", put(books::update_book))
        .route("/book/:isbn", delete(books::delete_book))
        .route("/issues", get(issues::list_requests))
        .route("/issue/request/:id", get(issues::get_request))
        .route("/issue/approve/:id", put(issues::approve_request))
        .route("/issue/disapprove/:id", put(issues::disapprove_request))
        .route("/issue/book/:isbn", post(issues::issue_book))
        .route("/issue/registry", get(issues::list_registry))
        .route("/issue/return/:id", put(issues::return_book))
        .route_layer(gate(RoleSet::ADMIN));

    let user_routes = Router::new()
        .route("/books/search", get(books::search_books))
        .route("/issue", post(issues::request_issue))
        .route_layer(gate(RoleSet::USER));

    let shared_routes = Router::new()
        .route("/books/:isbn", get(books::get_book))
        .route_layer(gate(RoleSet::ANY));

    let protected = Router::new()
        .merge(owner_routes)
        .merge(admin_routes)
        .merge(user_routes)
        .merge(shared_routes);

    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/auth/login", post(auth::login))
        .route("/libraries", get(libraries::list_libraries))
        .route("/libraries/:id", get(libraries::get_library));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public)
        .nest("/api", protected)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, AuthConfig, BootstrapConfig, DatabaseConfig, LoggingConfig, ServerConfig},
        models::user::Role,
        repository::Repository,
        services::Services,
    };
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Method, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Router over a pool that never connects; only paths that stop before
    /// the database can be exercised.
    fn app() -> Router {
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig {
                jwt_secret: "router-test-secret".to_string(),
                jwt_expiration_hours: 1,
            },
            logging: LoggingConfig::default(),
            bootstrap: BootstrapConfig::default(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        let services = Services::new(Repository::new(pool), &config.auth);
        create_router(AppState {
            services: Arc::new(services),
        })
    }

    fn bearer(role: Role) -> String {
        let tokens = crate::services::credentials::TokenService::new(&AuthConfig {
            jwt_secret: "router-test-secret".to_string(),
            jwt_expiration_hours: 1,
        });
        format!("Bearer {}", tokens.issue(1, role).unwrap())
    }

    async fn status(method: Method, uri: &str, role: Option<Role>) -> StatusCode {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            request = request.header(AUTHORIZATION, bearer(role));
        }
        app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        assert_eq!(status(Method::GET, "/health", None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_token() {
        assert_eq!(status(Method::GET, "/api/issues", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(Method::POST, "/api/library", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(Method::GET, "/api/books/978", None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_route_groups_enforce_roles() {
        // owner-only
        assert_eq!(status(Method::POST, "/api/admin", Some(Role::Admin)).await, StatusCode::FORBIDDEN);
        assert_eq!(status(Method::DELETE, "/api/library/1", Some(Role::User)).await, StatusCode::FORBIDDEN);
        // admin-only
        assert_eq!(status(Method::POST, "/api/book", Some(Role::User)).await, StatusCode::FORBIDDEN);
        assert_eq!(status(Method::PUT, "/api/issue/approve/1", Some(Role::Owner)).await, StatusCode::FORBIDDEN);
        assert_eq!(status(Method::PUT, "/api/issue/return/1", Some(Role::User)).await, StatusCode::FORBIDDEN);
        // user-only
        assert_eq!(status(Method::POST, "/api/issue", Some(Role::Admin)).await, StatusCode::FORBIDDEN);
        assert_eq!(status(Method::GET, "/api/books/search", Some(Role::Owner)).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected_before_the_database() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/issue")
            .header(AUTHORIZATION, bearer(Role::User))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"isbn":""}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn json_error(method: Method, uri: &str, role: Role) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, bearer(role))
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        assert_eq!(response.headers()["content-type"], "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_id_gets_error_envelope() {
        let (status, body) = json_error(Method::PUT, "/api/issue/approve/abc", Role::Admin).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BadValue");
        assert!(body["error"].is_string());

        let (status, body) = json_error(Method::DELETE, "/api/library/x1", Role::Owner).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BadValue");
    }

    #[tokio::test]
    async fn test_malformed_query_gets_error_envelope() {
        let (status, body) = json_error(Method::GET, "/api/issues?pending=maybe", Role::Admin).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BadValue");
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        assert_eq!(status(Method::GET, "/api/nope", None).await, StatusCode::NOT_FOUND);
    }
}
