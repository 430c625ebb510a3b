//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, issues, libraries, users, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Server API",
        version = "0.1.0",
        description = "Multi-tenant library management REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        // Libraries
        libraries::list_libraries,
        libraries::get_library,
        libraries::create_library,
        libraries::update_library,
        libraries::delete_library,
        // Users
        users::create_owner,
        users::create_admin,
        users::create_user,
        users::add_membership,
        // Books
        books::add_book,
        books::get_book,
        books::search_books,
        books::update_book,
        books::delete_book,
        // Issues
        issues::request_issue,
        issues::list_requests,
        issues::get_request,
        issues::approve_request,
        issues::disapprove_request,
        issues::issue_book,
        issues::list_registry,
        issues::return_book,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            auth::LoginResponse,
            // Libraries
            crate::models::library::Library,
            crate::models::library::CreateLibrary,
            crate::models::library::UpdateLibrary,
            libraries::LibraryResponse,
            libraries::LibraryListResponse,
            libraries::LibraryDetailResponse,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserWithLibraries,
            crate::models::user::CreateOwner,
            crate::models::user::CreateAccount,
            crate::models::membership::Membership,
            crate::models::membership::CreateMembership,
            users::OwnerResponse,
            users::AdminResponse,
            users::UserResponse,
            users::MembershipResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::BookResponse,
            books::BookDetailResponse,
            books::BookListResponse,
            // Issues
            crate::models::request::RequestType,
            crate::models::request::RequestEvent,
            crate::models::request::CreateIssueRequest,
            crate::models::issue::IssueStatus,
            crate::models::issue::IssueRegistry,
            crate::models::issue::DirectIssueRequest,
            issues::RequestResponse,
            issues::RequestDetailResponse,
            issues::RequestListResponse,
            issues::IssueResponse,
            issues::IssueListResponse,
            // Common
            MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
            crate::error::ErrorCode,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "libraries", description = "Library management"),
        (name = "users", description = "Accounts and memberships"),
        (name = "books", description = "Book catalog"),
        (name = "issues", description = "Issue requests and registry")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_protected_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/issue/approve/{id}"));
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false));
    }
}
