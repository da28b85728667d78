//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{AuthorizationCode, Flow, OAuth2, Scopes, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "2.0.0",
        description = "Book and Author catalog REST API with Google sign-in"
    ),
    paths(
        // Health
        health::root,
        health::health_check,
        health::readiness_check,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Auth
        auth::google_login,
        auth::google_callback,
        auth::login_failure,
        auth::current_user,
        auth::logout,
    ),
    components(
        schemas(
            // Authors
            crate::models::AuthorPayload,
            crate::models::AuthorResponse,
            crate::models::author::AuthorName,
            // Books
            crate::models::Book,
            crate::models::BookPayload,
            crate::models::BookResponse,
            crate::models::BookSummary,
            // Auth
            crate::models::UserInfo,
            auth::CurrentUserResponse,
            // Health
            health::HealthResponse,
            // Envelopes
            crate::api::MessageResponse,
            crate::api::StatusResponse,
            crate::error::ErrorResponse,
            crate::validation::FieldError,
        )
    ),
    modifiers(&GoogleOAuth),
    tags(
        (name = "health", description = "Greeting and health check endpoints"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book management"),
        (name = "auth", description = "Google sign-in and sessions")
    )
)]
pub struct ApiDoc;

/// Registers the `googleOAuth` security scheme used by write endpoints
struct GoogleOAuth;

impl Modify for GoogleOAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let Some(components) = openapi.components.as_mut() else {
            return;
        };

        let flow = AuthorizationCode::new(
            "/auth/google",
            "/auth/google/callback",
            Scopes::from_iter([
                ("profile", "Access your profile information"),
                ("email", "Access your email address"),
            ]),
        );
        components.add_security_scheme(
            "googleOAuth",
            SecurityScheme::OAuth2(OAuth2::new([Flow::AuthorizationCode(flow)])),
        );
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/api-docs").url("/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_catalog_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/authors", "/authors/{id}", "/books", "/books/{id}", "/auth/user"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("googleOAuth"));
    }
}
