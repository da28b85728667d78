//! API handlers for Libris REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderValue, Method},
    routing::get,
    Extension, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult, Entity},
    models::Principal,
    services::sessions::AppSessionStore,
    AppState,
};

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let sessions = session_layer(state.session_store.clone(), &state.config.session);

    let routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authors
        .route(
            "/authors",
            get(authors::list_authors).post(authors::create_author),
        )
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Authentication
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/failure", get(auth::login_failure))
        .route("/auth/user", get(auth::current_user))
        .route("/auth/logout", get(auth::logout))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Cookie-backed sessions. A record is only written once something is
/// stored in it, so anonymous reads never create one.
pub fn session_layer(
    store: AppSessionStore,
    config: &SessionConfig,
) -> SessionManagerLayer<AppSessionStore> {
    SessionManagerLayer::new(store)
        .with_name(config.cookie_name.clone())
        .with_path("/")
        .with_http_only(true)
        .with_secure(config.effective_secure())
        .with_same_site(config.same_site.into())
        .with_expiry(Expiry::OnInactivity(config.ttl()))
        .with_always_save(config.rolling)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Session attached to the request by [`session_layer`]
async fn request_session(parts: &mut Parts, state: &AppState) -> AppResult<Session> {
    let Extension(session) = Extension::<Session>::from_request_parts(parts, state)
        .await
        .map_err(|e| AppError::Internal(format!("Session layer missing: {}", e)))?;
    Ok(session)
}

/// Principal signed in on the request's session, if any
pub struct CurrentUser(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = request_session(parts, state).await?;
        let principal = state.services.auth.principal(&session).await?;
        Ok(CurrentUser(principal))
    }
}

/// Extractor that only lets requests with a signed-in principal through
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;

        principal.map(AuthenticatedUser).ok_or_else(|| {
            AppError::Authentication("Authentication required. Please log in.".to_string())
        })
    }
}

/// JSON body whose syntax errors are reported as validation failures
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);

/// Parse a path id, distinguishing malformed ids from unknown ones
pub fn parse_id(raw: &str, entity: Entity) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId(entity))
}

/// `{success, count?, data}` envelope
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }
}

impl<T: Serialize> DataResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
        }
    }
}

/// `{success, message, data: {}}` envelope returned by deletes
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: serde_json::json!({}),
        }
    }
}

/// `{success, message}` acknowledgement without a payload
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
