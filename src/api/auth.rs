//! Google sign-in and session endpoints

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::UserInfo,
    services::auth::CallbackParams,
};

use super::{CurrentUser, StatusResponse};

/// Query string Google appends when redirecting back
#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the user denied consent
    pub error: Option<String>,
}

impl From<CallbackQuery> for CallbackParams {
    fn from(query: CallbackQuery) -> Self {
        Self {
            code: query.code,
            state: query.state,
            error: query.error,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: UserInfo,
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Start Google sign-in
#[utoipa::path(
    get,
    path = "/auth/google",
    tag = "auth",
    responses(
        (status = 302, description = "Redirect to the Google consent page")
    )
)]
pub async fn google_login(
    State(state): State<crate::AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Response> {
    let url = state.services.auth.begin_login(&session).await?;
    Ok(found(url.as_str()))
}

/// Google redirects here after consent
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    tag = "auth",
    params(CallbackQuery),
    responses(
        (status = 302, description = "Redirect to the success page, or to /auth/failure")
    )
)]
pub async fn google_callback(
    State(state): State<crate::AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    let google = &state.config.google;

    match state.services.auth.complete_login(&session, query.into()).await {
        Ok(_) => Ok(found(&google.success_redirect)),
        Err(AppError::Authentication(_)) => Ok(found(&google.failure_redirect)),
        Err(e) => Err(e),
    }
}

/// Landing page for a failed sign-in
#[utoipa::path(
    get,
    path = "/auth/failure",
    tag = "auth",
    responses(
        (status = 401, description = "Sign-in failed", body = ErrorResponse)
    )
)]
pub async fn login_failure() -> AppError {
    AppError::Authentication("Google authentication failed".to_string())
}

/// Currently signed-in user
#[utoipa::path(
    get,
    path = "/auth/user",
    tag = "auth",
    security(("googleOAuth" = [])),
    responses(
        (status = 200, description = "Signed-in user", body = CurrentUserResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn current_user(
    CurrentUser(principal): CurrentUser,
) -> AppResult<Json<CurrentUserResponse>> {
    let principal =
        principal.ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))?;

    Ok(Json(CurrentUserResponse {
        success: true,
        user: UserInfo::from(&principal),
    }))
}

/// Sign out and forget the session
#[utoipa::path(
    get,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Signed out", body = StatusResponse),
        (status = 500, description = "Session could not be destroyed", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    if let Err(e) = state.services.auth.logout(&session).await {
        tracing::error!("Logout failed: {}", e);
        let body = ErrorResponse {
            success: false,
            error: "Logout failed".to_string(),
            errors: None,
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    Json(StatusResponse::new("Logout successful")).into_response()
}
