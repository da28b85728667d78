//! Authors API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, Entity},
    models::{AuthorPayload, AuthorResponse},
};

use super::{parse_id, AuthenticatedUser, DataResponse, MessageResponse, ValidJson};

/// List all authors
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    responses(
        (status = 200, description = "All authors, sorted by last then first name", body = Vec<AuthorResponse>)
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
) -> AppResult<Json<DataResponse<Vec<AuthorResponse>>>> {
    let authors = state.services.authors.list().await?;
    Ok(Json(DataResponse::list(authors)))
}

/// Get author by ID
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = String, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorResponse),
        (status = 400, description = "Malformed ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<AuthorResponse>>> {
    let id = parse_id(&id, Entity::Author)?;
    let author = state.services.authors.get(id).await?;
    Ok(Json(DataResponse::new(author)))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("googleOAuth" = [])),
    request_body = AuthorPayload,
    responses(
        (status = 201, description = "Author created", body = AuthorResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    ValidJson(payload): ValidJson<AuthorPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthorResponse>>)> {
    let author = state.services.authors.create(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(author))))
}

/// Update an author (only the submitted fields change)
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("googleOAuth" = [])),
    params(("id" = String, Path, description = "Author ID")),
    request_body = AuthorPayload,
    responses(
        (status = 200, description = "Author updated", body = AuthorResponse),
        (status = 400, description = "Malformed ID or validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<AuthorPayload>,
) -> AppResult<Json<DataResponse<AuthorResponse>>> {
    let id = parse_id(&id, Entity::Author)?;
    let author = state.services.authors.update(id, payload).await?;
    Ok(Json(DataResponse::new(author)))
}

/// Delete an author (refused while books still reference it)
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("googleOAuth" = [])),
    params(("id" = String, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author deleted", body = MessageResponse),
        (status = 400, description = "Malformed ID or author still has books", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, Entity::Author)?;
    let message = state.services.authors.delete(id).await?;
    Ok(Json(MessageResponse::new(message)))
}
