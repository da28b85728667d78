//! Books API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, Entity},
    models::{BookPayload, BookResponse, BookSummary},
};

use super::{parse_id, AuthenticatedUser, DataResponse, MessageResponse, ValidJson};

/// List all books with their author's name
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books in insertion order", body = Vec<BookSummary>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
) -> AppResult<Json<DataResponse<Vec<BookSummary>>>> {
    let books = state.services.books.list().await?;
    Ok(Json(DataResponse::list(books)))
}

/// Get book by ID, with its author
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 400, description = "Malformed ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<BookResponse>>> {
    let id = parse_id(&id, Entity::Book)?;
    let book = state.services.books.get(id).await?;
    Ok(Json(DataResponse::new(book)))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("googleOAuth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Validation failed or unknown author", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    ValidJson(payload): ValidJson<BookPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<BookResponse>>)> {
    let book = state.services.books.create(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(book))))
}

/// Update a book (only the submitted fields change)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("googleOAuth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Malformed ID, validation failed or unknown author", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<BookPayload>,
) -> AppResult<Json<DataResponse<BookResponse>>> {
    let id = parse_id(&id, Entity::Book)?;
    let book = state.services.books.update(id, payload).await?;
    Ok(Json(DataResponse::new(book)))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("googleOAuth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "Malformed ID", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, Entity::Book)?;
    let message = state.services.books.delete(id).await?;
    Ok(Json(MessageResponse::new(message)))
}
