//! Book catalog service

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, Entity},
    models::{
        author::AuthorName, Author, AuthorResponse, Book, BookPayload, BookResponse, BookSummary,
    },
    repository::{AuthorStore, BookStore},
    validation,
};

const MISSING_AUTHOR: &str = "The specified Author does not exist.";

#[derive(Clone)]
pub struct BooksService {
    authors: Arc<dyn AuthorStore>,
    books: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(authors: Arc<dyn AuthorStore>, books: Arc<dyn BookStore>) -> Self {
        Self { authors, books }
    }

    /// All books, each carrying only its author's display name
    pub async fn list(&self) -> AppResult<Vec<BookSummary>> {
        let books = self.books.find_all().await?;
        let names: HashMap<Uuid, AuthorName> = self
            .authors
            .find_all()
            .await?
            .iter()
            .map(|a| (a.id, AuthorName::from(a)))
            .collect();

        Ok(books
            .into_iter()
            .map(|book| BookSummary {
                author: names.get(&book.author_id).cloned(),
                book,
            })
            .collect())
    }

    /// One book with its full author record
    pub async fn get(&self, id: Uuid) -> AppResult<BookResponse> {
        let book = self
            .books
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Book))?;
        self.with_author(book).await
    }

    pub async fn create(&self, payload: BookPayload) -> AppResult<BookResponse> {
        let draft = payload.sanitize().into_draft()?;
        let author = self.require_author(draft.author_id).await?;

        let book = self.books.insert(&draft).await?;
        tracing::info!(book_id = %book.id, author_id = %author.id, "Created book {}", book.title);

        Ok(BookResponse {
            book,
            author: Some(author.into()),
        })
    }

    /// Merge the submitted fields onto the stored book
    pub async fn update(&self, id: Uuid, payload: BookPayload) -> AppResult<BookResponse> {
        let patch = payload.sanitize();
        validation::check(&patch, false)?;

        if let Some(author_id) = patch.author_ref() {
            self.require_author(author_id).await?;
        }

        let existing = self
            .books
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Book))?;

        let draft = patch.merged_onto(&existing).into_draft()?;
        let book = self
            .books
            .update_by_id(id, &draft)
            .await?
            .ok_or(AppError::NotFound(Entity::Book))?;
        self.with_author(book).await
    }

    /// Delete a book; returns the confirmation message
    pub async fn delete(&self, id: Uuid) -> AppResult<String> {
        let book = self
            .books
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Book))?;

        if !self.books.delete_by_id(id).await? {
            return Err(AppError::NotFound(Entity::Book));
        }

        tracing::info!(book_id = %id, "Deleted book {}", book.title);
        Ok(format!("Book '{}' was deleted.", book.title))
    }

    async fn require_author(&self, author_id: Uuid) -> AppResult<Author> {
        self.authors
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| AppError::Referential(MISSING_AUTHOR.to_string()))
    }

    async fn with_author(&self, book: Book) -> AppResult<BookResponse> {
        let author = self
            .authors
            .find_by_id(book.author_id)
            .await?
            .map(AuthorResponse::from);
        Ok(BookResponse { book, author })
    }
}
