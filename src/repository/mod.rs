//! Repository layer for catalog persistence
//!
//! Services talk to the store through [`AuthorStore`] and [`BookStore`] so
//! the same pipeline runs against PostgreSQL in production and against the
//! in-memory catalog in tests and local development.

pub mod authors;
pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, AuthorDraft, Book, BookDraft},
};

/// Persistence for authors
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// All authors ordered by last name, then first name
    async fn find_all(&self) -> AppResult<Vec<Author>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>>;

    /// Insert with a fresh id and store-managed timestamps
    async fn insert(&self, draft: &AuthorDraft) -> AppResult<Author>;

    /// Replace every field of an existing author; `None` if the id is unknown
    async fn update_by_id(&self, id: Uuid, draft: &AuthorDraft) -> AppResult<Option<Author>>;

    /// Returns whether a record was removed
    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool>;
}

/// Persistence for books
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books in creation order
    async fn find_all(&self) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    async fn insert(&self, draft: &BookDraft) -> AppResult<Book>;

    async fn update_by_id(&self, id: Uuid, draft: &BookDraft) -> AppResult<Option<Book>>;

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool>;

    /// Number of books referencing `author_id`
    async fn count_by_author(&self, author_id: Uuid) -> AppResult<i64>;
}

/// Store handles shared by all services
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorStore>,
    pub books: Arc<dyn BookStore>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::PgAuthorStore::new(pool.clone())),
            books: Arc::new(books::PgBookStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        let catalog = Arc::new(memory::MemoryCatalog::default());
        Self {
            authors: catalog.clone(),
            books: catalog,
            pool: None,
        }
    }

    /// Check that the backing database answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Foreign-key violations surface as referential errors instead of server errors
pub(crate) fn map_fk_violation(err: sqlx::Error, message: &str) -> crate::error::AppError {
    let is_fk = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23503")
        .unwrap_or(false);
    if is_fk {
        crate::error::AppError::Referential(message.to_string())
    } else {
        crate::error::AppError::Database(err)
    }
}
