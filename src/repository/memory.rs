//! In-process catalog store used by tests and the `memory` backend

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthorStore, BookStore};
use crate::{
    error::AppResult,
    models::{Author, AuthorDraft, Book, BookDraft},
};

/// Authors keyed by id, books kept in insertion order
#[derive(Default)]
pub struct MemoryCatalog {
    authors: RwLock<HashMap<Uuid, Author>>,
    books: RwLock<Vec<Book>>,
}

#[async_trait]
impl AuthorStore for MemoryCatalog {
    async fn find_all(&self) -> AppResult<Vec<Author>> {
        let mut authors: Vec<Author> = self.authors.read().await.values().cloned().collect();
        authors.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(authors)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        Ok(self.authors.read().await.get(&id).cloned())
    }

    async fn insert(&self, draft: &AuthorDraft) -> AppResult<Author> {
        let now = Utc::now();
        let author = Author {
            id: Uuid::new_v4(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            date_of_birth: draft.date_of_birth,
            date_of_death: draft.date_of_death,
            nationality: draft.nationality.clone(),
            biography: draft.biography.clone(),
            website: draft.website.clone(),
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        };
        self.authors.write().await.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update_by_id(&self, id: Uuid, draft: &AuthorDraft) -> AppResult<Option<Author>> {
        let mut authors = self.authors.write().await;
        let Some(author) = authors.get_mut(&id) else {
            return Ok(None);
        };
        author.first_name = draft.first_name.clone();
        author.last_name = draft.last_name.clone();
        author.date_of_birth = draft.date_of_birth;
        author.date_of_death = draft.date_of_death;
        author.nationality = draft.nationality.clone();
        author.biography = draft.biography.clone();
        author.website = draft.website.clone();
        author.is_active = draft.is_active;
        author.updated_at = Utc::now();
        Ok(Some(author.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.authors.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl BookStore for MemoryCatalog {
    async fn find_all(&self) -> AppResult<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.books.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn insert(&self, draft: &BookDraft) -> AppResult<Book> {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            author_id: draft.author_id,
            summary: draft.summary.clone(),
            isbn: draft.isbn.clone(),
            genre: draft.genre.clone(),
            published_year: draft.published_year,
            page_count: draft.page_count,
            created_at: now,
            updated_at: now,
        };
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn update_by_id(&self, id: Uuid, draft: &BookDraft) -> AppResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        book.title = draft.title.clone();
        book.author_id = draft.author_id;
        book.summary = draft.summary.clone();
        book.isbn = draft.isbn.clone();
        book.genre = draft.genre.clone();
        book.published_year = draft.published_year;
        book.page_count = draft.page_count;
        book.updated_at = Utc::now();
        Ok(Some(book.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() < before)
    }

    async fn count_by_author(&self, author_id: Uuid) -> AppResult<i64> {
        let count = self
            .books
            .read()
            .await
            .iter()
            .filter(|b| b.author_id == author_id)
            .count();
        Ok(count as i64)
    }
}
