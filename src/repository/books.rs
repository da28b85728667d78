//! PostgreSQL book store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{map_fk_violation, BookStore};
use crate::{
    error::AppResult,
    models::{Book, BookDraft},
};

const MISSING_AUTHOR: &str = "The specified Author does not exist.";

#[derive(Clone)]
pub struct PgBookStore {
    pool: Pool<Postgres>,
}

impl PgBookStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn find_all(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, draft: &BookDraft) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author_id, summary, isbn, genre, published_year, page_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(draft.author_id)
        .bind(&draft.summary)
        .bind(&draft.isbn)
        .bind(&draft.genre)
        .bind(draft.published_year)
        .bind(draft.page_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_fk_violation(e, MISSING_AUTHOR))
    }

    async fn update_by_id(&self, id: Uuid, draft: &BookDraft) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, summary = $4, isbn = $5, genre = $6,
                published_year = $7, page_count = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(draft.author_id)
        .bind(&draft.summary)
        .bind(&draft.isbn)
        .bind(&draft.genre)
        .bind(draft.published_year)
        .bind(draft.page_count)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_fk_violation(e, MISSING_AUTHOR))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_author(&self, author_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
