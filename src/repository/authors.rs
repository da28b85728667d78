//! PostgreSQL author store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{map_fk_violation, AuthorStore};
use crate::{
    error::AppResult,
    models::{Author, AuthorDraft},
};

#[derive(Clone)]
pub struct PgAuthorStore {
    pool: Pool<Postgres>,
}

impl PgAuthorStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorStore for PgAuthorStore {
    async fn find_all(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY last_name ASC, first_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, draft: &AuthorDraft) -> AppResult<Author> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (id, first_name, last_name, date_of_birth, date_of_death,
                                 nationality, biography, website, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(draft.date_of_birth)
        .bind(draft.date_of_death)
        .bind(&draft.nationality)
        .bind(&draft.biography)
        .bind(&draft.website)
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, draft: &AuthorDraft) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $2, last_name = $3, date_of_birth = $4, date_of_death = $5,
                nationality = $6, biography = $7, website = $8, is_active = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(draft.date_of_birth)
        .bind(draft.date_of_death)
        .bind(&draft.nationality)
        .bind(&draft.biography)
        .bind(&draft.website)
        .bind(draft.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_fk_violation(
                    e,
                    "This author has books and cannot be deleted. Delete their books first.",
                )
            })?;
        Ok(result.rows_affected() > 0)
    }
}
