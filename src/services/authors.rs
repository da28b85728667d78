//! Author catalog service

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, Entity},
    models::{AuthorPayload, AuthorResponse},
    repository::{AuthorStore, BookStore},
    validation,
};

#[derive(Clone)]
pub struct AuthorsService {
    authors: Arc<dyn AuthorStore>,
    books: Arc<dyn BookStore>,
}

impl AuthorsService {
    pub fn new(authors: Arc<dyn AuthorStore>, books: Arc<dyn BookStore>) -> Self {
        Self { authors, books }
    }

    /// All authors sorted by last name
    pub async fn list(&self) -> AppResult<Vec<AuthorResponse>> {
        let authors = self.authors.find_all().await?;
        Ok(authors.into_iter().map(AuthorResponse::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<AuthorResponse> {
        self.authors
            .find_by_id(id)
            .await?
            .map(AuthorResponse::from)
            .ok_or(AppError::NotFound(Entity::Author))
    }

    pub async fn create(&self, payload: AuthorPayload) -> AppResult<AuthorResponse> {
        let draft = payload.sanitize().into_draft()?;
        let author = self.authors.insert(&draft).await?;
        tracing::info!(author_id = %author.id, "Created author {}", author.name());
        Ok(author.into())
    }

    /// Merge the submitted fields onto the stored author
    pub async fn update(&self, id: Uuid, payload: AuthorPayload) -> AppResult<AuthorResponse> {
        let patch = payload.sanitize();
        validation::check(&patch, false)?;

        let existing = self
            .authors
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Author))?;

        let draft = patch.merged_onto(&existing).into_draft()?;
        let author = self
            .authors
            .update_by_id(id, &draft)
            .await?
            .ok_or(AppError::NotFound(Entity::Author))?;
        Ok(author.into())
    }

    /// Delete an author nobody references; returns the confirmation message
    pub async fn delete(&self, id: Uuid) -> AppResult<String> {
        let author = self
            .authors
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Author))?;

        if self.books.count_by_author(id).await? > 0 {
            return Err(AppError::Referential(
                "This author has books and cannot be deleted. Delete their books first."
                    .to_string(),
            ));
        }

        if !self.authors.delete_by_id(id).await? {
            return Err(AppError::NotFound(Entity::Author));
        }

        tracing::info!(author_id = %id, "Deleted author {}", author.name());
        Ok(format!("Author '{}' was deleted.", author.name()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::{
        models::Author,
        repository::{MockAuthorStore, MockBookStore},
    };

    fn tolkien(id: Uuid) -> Author {
        let now = Utc::now();
        Author {
            id,
            first_name: "J.R.R.".to_string(),
            last_name: "Tolkien".to_string(),
            date_of_birth: None,
            date_of_death: None,
            nationality: None,
            biography: None,
            website: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(authors: MockAuthorStore, books: MockBookStore) -> AuthorsService {
        AuthorsService::new(Arc::new(authors), Arc::new(books))
    }

    #[tokio::test]
    async fn test_delete_refused_while_books_reference_author() {
        let id = Uuid::new_v4();
        let mut authors = MockAuthorStore::new();
        authors
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |id| Ok(Some(tolkien(id))));
        authors.expect_delete_by_id().never();

        let mut books = MockBookStore::new();
        books.expect_count_by_author().with(eq(id)).returning(|_| Ok(2));

        let result = service(authors, books).delete(id).await;
        assert!(matches!(result, Err(AppError::Referential(_))));
    }

    #[tokio::test]
    async fn test_delete_without_books_names_author() {
        let id = Uuid::new_v4();
        let mut authors = MockAuthorStore::new();
        authors
            .expect_find_by_id()
            .returning(move |id| Ok(Some(tolkien(id))));
        authors.expect_delete_by_id().times(1).returning(|_| Ok(true));

        let mut books = MockBookStore::new();
        books.expect_count_by_author().returning(|_| Ok(0));

        let message = assert_ok!(service(authors, books).delete(id).await);
        assert_eq!(message, "Author 'J.R.R. Tolkien' was deleted.");
    }

    #[tokio::test]
    async fn test_invalid_create_never_reaches_store() {
        let mut authors = MockAuthorStore::new();
        authors.expect_insert().never();

        let payload = AuthorPayload {
            website: Some("nope".to_string()),
            ..AuthorPayload::default()
        };
        let err = assert_err!(service(authors, MockBookStore::new()).create(payload).await);
        match err {
            AppError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_unknown_author_is_not_found() {
        let mut authors = MockAuthorStore::new();
        authors.expect_find_by_id().returning(|_| Ok(None));
        authors.expect_update_by_id().never();

        let result = service(authors, MockBookStore::new())
            .update(Uuid::new_v4(), AuthorPayload::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(Entity::Author))));
    }
}
