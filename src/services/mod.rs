//! Business logic services

pub mod auth;
pub mod authors;
pub mod books;
pub mod oauth;
pub mod sessions;

use std::sync::Arc;

use crate::{config::SessionConfig, error::AppResult, repository::Repository};

use self::oauth::IdentityProvider;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub auth: auth::AuthService,
    repository: Repository,
}

impl Services {
    /// Create all services over the catalog stores and identity provider
    pub fn new(
        repository: Repository,
        provider: Arc<dyn IdentityProvider>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            authors: authors::AuthorsService::new(
                repository.authors.clone(),
                repository.books.clone(),
            ),
            books: books::BooksService::new(repository.authors.clone(), repository.books.clone()),
            auth: auth::AuthService::new(provider, session_config),
            repository,
        }
    }

    /// Readiness probe: the catalog store must answer
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
