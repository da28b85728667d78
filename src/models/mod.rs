//! Data models for Libris

pub mod author;
pub mod book;
pub mod principal;

// Re-export commonly used types
pub use author::{Author, AuthorDraft, AuthorPayload, AuthorResponse};
pub use book::{Book, BookDraft, BookPayload, BookResponse, BookSummary};
pub use principal::{Principal, UserInfo};
