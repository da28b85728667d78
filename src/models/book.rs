//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::author::{AuthorName, AuthorResponse};
use crate::{
    error::{AppError, AppResult},
    validation::{self, check_required, Checked, FieldError, MIN_PUBLISHED_YEAR},
};

/// Full book record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub summary: Option<String>,
    pub isbn: Option<String>,
    pub genre: Vec<String>,
    pub published_year: Option<i32>,
    pub page_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated book fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author_id: Uuid,
    pub summary: Option<String>,
    pub isbn: Option<String>,
    pub genre: Vec<String>,
    pub published_year: Option<i32>,
    pub page_count: Option<i32>,
}

/// Create or update book request.
///
/// The list and numeric fields are kept as raw JSON so that a value of the
/// wrong type is reported against its own field instead of failing the
/// whole body.
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BookPayload {
    #[validate(length(max = 200, message = "Title must be less than 200 characters."))]
    #[schema(example = "The Hobbit")]
    pub title: Option<String>,
    /// Id of an existing author
    pub author_id: Option<String>,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters."))]
    pub summary: Option<String>,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters."))]
    #[schema(example = "978-0547928227")]
    pub isbn: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub genre: Option<Value>,
    /// Accepts a number or a numeric string
    #[schema(value_type = Option<i64>, example = 1937)]
    pub published_year: Option<Value>,
    #[schema(value_type = Option<i64>, example = 310)]
    pub page_count: Option<Value>,
}

impl Checked for BookPayload {
    const FIELDS: &'static [&'static str] = &[
        "title",
        "authorId",
        "summary",
        "isbn",
        "genre",
        "publishedYear",
        "pageCount",
    ];

    fn extra_checks(&self, require_all: bool, current_year: i32, out: &mut Vec<FieldError>) {
        check_required("title", self.title.as_deref(), require_all, "Title is required.", out);
        check_required(
            "authorId",
            self.author_id.as_deref(),
            require_all,
            "Author ID is required.",
            out,
        );
        if let Some(id) = self.author_id.as_deref().filter(|id| !id.is_empty()) {
            if Uuid::parse_str(id).is_err() {
                out.push(FieldError::new("authorId", "Must be a valid Author ID."));
            }
        }

        match &self.genre {
            None => {}
            Some(Value::Array(entries)) => {
                for (i, entry) in entries.iter().enumerate() {
                    let message = match entry {
                        Value::String(s) if s.is_empty() => "Genre entries must not be empty.",
                        Value::String(_) => continue,
                        _ => "Genre entries must be strings.",
                    };
                    out.push(FieldError::new(format!("genre[{}]", i), message));
                }
            }
            Some(_) => out.push(FieldError::new("genre", "Genre must be a list of strings.")),
        }

        if let Some(year) = self.published_year.as_ref().filter(|v| !validation::is_blank(v)) {
            let in_range = validation::integer(year).map_or(false, |y| {
                (MIN_PUBLISHED_YEAR as i64..=current_year as i64).contains(&y)
            });
            if !in_range {
                out.push(FieldError::new(
                    "publishedYear",
                    format!(
                        "Published year must be between {} and {}.",
                        MIN_PUBLISHED_YEAR, current_year
                    ),
                ));
            }
        }

        if let Some(pages) = self.page_count.as_ref().filter(|v| !validation::is_blank(v)) {
            let positive = validation::integer(pages)
                .map_or(false, |p| (1..=i32::MAX as i64).contains(&p));
            if !positive {
                out.push(FieldError::new("pageCount", "Page count must be a positive integer."));
            }
        }
    }
}

impl BookPayload {
    /// Trim every string and escape the free-text ones
    pub fn sanitize(self) -> Self {
        let genre = self.genre.map(|genre| match genre {
            Value::Array(entries) => Value::Array(
                entries
                    .into_iter()
                    .map(|entry| match entry {
                        Value::String(g) => Value::String(validation::escape_html(g.trim())),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        });
        Self {
            title: validation::escaped(self.title),
            author_id: validation::trimmed(self.author_id),
            summary: validation::escaped(self.summary),
            isbn: validation::escaped(self.isbn),
            genre,
            published_year: self.published_year,
            page_count: self.page_count,
        }
    }

    /// The new author reference this payload carries, if any and well-formed
    pub fn author_ref(&self) -> Option<Uuid> {
        self.author_id.as_deref().and_then(|id| Uuid::parse_str(id).ok())
    }

    /// Fill the fields this patch leaves out from the stored record
    pub fn merged_onto(self, existing: &Book) -> Self {
        Self {
            title: self.title.or_else(|| Some(existing.title.clone())),
            author_id: self.author_id.or_else(|| Some(existing.author_id.to_string())),
            summary: self.summary.or_else(|| existing.summary.clone()),
            isbn: self.isbn.or_else(|| existing.isbn.clone()),
            genre: self.genre.or_else(|| Some(Value::from(existing.genre.clone()))),
            published_year: self.published_year.or(existing.published_year.map(Value::from)),
            page_count: self.page_count.or(existing.page_count.map(Value::from)),
        }
    }

    /// Check a complete record and convert it into typed fields
    pub fn into_draft(self) -> AppResult<BookDraft> {
        validation::check(&self, true)?;

        let author_id = self.author_ref();
        let (Some(title), Some(author_id)) = (self.title, author_id) else {
            return Err(AppError::Internal("book fields missing after validation".to_string()));
        };

        let genre = match self.genre {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    Value::String(g) => Some(g),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let number = |value: Option<Value>| {
            value
                .as_ref()
                .and_then(validation::integer)
                .and_then(|n| i32::try_from(n).ok())
        };

        Ok(BookDraft {
            title,
            author_id,
            summary: validation::non_blank(self.summary),
            isbn: validation::non_blank(self.isbn),
            genre,
            published_year: number(self.published_year),
            page_count: number(self.page_count),
        })
    }
}

/// Single book with its author inlined
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<AuthorResponse>,
}

/// Book list entry carrying only its author's display name
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<AuthorName>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(title: &str, author_id: &str) -> BookPayload {
        BookPayload {
            title: Some(title.to_string()),
            author_id: Some(author_id.to_string()),
            ..BookPayload::default()
        }
    }

    fn stored() -> Book {
        let now = Utc::now();
        Book {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            author_id: Uuid::new_v4(),
            summary: Some("Spice".to_string()),
            isbn: None,
            genre: vec!["SF".to_string()],
            published_year: Some(1965),
            page_count: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_valid_book_becomes_draft() {
        let author = Uuid::new_v4();
        let mut p = payload("The Hobbit", &author.to_string());
        p.genre = Some(json!([" Fantasy ", "Adventure"]));
        p.published_year = Some(json!(1937));
        p.page_count = Some(json!(310));

        let draft = p.sanitize().into_draft().unwrap();
        assert_eq!(draft.author_id, author);
        assert_eq!(draft.genre, vec!["Fantasy", "Adventure"]);
        assert_eq!(draft.published_year, Some(1937));
        assert_eq!(draft.page_count, Some(310));
    }

    #[test]
    fn test_published_year_bounds() {
        let author = Uuid::new_v4().to_string();

        let mut p = payload("Old", &author);
        p.published_year = Some(json!(999));
        let errors = validation::violations(&p, true, 2024);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Published year must be between 1000 and 2024.");

        p.published_year = Some(json!(2025));
        assert_eq!(validation::violations(&p, true, 2024).len(), 1);

        p.published_year = Some(json!(2024));
        assert!(validation::violations(&p, true, 2024).is_empty());
    }

    #[test]
    fn test_malformed_author_id_and_page_count_both_reported() {
        let mut p = payload("Dune", "not-an-id");
        p.page_count = Some(json!(0));

        let errors = validation::violations(&p, true, 2024);
        assert_eq!(
            errors,
            vec![
                FieldError::new("authorId", "Must be a valid Author ID."),
                FieldError::new("pageCount", "Page count must be a positive integer."),
            ]
        );
    }

    #[test]
    fn test_wrongly_typed_values_are_reported_per_field() {
        let p: BookPayload = serde_json::from_value(json!({
            "title": "T",
            "authorId": "not-an-id",
            "genre": ["SF", 7],
            "publishedYear": "abc",
            "pageCount": 0
        }))
        .unwrap();

        let errors = validation::violations(&p.sanitize(), true, 2024);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["authorId", "genre[1]", "publishedYear", "pageCount"]);
        assert_eq!(errors[1].message, "Genre entries must be strings.");
    }

    #[test]
    fn test_genre_must_be_a_list() {
        let mut p = payload("Dune", &Uuid::new_v4().to_string());
        p.genre = Some(json!("SF"));
        let errors = validation::violations(&p, true, 2024);
        assert_eq!(errors, vec![FieldError::new("genre", "Genre must be a list of strings.")]);
    }

    #[test]
    fn test_blank_genre_entries_are_reported_per_element() {
        let mut p = payload("Dune", &Uuid::new_v4().to_string());
        p.genre = Some(json!(["SF", "   "]));

        let errors = validation::violations(&p.sanitize(), true, 2024);
        assert_eq!(errors, vec![FieldError::new("genre[1]", "Genre entries must not be empty.")]);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let p: BookPayload = serde_json::from_value(json!({
            "title": "Dune",
            "authorId": Uuid::new_v4().to_string(),
            "publishedYear": "1965",
            "pageCount": 412
        }))
        .unwrap();
        let draft = p.sanitize().into_draft().unwrap();
        assert_eq!(draft.published_year, Some(1965));
        assert_eq!(draft.page_count, Some(412));
    }

    #[test]
    fn test_merge_keeps_author_when_patch_omits_it() {
        let existing = stored();
        let patch = BookPayload {
            page_count: Some(json!(412)),
            ..BookPayload::default()
        };
        let draft = patch.merged_onto(&existing).into_draft().unwrap();
        assert_eq!(draft.author_id, existing.author_id);
        assert_eq!(draft.genre, existing.genre);
        assert_eq!(draft.published_year, Some(1965));
        assert_eq!(draft.page_count, Some(412));
    }

    #[test]
    fn test_blank_title_is_rejected_and_blank_summary_clears() {
        let patch = BookPayload {
            title: Some(" ".to_string()),
            ..BookPayload::default()
        };
        let errors = validation::violations(&patch.sanitize(), false, 2024);
        assert_eq!(errors, vec![FieldError::new("title", "Title is required.")]);

        let patch = BookPayload {
            summary: Some(String::new()),
            published_year: Some(json!("")),
            ..BookPayload::default()
        }
        .sanitize();
        let draft = patch.merged_onto(&stored()).into_draft().unwrap();
        assert_eq!(draft.summary, None);
        assert_eq!(draft.published_year, None);
    }
}
