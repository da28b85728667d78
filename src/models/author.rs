//! Author model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    validation::{self, check_date, check_required, check_web_url, Checked, FieldError},
};

/// Full author record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    /// Display name, e.g. "J.R.R. Tolkien"
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn url(&self) -> String {
        format!("/authors/{}", self.id)
    }
}

/// Validated author fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorDraft {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
}

/// Create or update author request.
///
/// Every field is optional at the wire level so that a single submission can
/// report all of its problems at once; required fields are enforced by
/// [`Checked::extra_checks`]. `isActive` is kept as raw JSON so a value of
/// the wrong type becomes a field violation rather than a parse failure.
/// In an update an empty string clears an optional field.
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorPayload {
    #[validate(length(max = 100, message = "First name must be less than 100 chars."))]
    #[schema(example = "J.R.R.")]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must be less than 100 chars."))]
    #[schema(example = "Tolkien")]
    pub last_name: Option<String>,
    /// ISO 8601 date
    #[schema(example = "1892-01-03")]
    pub date_of_birth: Option<String>,
    /// ISO 8601 date
    pub date_of_death: Option<String>,
    #[validate(length(max = 100, message = "Nationality must be at most 100 characters."))]
    pub nationality: Option<String>,
    #[validate(length(max = 1000, message = "Biography must be at most 1000 characters."))]
    pub biography: Option<String>,
    /// Absolute `http` or `https` URL
    #[validate(length(max = 200, message = "Website must be at most 200 characters."))]
    pub website: Option<String>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl Checked for AuthorPayload {
    const FIELDS: &'static [&'static str] = &[
        "firstName",
        "lastName",
        "dateOfBirth",
        "dateOfDeath",
        "nationality",
        "biography",
        "website",
        "isActive",
    ];

    fn extra_checks(&self, require_all: bool, _current_year: i32, out: &mut Vec<FieldError>) {
        let first_name = self.first_name.as_deref();
        let last_name = self.last_name.as_deref();
        check_required("firstName", first_name, require_all, "First name is required.", out);
        check_required("lastName", last_name, require_all, "Last name is required.", out);
        check_date("dateOfBirth", self.date_of_birth.as_deref(), out);
        check_date("dateOfDeath", self.date_of_death.as_deref(), out);
        check_web_url("website", self.website.as_deref(), out);
        let is_active = self.is_active.as_ref().filter(|v| !validation::is_blank(v));
        if is_active.is_some_and(|v| validation::boolean(v).is_none()) {
            out.push(FieldError::new("isActive", "Must be a boolean."));
        }
    }
}

impl AuthorPayload {
    /// Trim every string and escape the free-text ones
    pub fn sanitize(self) -> Self {
        Self {
            first_name: validation::escaped(self.first_name),
            last_name: validation::escaped(self.last_name),
            date_of_birth: validation::trimmed(self.date_of_birth),
            date_of_death: validation::trimmed(self.date_of_death),
            nationality: validation::escaped(self.nationality),
            biography: validation::escaped(self.biography),
            website: validation::trimmed(self.website),
            is_active: self.is_active,
        }
    }

    /// Fill the fields this patch leaves out from the stored record
    pub fn merged_onto(self, existing: &Author) -> Self {
        let date = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        Self {
            first_name: self.first_name.or_else(|| Some(existing.first_name.clone())),
            last_name: self.last_name.or_else(|| Some(existing.last_name.clone())),
            date_of_birth: self.date_of_birth.or_else(|| date(existing.date_of_birth)),
            date_of_death: self.date_of_death.or_else(|| date(existing.date_of_death)),
            nationality: self.nationality.or_else(|| existing.nationality.clone()),
            biography: self.biography.or_else(|| existing.biography.clone()),
            website: self.website.or_else(|| existing.website.clone()),
            is_active: self.is_active.or(Some(Value::Bool(existing.is_active))),
        }
    }

    /// Check a complete record and convert it into typed fields
    pub fn into_draft(self) -> AppResult<AuthorDraft> {
        validation::check(&self, true)?;

        let (Some(first_name), Some(last_name)) = (self.first_name, self.last_name) else {
            return Err(AppError::Internal("author names missing after validation".to_string()));
        };

        Ok(AuthorDraft {
            first_name,
            last_name,
            date_of_birth: self.date_of_birth.as_deref().and_then(validation::parse_date),
            date_of_death: self.date_of_death.as_deref().and_then(validation::parse_date),
            nationality: validation::non_blank(self.nationality),
            biography: validation::non_blank(self.biography),
            website: validation::non_blank(self.website),
            is_active: self.is_active.as_ref().and_then(validation::boolean).unwrap_or(true),
        })
    }
}

/// Author as returned by the API, with derived fields
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// First and last name joined
    pub name: String,
    /// Canonical resource path
    pub url: String,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        let name = author.name();
        let url = author.url();
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
            nationality: author.nationality,
            biography: author.biography,
            website: author.website,
            is_active: author.is_active,
            created_at: author.created_at,
            updated_at: author.updated_at,
            name,
            url,
        }
    }
}

/// Compact author reference carried by book list entries
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorName {
    pub id: Uuid,
    pub name: String,
}

impl From<&Author> for AuthorName {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(first: &str, last: &str) -> AuthorPayload {
        AuthorPayload {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            ..AuthorPayload::default()
        }
    }

    fn stored() -> Author {
        let now = Utc::now();
        Author {
            id: Uuid::new_v4(),
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1929, 10, 21),
            date_of_death: None,
            nationality: Some("American".to_string()),
            biography: None,
            website: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_valid_author_becomes_draft() {
        let mut p = payload("  J.R.R. ", "Tolkien");
        p.date_of_birth = Some("1892-01-03".to_string());
        p.website = Some("https://www.tolkienestate.com".to_string());

        let draft = p.sanitize().into_draft().unwrap();
        assert_eq!(draft.first_name, "J.R.R.");
        assert_eq!(draft.date_of_birth, NaiveDate::from_ymd_opt(1892, 1, 3));
        assert!(draft.is_active);
    }

    #[test]
    fn test_missing_names_are_both_reported() {
        let errors = validation::violations(&AuthorPayload::default().sanitize(), true, 2024);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["firstName", "lastName"]);
        assert_eq!(errors[0].message, "First name is required.");
    }

    #[test]
    fn test_independent_violations_are_aggregated() {
        let mut p = payload("Mary", &"x".repeat(101));
        p.website = Some("not a url".to_string());
        p.date_of_death = Some("yesterday".to_string());

        let errors = validation::violations(&p.sanitize(), true, 2024);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["lastName", "dateOfDeath", "website"]);
    }

    #[test]
    fn test_unsafe_website_schemes_are_rejected() {
        let mut p = payload("Mary", "Shelley");
        p.website = Some("javascript:alert(document.cookie)".to_string());
        let errors = validation::violations(&p.sanitize(), true, 2024);
        assert_eq!(errors, vec![FieldError::new("website", "Must be a valid URL.")]);
    }

    #[test]
    fn test_wrongly_typed_flag_is_a_field_violation() {
        let p: AuthorPayload = serde_json::from_value(serde_json::json!({
            "firstName": "Mary",
            "lastName": "Shelley",
            "isActive": "sometimes"
        }))
        .unwrap();
        let errors = validation::violations(&p.sanitize(), true, 2024);
        assert_eq!(errors, vec![FieldError::new("isActive", "Must be a boolean.")]);
    }

    #[test]
    fn test_blank_required_name_is_rejected_in_patch() {
        let patch = AuthorPayload {
            first_name: Some("   ".to_string()),
            ..AuthorPayload::default()
        };
        let errors = validation::violations(&patch.sanitize(), false, 2024);
        assert_eq!(errors, vec![FieldError::new("firstName", "First name is required.")]);
    }

    #[test]
    fn test_blank_optional_field_clears_stored_value() {
        let patch = AuthorPayload {
            nationality: Some(" ".to_string()),
            date_of_birth: Some(String::new()),
            ..AuthorPayload::default()
        }
        .sanitize();
        assert!(validation::violations(&patch, false, 2024).is_empty());

        let draft = patch.merged_onto(&stored()).into_draft().unwrap();
        assert_eq!(draft.nationality, None);
        assert_eq!(draft.date_of_birth, None);
        assert_eq!(draft.first_name, "Ursula");
    }

    #[test]
    fn test_patch_skips_required_checks() {
        let patch = AuthorPayload {
            nationality: Some("British".to_string()),
            ..AuthorPayload::default()
        };
        assert!(validation::violations(&patch, false, 2024).is_empty());
    }

    #[test]
    fn test_sanitize_escapes_free_text() {
        let mut p = payload("<script>", "O'Neil");
        p.biography = Some("  Wrote \"stuff\"  ".to_string());
        let p = p.sanitize();
        assert_eq!(p.first_name.as_deref(), Some("&lt;script&gt;"));
        assert_eq!(p.last_name.as_deref(), Some("O&#x27;Neil"));
        assert_eq!(p.biography.as_deref(), Some("Wrote &quot;stuff&quot;"));
    }

    #[test]
    fn test_merge_keeps_stored_fields() {
        let existing = stored();
        let patch = AuthorPayload {
            biography: Some("Earthsea".to_string()),
            ..AuthorPayload::default()
        };
        let draft = patch.merged_onto(&existing).into_draft().unwrap();
        assert_eq!(draft.first_name, "Ursula");
        assert_eq!(draft.date_of_birth, existing.date_of_birth);
        assert_eq!(draft.nationality.as_deref(), Some("American"));
        assert_eq!(draft.biography.as_deref(), Some("Earthsea"));
    }

    #[test]
    fn test_response_derives_name_and_url() {
        let author = stored();
        let id = author.id;
        let response = AuthorResponse::from(author);
        assert_eq!(response.name, "Ursula Le Guin");
        assert_eq!(response.url, format!("/authors/{}", id));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["dateOfBirth"], "1929-10-21");
        assert_eq!(json["isActive"], true);
    }
}
