//! Field-level validation and sanitization shared by catalog payloads
//!
//! Payload types declare their rules with `validator` derives. The helpers
//! here sanitize incoming strings, run the declared rules plus the format
//! checks derive cannot express, and flatten everything into an ordered
//! list of [`FieldError`]s.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, AppResult};

/// Earliest accepted publication year
pub const MIN_PUBLISHED_YEAR: i32 = 1000;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// JSON name of the offending field (`genre[2]` for list elements)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Payloads that can be checked against their field rules
pub trait Checked: Validate {
    /// JSON field names in declaration order, used to order violations
    const FIELDS: &'static [&'static str];

    /// Format checks and required-field checks beyond the derived rules
    fn extra_checks(&self, require_all: bool, current_year: i32, out: &mut Vec<FieldError>);
}

/// Run every rule on `payload` and return all violations, ordered by field.
///
/// `require_all` is false for partial updates, where absent fields keep
/// their stored value.
pub fn violations<T: Checked>(payload: &T, require_all: bool, current_year: i32) -> Vec<FieldError> {
    let mut out = match payload.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => flatten(&errors),
    };
    payload.extra_checks(require_all, current_year, &mut out);

    out.sort_by_key(|e| field_rank(T::FIELDS, &e.field));
    out
}

/// Like [`violations`] but as a pipeline stage
pub fn check<T: Checked>(payload: &T, require_all: bool) -> AppResult<()> {
    let errors = violations(payload, require_all, current_year());
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

fn field_rank(fields: &[&str], field: &str) -> usize {
    let base = field.split('[').next().unwrap_or(field);
    fields.iter().position(|f| *f == base).unwrap_or(fields.len())
}

fn flatten(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, errs) in errors.field_errors() {
        let name = camel_case(&field.to_string());
        for err in errs.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid.", name));
            out.push(FieldError::new(name.clone(), message));
        }
    }
    out
}

/// `date_of_birth` -> `dateOfBirth`
fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape the characters that are significant in HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim a string field. A blank value stays `Some("")` so an update can
/// tell "cleared" apart from "left out".
pub fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Trim and HTML-escape a free-text field
pub fn escaped(value: Option<String>) -> Option<String> {
    trimmed(value).map(|v| escape_html(&v))
}

/// Drop a cleared field before it is stored
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse an ISO 8601 date, accepting either a plain date or a full timestamp
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Whole number from a JSON number or a numeric string
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A string value that trims to nothing
pub fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

/// Boolean from a JSON bool or its string spelling
pub fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Record a violation if `value` is present but not a date
pub fn check_date(field: &str, value: Option<&str>, out: &mut Vec<FieldError>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        if parse_date(v).is_none() {
            out.push(FieldError::new(field, "Must be a valid ISO 8601 date."));
        }
    }
}

/// Record a violation unless `value` is an absolute `http` or `https` URL
pub fn check_web_url(field: &str, value: Option<&str>, out: &mut Vec<FieldError>) {
    let Some(v) = value.filter(|v| !v.is_empty()) else {
        return;
    };
    let valid = Url::parse(v)
        .map(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map_or(false, |host| !host.is_empty())
        })
        .unwrap_or(false);
    if !valid {
        out.push(FieldError::new(field, "Must be a valid URL."));
    }
}

/// Record a violation if a required field is blank, or absent when
/// `require_all` is set
pub fn check_required(
    field: &str,
    value: Option<&str>,
    require_all: bool,
    message: &str,
    out: &mut Vec<FieldError>,
) {
    let missing = match value {
        None => require_all,
        Some(v) => v.trim().is_empty(),
    };
    if missing {
        out.push(FieldError::new(field, message));
    }
}
