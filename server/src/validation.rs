//! Field validation executed before any mutation reaches the store.
//!
//! Every check records a [`ValidationIssue`] instead of returning early, so a
//! client gets the complete list of violated constraints in one response.

use email_address::EmailAddress;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 6;

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationIssue {
    /// Request field the issue belongs to, e.g. `ingredients[2].unit`
    pub field: String,
    /// Machine-readable constraint name
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("validation failed: {} issue(s)", issues.len())]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn single(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            issues: vec![ValidationIssue::new(field, code, message)],
        }
    }
}

/// Accumulates issues while a request is checked field by field.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, code: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, code, message));
    }

    /// Returns the value if present, recording a `required` issue otherwise.
    pub fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "required", format!("{field} is required"));
        }
        value
    }

    /// Trims the value and checks it is non-empty and within `max_chars`.
    pub fn text(&mut self, field: &str, value: &str, max_chars: Option<usize>) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "required", format!("{field} cannot be empty"));
            return None;
        }
        if let Some(max) = max_chars {
            if trimmed.chars().count() > max {
                self.push(
                    field,
                    "max_length",
                    format!("{field} cannot exceed {max} characters"),
                );
                return None;
            }
        }
        Some(trimmed.to_string())
    }

    /// Parses a whole number supplied as text, e.g. a query-string value.
    pub fn integer(&mut self, field: &str, value: &str) -> Option<i64> {
        match value.trim().parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.push(field, "integer", format!("{field} must be a whole number"));
                None
            }
        }
    }

    /// Checks an integer lies within `min..=i32::MAX`.
    pub fn at_least(&mut self, field: &str, value: i64, min: i64) -> Option<i32> {
        if value < min {
            self.push(field, "min", format!("{field} must be at least {min}"));
            return None;
        }
        match i32::try_from(value) {
            Ok(v) => Some(v),
            Err(_) => {
                self.push(field, "max", format!("{field} is too large"));
                None
            }
        }
    }

    /// Parses a closed enum value, listing the allowed values on failure.
    pub fn one_of<T>(&mut self, field: &str, value: &str, allowed: &[T]) -> Option<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                let allowed = allowed
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.push(
                    field,
                    "enum",
                    format!("{field} must be one of: {allowed}"),
                );
                None
            }
        }
    }

    pub fn url(&mut self, field: &str, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if is_valid_url(trimmed) {
            Some(trimmed.to_string())
        } else {
            self.push(field, "url", format!("{field} must be an absolute URL"));
            None
        }
    }

    pub fn email(&mut self, field: &str, value: &str) -> Option<String> {
        let normalized = value.trim().to_lowercase();
        if EmailAddress::is_valid(&normalized) {
            Some(normalized)
        } else {
            self.push(field, "email", format!("{field} must be a valid email address"));
            None
        }
    }

    pub fn password(&mut self, field: &str, value: &str) -> Option<String> {
        if value.chars().count() < PASSWORD_MIN_CHARS {
            self.push(
                field,
                "min_length",
                format!("{field} must be at least {PASSWORD_MIN_CHARS} characters"),
            );
            return None;
        }
        Some(value.to_string())
    }

    /// Ends validation: `Ok(value)` when no issue was recorded.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.issues.is_empty() {
            Ok(value())
        } else {
            Err(ValidationError {
                issues: self.issues,
            })
        }
    }
}

/// Returns `true` if the value parses as an http(s) URL.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cuisine;

    #[test]
    fn test_collects_every_issue() {
        let mut v = Validator::new();
        v.required::<String>("title", None);
        v.text("description", "   ", None);
        v.at_least("servings", 0, 1);
        let err = v.finish(|| ()).unwrap_err();
        let fields: Vec<_> = err.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "description", "servings"]);
    }

    #[test]
    fn test_text_trims_and_counts_chars() {
        let mut v = Validator::new();
        assert_eq!(
            v.text("title", "  Pad Thai  ", Some(8)),
            Some("Pad Thai".to_string())
        );
        // Multi-byte characters count once each
        assert_eq!(v.text("title", "crème", Some(5)), Some("crème".to_string()));
        assert!(v.text("title", "123456789", Some(8)).is_none());
        assert_eq!(v.finish(|| ()).unwrap_err().issues[0].code, "max_length");
    }

    #[test]
    fn test_one_of_lists_allowed_values() {
        let mut v = Validator::new();
        assert_eq!(
            v.one_of("cuisine", "Thai", Cuisine::ALL),
            Some(Cuisine::Thai)
        );
        assert!(v.one_of("cuisine", "Martian", Cuisine::ALL).is_none());
        let err = v.finish(|| ()).unwrap_err();
        assert!(err.issues[0].message.contains("Italian, Chinese"));
    }

    #[test]
    fn test_email_and_url() {
        let mut v = Validator::new();
        assert_eq!(
            v.email("email", " Cook@Example.com "),
            Some("cook@example.com".to_string())
        );
        assert!(v.email("email", "not-an-email").is_none());
        assert!(v.url("image", "https://img.example.com/a.png").is_some());
        assert!(v.url("image", "ftp://example.com/a.png").is_none());
        assert!(v.url("image", "a.png").is_none());
        assert_eq!(v.finish(|| ()).unwrap_err().issues.len(), 3);
    }

    #[test]
    fn test_at_least_rejects_overflow() {
        let mut v = Validator::new();
        assert_eq!(v.at_least("prepTime", 0, 0), Some(0));
        assert!(v.at_least("prepTime", i64::from(i32::MAX) + 1, 0).is_none());
        assert!(v.finish(|| ()).is_err());
    }
}
