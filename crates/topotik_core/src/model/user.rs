//! User identity records.
//!
//! # Invariants
//! - `email` is stored trimmed and lowercase; it is unique across users.
//! - Password material never appears on `User`; only repositories see the hash.

use super::{normalize_required, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub type UserId = Uuid;

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    pub fn new(username: &str, email: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            username: normalize_required("username", username)?,
            email: normalize_email(email)?,
        })
    }
}

/// Normalizes an email to its lookup form.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let normalized = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(ValidationError::InvalidEmail(email.trim().to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, NewUser};
    use crate::model::ValidationError;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Ann@Example.ORG ").unwrap(),
            "ann@example.org"
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for value in ["", "no-at-sign", "a@b", "two@@example.org", "sp ace@x.io"] {
            assert!(
                matches!(normalize_email(value), Err(ValidationError::InvalidEmail(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn blank_username_is_rejected() {
        let err = NewUser::new("  ", "a@example.org").unwrap_err();
        assert_eq!(err, ValidationError::EmptyField("username"));
    }
}
