//! Per-field format rules for imported contacts.
//!
//! Import rules are independent per record. The profile-edit rules at the
//! bottom of this file belong to a different workflow and stay separate.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{CanonicalField, ErrorCategory, Record, ValidationError};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s'-]{2,50}$").expect("name pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| {
        // Explicit ASCII classes: `\w` and `(?i)` both admit non-ASCII letters
        Regex::new(r"^[A-Za-z0-9_.-]+@[A-Za-z0-9_-]+\.[A-Za-z]{2,}$").expect("email pattern")
    });
static WORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]{2,100}$").expect("words pattern"));
static PROFILE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").expect("profile name pattern"));

/// Why a single field failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub category: ErrorCategory,
    pub message: String,
}

impl FieldIssue {
    fn missing(field: CanonicalField) -> Self {
        Self {
            category: ErrorCategory::Missing,
            message: format!("{field} is required"),
        }
    }

    fn format(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Format,
            message: message.into(),
        }
    }
}

/// Check one field value against its import rule.
pub fn validate_field(field: CanonicalField, value: &str) -> Result<(), FieldIssue> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldIssue::missing(field));
    }

    match field {
        CanonicalField::Name => {
            if !value.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                return Err(FieldIssue::format("name must start with an uppercase letter"));
            }
            if !NAME_RE.is_match(value) {
                return Err(FieldIssue::format(
                    "name may contain only letters, spaces, apostrophes and hyphens (2-50 characters)",
                ));
            }
        }
        CanonicalField::Email => {
            if !EMAIL_RE.is_match(value) {
                return Err(FieldIssue::format("email is not a valid address"));
            }
        }
        CanonicalField::Phone => {
            let digits = strip_phone_formatting(value);
            if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(FieldIssue::format("phone must be exactly 10 digits"));
            }
        }
        CanonicalField::Course | CanonicalField::Place => {
            if !WORDS_RE.is_match(value) {
                return Err(FieldIssue::format(format!(
                    "{field} may contain only letters and spaces (2-100 characters)"
                )));
            }
        }
    }
    Ok(())
}

fn strip_phone_formatting(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect()
}

/// Every field issue of one record, in canonical field order.
pub fn validate_record(record: &Record) -> Vec<ValidationError> {
    CanonicalField::ALL
        .iter()
        .filter_map(|&field| {
            validate_field(field, record.field(field)).err().map(|issue| ValidationError {
                provenance: record.provenance.clone(),
                field,
                category: issue.category,
                message: issue.message,
            })
        })
        .collect()
}

/// Canonical fields no header in the whole file resolved to.
pub fn missing_columns(resolved: &BTreeSet<CanonicalField>) -> Vec<CanonicalField> {
    CanonicalField::ALL
        .into_iter()
        .filter(|f| !resolved.contains(f))
        .collect()
}

// ---------------------------------------------------------------------------
// Profile edit
// ---------------------------------------------------------------------------

/// Account profile rules. Stricter than import: no apostrophes or hyphens.
pub struct ProfileRules;

impl ProfileRules {
    pub fn validate_name(name: &str) -> Result<(), String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("name is required".into());
        }
        if !PROFILE_NAME_RE.is_match(name) {
            return Err("name may contain only letters and spaces".into());
        }
        Ok(())
    }
}
