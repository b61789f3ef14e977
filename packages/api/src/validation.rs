//! Client-side field validation shared by registration and profile editing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::messages;

/// Age bounds accepted by every form.
pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 120;

pub const MIN_PASSWORD_LEN: usize = 6;

pub const NAME_LEN: (usize, usize) = (2, 50);
pub const SPECIALTY_LEN: (usize, usize) = (2, 100);

/// A form field that can carry a validation error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Password,
    Age,
    Specialty,
}

impl Field {
    /// Label shown next to the field.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Nombre completo",
            Field::Email => "Correo electrónico",
            Field::Password => "Contraseña",
            Field::Age => "Edad",
            Field::Specialty => "Especialidad",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A rejected field value and the message to show for it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: &'static str,
}

impl ValidationError {
    pub fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Validation errors keyed by field, at most one per field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, keeping the first one reported for its field.
    pub fn push(&mut self, error: ValidationError) {
        self.0.entry(error.field).or_insert(error.message);
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    /// Drop the error for `field`, as the user starts correcting it.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ValidationError> + '_ {
        self.0
            .iter()
            .map(|(field, message)| ValidationError::new(*field, message))
    }
}

impl FromIterator<ValidationError> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        let mut errors = Self::new();
        for error in iter {
            errors.push(error);
        }
        errors
    }
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|pattern| pattern.is_match(email))
}

/// Parse an age field. Only plain decimal integers within
/// [`MIN_AGE`]..=[`MAX_AGE`] are accepted; `"30abc"` and `"30.5"` are not.
pub fn parse_age(age: &str) -> Option<u32> {
    let age = age.trim();
    if age.is_empty() || !age.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    age.parse::<u32>()
        .ok()
        .filter(|n| (MIN_AGE..=MAX_AGE).contains(n))
}

pub(crate) fn check_age(age: &str) -> Result<(), ValidationError> {
    if age.trim().is_empty() {
        return Err(ValidationError::new(Field::Age, messages::AGE_REQUIRED));
    }
    if parse_age(age).is_none() {
        return Err(ValidationError::new(Field::Age, messages::AGE_INVALID));
    }
    Ok(())
}

/// Length-bounded required text field, counted in characters after trimming.
pub(crate) fn check_length(
    field: Field,
    value: &str,
    (min, max): (usize, usize),
    [required, too_short, too_long]: [&'static str; 3],
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        Err(ValidationError::new(field, required))
    } else if len < min {
        Err(ValidationError::new(field, too_short))
    } else if len > max {
        Err(ValidationError::new(field, too_long))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("ana@x"));
        assert!(!is_valid_email("ana x@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("ana@@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_age_bounds() {
        assert_eq!(parse_age("1"), Some(1));
        assert_eq!(parse_age(" 120 "), Some(120));
        assert_eq!(parse_age("0"), None);
        assert_eq!(parse_age("121"), None);
        assert_eq!(parse_age("-5"), None);
        assert_eq!(parse_age("30abc"), None);
        assert_eq!(parse_age("30.5"), None);
        assert_eq!(parse_age("treinta"), None);
    }

    #[test]
    fn test_check_age_distinguishes_missing_from_invalid() {
        assert_eq!(check_age("  ").unwrap_err().message, messages::AGE_REQUIRED);
        assert_eq!(check_age("200").unwrap_err().message, messages::AGE_INVALID);
        assert!(check_age("42").is_ok());
    }

    #[test]
    fn test_length_counts_characters() {
        let msgs = ["required", "short", "long"];
        assert_eq!(check_length(Field::Name, "Ñ", NAME_LEN, msgs).unwrap_err().message, "short");
        assert!(check_length(Field::Name, "Ñu", NAME_LEN, msgs).is_ok());
        assert_eq!(
            check_length(Field::Name, &"a".repeat(51), NAME_LEN, msgs).unwrap_err().message,
            "long"
        );
    }

    #[test]
    fn test_field_errors_keep_first_per_field() {
        let mut errors = FieldErrors::new();
        errors.push(ValidationError::new(Field::Age, "first"));
        errors.push(ValidationError::new(Field::Age, "second"));
        errors.push(ValidationError::new(Field::Name, "name"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Age), Some("first"));

        errors.clear(Field::Age);
        assert_eq!(errors.get(Field::Age), None);
        assert!(!errors.is_empty());
    }
}
