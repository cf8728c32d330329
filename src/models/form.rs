//! Form input handling shared by every entity
//!
//! Each form type declares its rules with `validator` attributes and lists its
//! fields in display order; [`check`] turns violations into one message per
//! broken rule, ordered by field.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

/// Messages per field, in field declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// All messages, flattened
    pub fn messages(&self) -> Vec<String> {
        self.0.values().flatten().cloned().collect()
    }

    /// Collect `validator` output, reporting `fields` first and in that order
    pub fn from_validation(errors: &ValidationErrors, fields: &[&str]) -> Self {
        let by_field = errors.field_errors();
        let mut result = Self::new();

        for field in fields {
            if let Some(list) = by_field.get(*field) {
                for error in list.iter() {
                    result.add(field, message_for(field, error));
                }
            }
        }

        let mut rest: Vec<(&str, &Vec<ValidationError>)> = by_field
            .iter()
            .map(|(name, list)| (&**name, *list))
            .filter(|(name, _)| !fields.contains(name))
            .collect();
        rest.sort_by_key(|(name, _)| *name);
        for (name, list) in rest {
            for error in list.iter() {
                result.add(name, message_for(name, error));
            }
        }

        result
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

fn message_for(field: &str, error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("{} is invalid", field))
}

/// A submitted form with declarative per-field rules
pub trait FormRules: Validate {
    /// Field names in the order their messages are reported
    const FIELDS: &'static [&'static str];
}

/// Evaluate the rules of any form
pub fn check<T: FormRules>(form: &T) -> Result<(), FieldErrors> {
    form.validate()
        .map_err(|errors| FieldErrors::from_validation(&errors, T::FIELDS))
}

/// Trim a required text field
pub fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Trim an optional text field, mapping blank input to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Keep the submitted value unless it is blank
pub fn submitted_or(submitted: String, persisted: &str) -> String {
    if submitted.is_empty() {
        persisted.to_string()
    } else {
        submitted
    }
}

/// Rule: value consists of decimal digits only
pub fn validate_numeric(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("numeric");
        error.message = Some(Cow::Borrowed("Zip Code must be a number"));
        Err(error)
    }
}
