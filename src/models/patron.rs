//! Patron model and form

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::form::{non_blank, submitted_or, trimmed, validate_numeric, FormRules};

/// Patron record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Patron {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub email: String,
    /// Library card number, assigned by the server
    pub library_id: String,
    pub zip_code: Option<String>,
}

/// Short patron representation embedded in loans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatronSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub library_id: String,
}

/// New/update patron form
///
/// `library_id` is overwritten on creation; on update it is editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PatronForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "First Name is required"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Last Name is required"))]
    pub last_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Please enter a valid email address")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Library ID is required"))]
    pub library_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_numeric"))]
    pub zip_code: Option<String>,
}

impl FormRules for PatronForm {
    const FIELDS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "address",
        "email",
        "library_id",
        "zip_code",
    ];
}

impl PatronForm {
    /// Trim every field and map blank optional ones to `None`
    pub fn normalized(self) -> Self {
        Self {
            first_name: trimmed(&self.first_name),
            last_name: trimmed(&self.last_name),
            address: non_blank(self.address),
            email: trimmed(&self.email),
            library_id: trimmed(&self.library_id),
            zip_code: non_blank(self.zip_code),
        }
    }

    /// Form state to show after a failed update
    pub fn merged_over(self, persisted: &Patron) -> Self {
        Self {
            first_name: submitted_or(self.first_name, &persisted.first_name),
            last_name: submitted_or(self.last_name, &persisted.last_name),
            address: self.address.or_else(|| persisted.address.clone()),
            email: submitted_or(self.email, &persisted.email),
            library_id: submitted_or(self.library_id, &persisted.library_id),
            zip_code: self.zip_code.or_else(|| persisted.zip_code.clone()),
        }
    }
}

impl From<&Patron> for PatronForm {
    fn from(patron: &Patron) -> Self {
        Self {
            first_name: patron.first_name.clone(),
            last_name: patron.last_name.clone(),
            address: patron.address.clone(),
            email: patron.email.clone(),
            library_id: patron.library_id.clone(),
            zip_code: patron.zip_code.clone(),
        }
    }
}

/// Card number following the highest numeric one in use
pub fn next_library_id(current_max: Option<i64>) -> String {
    (current_max.unwrap_or(0).max(0) + 1).to_string()
}
