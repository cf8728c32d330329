//! Loan model and related types

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookSummary;
use super::form::{FieldErrors, FormRules};
use super::patron::PatronSummary;

/// Days a book may be kept
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// Current calendar date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Due date for a loan starting on `loaned_on`
pub fn return_by_for(loaned_on: NaiveDate) -> NaiveDate {
    loaned_on + Duration::days(LOAN_PERIOD_DAYS)
}

/// Loan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub patron_id: i32,
    pub loaned_on: NaiveDate,
    pub return_by: NaiveDate,
    /// `None` while the book is checked out
    pub returned_on: Option<NaiveDate>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_on.is_none()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.return_by < today
    }
}

/// Loan to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub book_id: i32,
    pub patron_id: i32,
    pub loaned_on: NaiveDate,
    pub return_by: NaiveDate,
}

impl NewLoan {
    pub fn starting(book_id: i32, patron_id: i32, loaned_on: NaiveDate) -> Self {
        Self {
            book_id,
            patron_id,
            loaned_on,
            return_by: return_by_for(loaned_on),
        }
    }
}

/// Which loans a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanFilter {
    All,
    /// Not yet returned
    Active,
    /// Not yet returned and due before the given date
    Overdue(NaiveDate),
}

/// Loan with its book and patron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub patron_id: i32,
    pub loaned_on: NaiveDate,
    pub return_by: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub book: BookSummary,
    pub patron: PatronSummary,
}

impl LoanDetails {
    pub fn is_open(&self) -> bool {
        self.returned_on.is_none()
    }
}

/// Internal row structure for joined loan queries
#[derive(Debug, Clone, FromRow)]
pub struct LoanDetailsRow {
    id: i32,
    book_id: i32,
    patron_id: i32,
    loaned_on: NaiveDate,
    return_by: NaiveDate,
    returned_on: Option<NaiveDate>,
    book_title: String,
    book_author: String,
    patron_first_name: String,
    patron_last_name: String,
    patron_library_id: String,
}

impl From<LoanDetailsRow> for LoanDetails {
    fn from(row: LoanDetailsRow) -> Self {
        LoanDetails {
            id: row.id,
            book_id: row.book_id,
            patron_id: row.patron_id,
            loaned_on: row.loaned_on,
            return_by: row.return_by,
            returned_on: row.returned_on,
            book: BookSummary {
                id: row.book_id,
                title: row.book_title,
                author: row.book_author,
            },
            patron: PatronSummary {
                id: row.patron_id,
                first_name: row.patron_first_name,
                last_name: row.patron_last_name,
                library_id: row.patron_library_id,
            },
        }
    }
}

/// New loan form
///
/// Choices are kept as submitted text; [`LoanForm::normalized`] drops any
/// that is not a record id, so a bogus value reads as no choice at all.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoanForm {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[validate(required(message = "Please select a book to loan"))]
    pub book_id: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[validate(required(message = "Please select a patron for the loan"))]
    pub patron_id: Option<String>,
}

impl FormRules for LoanForm {
    const FIELDS: &'static [&'static str] = &["book_id", "patron_id"];
}

fn record_id(value: Option<String>) -> Option<String> {
    value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .map(|id| id.to_string())
}

impl LoanForm {
    pub fn new(book_id: i32, patron_id: i32) -> Self {
        Self {
            book_id: Some(book_id.to_string()),
            patron_id: Some(patron_id.to_string()),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            book_id: record_id(self.book_id),
            patron_id: record_id(self.patron_id),
        }
    }

    pub fn selected_book(&self) -> Option<i32> {
        self.book_id.as_deref().and_then(|id| id.parse().ok())
    }

    pub fn selected_patron(&self) -> Option<i32> {
        self.patron_id.as_deref().and_then(|id| id.parse().ok())
    }
}

/// Return form; a blank date means today
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnForm {
    /// `YYYY-MM-DD`
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub returned_on: Option<String>,
}

impl ReturnForm {
    /// Submitted return date, `None` when left blank
    pub fn returned_on(&self) -> Result<Option<NaiveDate>, FieldErrors> {
        match self.returned_on.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            None => Ok(None),
            Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    FieldErrors::single("returned_on", "Returned on must be a valid date (YYYY-MM-DD)")
                }),
        }
    }
}
