//! Book model and form

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::form::{non_blank, submitted_or, trimmed, FormRules};

/// Book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    /// Year of first publication
    pub first_published: Option<i32>,
}

/// Short book representation embedded in loans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
}

/// New/update book form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    pub genre: Option<String>,
    /// Kept as text; anything that is not a whole number is dropped
    #[serde(default)]
    pub first_published: Option<String>,
}

impl FormRules for BookForm {
    const FIELDS: &'static [&'static str] = &["title", "author", "genre", "first_published"];
}

impl BookForm {
    /// Trim every field and canonicalize optional ones
    pub fn normalized(self) -> Self {
        Self {
            title: trimmed(&self.title),
            author: trimmed(&self.author),
            genre: non_blank(self.genre),
            first_published: non_blank(self.first_published)
                .and_then(|year| year.parse::<i32>().ok())
                .map(|year| year.to_string()),
        }
    }

    pub fn first_published_year(&self) -> Option<i32> {
        self.first_published.as_deref().and_then(|y| y.parse().ok())
    }

    /// Form state to show after a failed update
    pub fn merged_over(self, persisted: &Book) -> Self {
        Self {
            title: submitted_or(self.title, &persisted.title),
            author: submitted_or(self.author, &persisted.author),
            genre: self.genre.or_else(|| persisted.genre.clone()),
            first_published: self
                .first_published
                .or_else(|| persisted.first_published.map(|y| y.to_string())),
        }
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            first_published: book.first_published.map(|y| y.to_string()),
        }
    }
}
