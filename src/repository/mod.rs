//! Repository layer for database operations
//!
//! Services depend on the store traits below; the Postgres repositories
//! implement them.

pub mod books;
pub mod listing;
pub mod loans;
pub mod patrons;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookForm},
        loan::{Loan, LoanDetails, LoanFilter, NewLoan},
        pagination::PageRequest,
        patron::{Patron, PatronForm},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// One page of books, with the total number of matches
    async fn list(&self, request: &PageRequest) -> AppResult<(Vec<Book>, i64)>;
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;
    async fn create(&self, book: &BookForm) -> AppResult<Book>;
    async fn update(&self, id: i32, book: &BookForm) -> AppResult<Book>;
    /// Books without an open loan, by title
    async fn list_available(&self) -> AppResult<Vec<Book>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatronStore: Send + Sync {
    async fn list(&self, request: &PageRequest) -> AppResult<(Vec<Patron>, i64)>;
    /// Every patron, by library card number
    async fn list_all(&self) -> AppResult<Vec<Patron>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Patron>;
    /// Highest numeric library card number in use
    async fn max_library_id(&self) -> AppResult<Option<i64>>;
    async fn create(&self, patron: &PatronForm) -> AppResult<Patron>;
    async fn update(&self, id: i32, patron: &PatronForm) -> AppResult<Patron>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn list(&self, filter: LoanFilter, request: &PageRequest) -> AppResult<(Vec<LoanDetails>, i64)>;
    /// Loan history of one patron, most recent first
    async fn list_for_patron(&self, patron_id: i32, request: &PageRequest) -> AppResult<(Vec<LoanDetails>, i64)>;
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>>;
    async fn get_details(&self, id: i32) -> AppResult<Option<LoanDetails>>;
    async fn find_open_by_book(&self, book_id: i32) -> AppResult<Option<Loan>>;
    async fn create(&self, loan: &NewLoan) -> AppResult<Loan>;
    /// Stamp `returned_on` on an open loan; returns the number of rows changed
    async fn close(&self, id: i32, returned_on: NaiveDate) -> AppResult<u64>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub patrons: patrons::PatronsRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            patrons: patrons::PatronsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Whether `err` violates the named unique constraint or index
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation() && e.constraint() == Some(constraint))
        .unwrap_or(false)
}

/// Whether `err` violates the named foreign key
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .map(|e| e.is_foreign_key_violation() && e.constraint() == Some(constraint))
        .unwrap_or(false)
}
