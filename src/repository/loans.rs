//! Loans repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use super::{
    is_foreign_key_violation, is_unique_violation,
    listing::{Condition, Listing},
    LoanStore,
};
use crate::{
    error::{AppError, AppResult, Conflict},
    models::{
        loan::{Loan, LoanDetails, LoanDetailsRow, LoanFilter, NewLoan},
        pagination::PageRequest,
    },
};

const DETAILS_COLUMNS: &str = "l.id, l.book_id, l.patron_id, l.loaned_on, l.return_by, l.returned_on, \
     b.title AS book_title, b.author AS book_author, \
     p.first_name AS patron_first_name, p.last_name AS patron_last_name, \
     p.library_id AS patron_library_id";

const DETAILS_FROM: &str = "loans l \
     JOIN books b ON b.id = l.book_id \
     JOIN patrons p ON p.id = l.patron_id";

/// Partial unique index allowing one open loan per book
const OPEN_BOOK_INDEX: &str = "loans_open_book_idx";
const BOOK_FKEY: &str = "loans_book_id_fkey";
const PATRON_FKEY: &str = "loans_patron_id_fkey";

/// Loan listing joined to its book and patron
pub fn loan_listing(filter: LoanFilter) -> Listing {
    let listing = Listing::new(DETAILS_COLUMNS, DETAILS_FROM);
    match filter {
        LoanFilter::All => listing
            .search_in(&["b.title", "b.author", "p.first_name", "p.last_name"])
            .order_by("l.loaned_on DESC, l.id DESC"),
        LoanFilter::Active => listing
            .filter(Condition::Sql("l.returned_on IS NULL"))
            .order_by("l.loaned_on DESC, l.id DESC"),
        LoanFilter::Overdue(today) => listing
            .filter(Condition::Sql("l.returned_on IS NULL"))
            .filter(Condition::Before("l.return_by", today))
            .order_by("l.return_by ASC, l.id ASC"),
    }
}

fn map_insert_error(err: sqlx::Error, loan: &NewLoan) -> AppError {
    if is_unique_violation(&err, OPEN_BOOK_INDEX) {
        AppError::Conflict(Conflict::BookCheckedOut)
    } else if is_foreign_key_violation(&err, BOOK_FKEY) {
        AppError::NotFound(format!("Book {} not found", loan.book_id))
    } else if is_foreign_key_violation(&err, PATRON_FKEY) {
        AppError::NotFound(format!("Patron {} not found", loan.patron_id))
    } else {
        AppError::Database(err)
    }
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_page(&self, listing: Listing, request: &PageRequest) -> AppResult<(Vec<LoanDetails>, i64)> {
        let total: i64 = listing
            .count_query(request)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let rows = listing
            .select_query(request)
            .build_query_as::<LoanDetailsRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(LoanDetails::from).collect(), total))
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn list(&self, filter: LoanFilter, request: &PageRequest) -> AppResult<(Vec<LoanDetails>, i64)> {
        self.fetch_page(loan_listing(filter), request).await
    }

    async fn list_for_patron(&self, patron_id: i32, request: &PageRequest) -> AppResult<(Vec<LoanDetails>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE patron_id = $1")
            .bind(patron_id)
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {} FROM {} WHERE l.patron_id = $1 \
             ORDER BY l.loaned_on DESC, l.id DESC LIMIT $2 OFFSET $3",
            DETAILS_COLUMNS, DETAILS_FROM
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&query)
            .bind(patron_id)
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(LoanDetails::from).collect(), total))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    async fn get_details(&self, id: i32) -> AppResult<Option<LoanDetails>> {
        let query = format!("SELECT {} FROM {} WHERE l.id = $1", DETAILS_COLUMNS, DETAILS_FROM);
        let row = sqlx::query_as::<_, LoanDetailsRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LoanDetails::from))
    }

    async fn find_open_by_book(&self, book_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE book_id = $1 AND returned_on IS NULL LIMIT 1",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    async fn create(&self, loan: &NewLoan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, patron_id, loaned_on, return_by, returned_on)
            VALUES ($1, $2, $3, $4, NULL)
            RETURNING *
            "#,
        )
        .bind(loan.book_id)
        .bind(loan.patron_id)
        .bind(loan.loaned_on)
        .bind(loan.return_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, loan))
    }

    async fn close(&self, id: i32, returned_on: NaiveDate) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE loans SET returned_on = $1 WHERE id = $2 AND returned_on IS NULL",
        )
        .bind(returned_on)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
