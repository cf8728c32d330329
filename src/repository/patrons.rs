//! Patrons repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{is_unique_violation, listing::Listing, PatronStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        form::FieldErrors,
        pagination::PageRequest,
        patron::{Patron, PatronForm},
    },
};

const COLUMNS: &str = "p.id, p.first_name, p.last_name, p.address, p.email, p.library_id, p.zip_code";

/// Unique constraint on patrons.library_id
const LIBRARY_ID_KEY: &str = "patrons_library_id_key";

/// Patron listing, searchable on names, email and card number
pub fn patron_listing() -> Listing {
    Listing::new(COLUMNS, "patrons p")
        .search_in(&["p.first_name", "p.last_name", "p.email", "p.library_id"])
        .order_by("p.last_name ASC, p.first_name ASC, p.id ASC")
}

fn map_write_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err, LIBRARY_ID_KEY) {
        AppError::Validation(FieldErrors::single("library_id", "Library ID must be unique"))
    } else {
        AppError::Database(err)
    }
}

#[derive(Clone)]
pub struct PatronsRepository {
    pool: Pool<Postgres>,
}

impl PatronsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatronStore for PatronsRepository {
    async fn list(&self, request: &PageRequest) -> AppResult<(Vec<Patron>, i64)> {
        let listing = patron_listing();

        let total: i64 = listing
            .count_query(request)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let patrons = listing
            .select_query(request)
            .build_query_as::<Patron>()
            .fetch_all(&self.pool)
            .await?;

        Ok((patrons, total))
    }

    async fn list_all(&self) -> AppResult<Vec<Patron>> {
        // Numeric card numbers in numeric order, anything else after them
        let patrons = sqlx::query_as::<_, Patron>(
            r#"
            SELECT * FROM patrons
            ORDER BY CASE WHEN library_id ~ '^[0-9]{1,18}$' THEN library_id::bigint END NULLS LAST,
                     library_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(patrons)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Patron> {
        sqlx::query_as::<_, Patron>("SELECT * FROM patrons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Patron {} not found", id)))
    }

    async fn max_library_id(&self) -> AppResult<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(library_id::bigint) FROM patrons WHERE library_id ~ '^[0-9]{1,18}$'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(max)
    }

    async fn create(&self, patron: &PatronForm) -> AppResult<Patron> {
        sqlx::query_as::<_, Patron>(
            r#"
            INSERT INTO patrons (first_name, last_name, address, email, library_id, zip_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&patron.first_name)
        .bind(&patron.last_name)
        .bind(&patron.address)
        .bind(&patron.email)
        .bind(&patron.library_id)
        .bind(&patron.zip_code)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update(&self, id: i32, patron: &PatronForm) -> AppResult<Patron> {
        sqlx::query_as::<_, Patron>(
            r#"
            UPDATE patrons
            SET first_name = $1, last_name = $2, address = $3,
                email = $4, library_id = $5, zip_code = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&patron.first_name)
        .bind(&patron.last_name)
        .bind(&patron.address)
        .bind(&patron.email)
        .bind(&patron.library_id)
        .bind(&patron.zip_code)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Patron {} not found", id)))
    }
}
