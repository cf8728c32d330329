//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{listing::Listing, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm},
        pagination::PageRequest,
    },
};

const COLUMNS: &str = "b.id, b.title, b.author, b.genre, b.first_published";

/// Book listing, searchable on title, author and genre
pub fn book_listing() -> Listing {
    Listing::new(COLUMNS, "books b")
        .search_in(&["b.title", "b.author", "b.genre"])
        .order_by("b.title ASC, b.id ASC")
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self, request: &PageRequest) -> AppResult<(Vec<Book>, i64)> {
        let listing = book_listing();

        let total: i64 = listing
            .count_query(request)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let books = listing
            .select_query(request)
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn create(&self, book: &BookForm) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, genre, first_published)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.first_published_year())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, book: &BookForm) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, genre = $3, first_published = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.first_published_year())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn list_available(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.* FROM books b
            WHERE NOT EXISTS (
                SELECT 1 FROM loans l
                WHERE l.book_id = b.id AND l.returned_on IS NULL
            )
            ORDER BY b.title, b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
