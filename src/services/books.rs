//! Book catalog service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm},
        form::check,
        pagination::{Page, PageRequest},
    },
    repository::BookStore,
};

#[derive(Clone)]
pub struct BooksService {
    books: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    /// Search books with pagination
    pub async fn list(&self, request: &PageRequest) -> AppResult<Page<Book>> {
        let (books, total) = self.books.list(request).await?;
        Ok(Page::new(books, total, request))
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    /// Create a book from a normalized form
    pub async fn create(&self, form: &BookForm) -> AppResult<Book> {
        check(form).map_err(AppError::Validation)?;
        let book = self.books.create(form).await?;
        tracing::info!(book_id = book.id, "Book created");
        Ok(book)
    }

    /// Update a book from a normalized form
    pub async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        self.books.get_by_id(id).await?;
        check(form).map_err(AppError::Validation)?;
        self.books.update(id, form).await
    }
}
