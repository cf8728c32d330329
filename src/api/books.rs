//! Book catalog pages

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm},
        pagination::{ListQuery, Page},
    },
    AppState,
};

use super::{rerender, FormView, RecordId};

/// List books with search and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of books", body = Page<Book>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Book>>> {
    let page = state.services.books.list(&query.to_request()).await?;
    Ok(Json(page))
}

/// Empty new book form
#[utoipa::path(
    get,
    path = "/books/new",
    tag = "books",
    responses(
        (status = 200, description = "New book form", body = FormView<BookForm>)
    )
)]
pub async fn new_book() -> Json<FormView<BookForm>> {
    Json(FormView::new(None, BookForm::default()))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books/new",
    tag = "books",
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Book created, redirect to the listing"),
        (status = 400, description = "Form re-rendered with errors", body = FormView<BookForm>)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    let form = form.normalized();
    match state.services.books.create(&form).await {
        Ok(_) => Ok(Redirect::to("/books").into_response()),
        Err(AppError::Validation(errors)) => Ok(rerender(
            StatusCode::BAD_REQUEST,
            FormView::new(None, form).with_errors(errors),
        )),
        Err(e) => Err(e),
    }
}

/// Edit form of a book
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book edit form", body = FormView<BookForm>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<FormView<BookForm>>> {
    let book = state.services.books.get(id).await?;
    Ok(Json(FormView::new(Some(id), BookForm::from(&book))))
}

/// Update a book (also accepted as POST)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Book updated, redirect to the listing"),
        (status = 400, description = "Form re-rendered with errors", body = FormView<BookForm>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    let form = form.normalized();
    match state.services.books.update(id, &form).await {
        Ok(_) => Ok(Redirect::to("/books").into_response()),
        Err(AppError::Validation(errors)) => {
            let persisted = state.services.books.get(id).await?;
            Ok(rerender(
                StatusCode::BAD_REQUEST,
                FormView::new(Some(id), form.merged_over(&persisted)).with_errors(errors),
            ))
        }
        Err(e) => Err(e),
    }
}
