//! HTTP handlers for the library pages
//!
//! Every page is answered with its view model as JSON. Successful commands
//! answer `303 See Other` to the listing; failed ones re-render the form view.

pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod patrons;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::form::FieldErrors, AppState};

/// Create or edit form with the problems found in the last submission
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormView<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Id of the edited record, absent on creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub record: T,
    /// One message per violated rule
    pub errors: Vec<String>,
    /// The same messages, by field
    #[schema(value_type = Object)]
    pub field_errors: FieldErrors,
}

impl<T> FormView<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(id: Option<i32>, record: T) -> Self {
        Self {
            id,
            record,
            errors: Vec::new(),
            field_errors: FieldErrors::new(),
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors.messages();
        self.field_errors = errors;
        self
    }
}

/// Record id taken from the path
///
/// A segment that is not an id names no record, so it is answered as 404
/// with the usual error body.
pub struct RecordId(pub i32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        raw.trim()
            .parse::<i32>()
            .map(RecordId)
            .map_err(|_| AppError::NotFound(format!("No record with id {}", raw)))
    }
}

/// Root page
#[utoipa::path(
    get,
    path = "/",
    tag = "pages",
    responses(
        (status = 303, description = "Redirect to the book listing")
    )
)]
pub async fn home() -> Redirect {
    Redirect::to("/books")
}

/// Unknown routes
pub async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pages = Router::new()
        .route("/", get(home))
        // Books
        .route("/books", get(books::list_books))
        .route("/books/new", get(books::new_book).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .post(books::update_book),
        )
        // Patrons
        .route("/patrons", get(patrons::list_patrons))
        .route("/patrons/new", get(patrons::new_patron).post(patrons::create_patron))
        .route(
            "/patrons/:id",
            get(patrons::get_patron)
                .put(patrons::update_patron)
                .post(patrons::update_patron),
        )
        // Loans
        .route("/loans", get(loans::list_loans))
        .route("/loans/new", get(loans::new_loan).post(loans::create_loan))
        .route("/loans/active", get(loans::list_active_loans))
        .route("/loans/overdue", get(loans::list_overdue_loans))
        .route("/loans/:id/return", get(loans::return_form).post(loans::return_loan))
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .fallback(not_found)
        .with_state(state);

    Router::new()
        .merge(pages)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Answer a form view with the status of the failure it shows
pub(crate) fn rerender<V: Serialize>(status: StatusCode, view: V) -> Response {
    (status, Json(view)).into_response()
}
