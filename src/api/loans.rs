//! Loan pages: listings, checkout and return

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        form::FieldErrors,
        loan::{today, LoanDetails, LoanFilter, LoanForm, ReturnForm},
        pagination::{ListQuery, Page},
        patron::Patron,
    },
    services::loans::LoanChoices,
    AppState,
};

use super::{rerender, RecordId};

/// New loan form with the books and patrons to choose from
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLoanView {
    /// Books not currently checked out
    pub books: Vec<Book>,
    pub patrons: Vec<Patron>,
    pub record: LoanForm,
    pub errors: Vec<String>,
    #[schema(value_type = Object)]
    pub field_errors: FieldErrors,
}

impl NewLoanView {
    fn new(choices: LoanChoices, record: LoanForm) -> Self {
        Self {
            books: choices.books,
            patrons: choices.patrons,
            record,
            errors: Vec::new(),
            field_errors: FieldErrors::new(),
        }
    }
}

/// Return form of a loan
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnView {
    pub loan: LoanDetails,
    /// Proposed return date, `YYYY-MM-DD`
    pub returned_on: String,
    pub errors: Vec<String>,
}

/// List all loans with search and pagination
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of loans", body = Page<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<LoanDetails>>> {
    let page = state
        .services
        .loans
        .list(LoanFilter::All, &query.to_request())
        .await?;
    Ok(Json(page))
}

/// List loans not yet returned
#[utoipa::path(
    get,
    path = "/loans/active",
    tag = "loans",
    params(
        ("page" = Option<String>, Query, description = "Page number (default: 1)")
    ),
    responses(
        (status = 200, description = "One page of checked out loans", body = Page<LoanDetails>)
    )
)]
pub async fn list_active_loans(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<LoanDetails>>> {
    let page = state
        .services
        .loans
        .list(LoanFilter::Active, &query.page_only())
        .await?;
    Ok(Json(page))
}

/// List loans past their due date and not yet returned
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    params(
        ("page" = Option<String>, Query, description = "Page number (default: 1)")
    ),
    responses(
        (status = 200, description = "One page of overdue loans", body = Page<LoanDetails>)
    )
)]
pub async fn list_overdue_loans(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<LoanDetails>>> {
    let page = state
        .services
        .loans
        .list(LoanFilter::Overdue(today()), &query.page_only())
        .await?;
    Ok(Json(page))
}

/// New loan form
#[utoipa::path(
    get,
    path = "/loans/new",
    tag = "loans",
    responses(
        (status = 200, description = "New loan form", body = NewLoanView)
    )
)]
pub async fn new_loan(State(state): State<AppState>) -> AppResult<Json<NewLoanView>> {
    let choices = state.services.loans.choices().await?;
    Ok(Json(NewLoanView::new(choices, LoanForm::default())))
}

/// Check a book out to a patron
#[utoipa::path(
    post,
    path = "/loans/new",
    tag = "loans",
    request_body(content = LoanForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Loan created, redirect to the listing"),
        (status = 400, description = "Form re-rendered with errors", body = NewLoanView),
        (status = 404, description = "Book or patron not found"),
        (status = 409, description = "Book already checked out", body = NewLoanView)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    Form(form): Form<LoanForm>,
) -> AppResult<Response> {
    let form = form.normalized();
    let (status, errors) = match state.services.loans.open(&form, today()).await {
        Ok(_) => return Ok(Redirect::to("/loans").into_response()),
        Err(AppError::Validation(errors)) => (StatusCode::BAD_REQUEST, errors),
        Err(AppError::Conflict(conflict)) => {
            (StatusCode::CONFLICT, FieldErrors::single("book_id", conflict.message()))
        }
        Err(e) => return Err(e),
    };

    let choices = state.services.loans.choices().await?;
    let mut view = NewLoanView::new(choices, form);
    view.errors = errors.messages();
    view.field_errors = errors;
    Ok(rerender(status, view))
}

/// Return form of a loan, proposing today as the return date
#[utoipa::path(
    get,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Return form", body = ReturnView),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_form(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<ReturnView>> {
    let loan = state.services.loans.get_details(id).await?;
    Ok(Json(ReturnView {
        loan,
        returned_on: today().to_string(),
        errors: Vec::new(),
    }))
}

/// Record the return of a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body(content = ReturnForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Loan closed, redirect to the listing"),
        (status = 400, description = "Unreadable return date", body = ReturnView),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned", body = ReturnView)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Form(form): Form<ReturnForm>,
) -> AppResult<Response> {
    let today = today();
    let returned_on = match form.returned_on() {
        Ok(date) => date,
        Err(errors) => {
            let loan = state.services.loans.get_details(id).await?;
            return Ok(rerender(
                StatusCode::BAD_REQUEST,
                ReturnView {
                    loan,
                    returned_on: form.returned_on.unwrap_or_default(),
                    errors: errors.messages(),
                },
            ));
        }
    };

    match state.services.loans.close(id, returned_on, today).await {
        Ok(_) => Ok(Redirect::to("/loans").into_response()),
        Err(AppError::Conflict(conflict)) => {
            let loan = state.services.loans.get_details(id).await?;
            Ok(rerender(
                StatusCode::CONFLICT,
                ReturnView {
                    loan,
                    returned_on: returned_on.unwrap_or(today).to_string(),
                    errors: vec![conflict.message().to_string()],
                },
            ))
        }
        Err(e) => Err(e),
    }
}
