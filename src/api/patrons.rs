//! Patron pages

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
        form::FieldErrors,
        loan::LoanDetails,
        pagination::{ListQuery, Page},
        patron::{Patron, PatronForm},
    },
    AppState,
};

use super::{rerender, FormView, RecordId};

/// Patron edit form with the patron's loan history
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatronEditView {
    pub id: i32,
    pub record: PatronForm,
    pub errors: Vec<String>,
    #[schema(value_type = Object)]
    pub field_errors: FieldErrors,
    /// Loans of this patron, most recent first
    pub loans: Page<LoanDetails>,
}

impl PatronEditView {
    fn new(id: i32, record: PatronForm, loans: Page<LoanDetails>) -> Self {
        Self {
            id,
            record,
            errors: Vec::new(),
            field_errors: FieldErrors::new(),
            loans,
        }
    }

    fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors.messages();
        self.field_errors = errors;
        self
    }
}

/// List patrons with search and pagination
#[utoipa::path(
    get,
    path = "/patrons",
    tag = "patrons",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of patrons", body = Page<Patron>)
    )
)]
pub async fn list_patrons(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Patron>>> {
    let page = state.services.patrons.list(&query.to_request()).await?;
    Ok(Json(page))
}

/// New patron form, pre-filled with the next library card number
#[utoipa::path(
    get,
    path = "/patrons/new",
    tag = "patrons",
    responses(
        (status = 200, description = "New patron form", body = FormView<PatronForm>)
    )
)]
pub async fn new_patron(State(state): State<AppState>) -> AppResult<Json<FormView<PatronForm>>> {
    let record = PatronForm {
        library_id: state.services.patrons.next_library_id().await?,
        ..PatronForm::default()
    };
    Ok(Json(FormView::new(None, record)))
}

/// Create a patron; the library card number is assigned by the server
#[utoipa::path(
    post,
    path = "/patrons/new",
    tag = "patrons",
    request_body(content = PatronForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Patron created, redirect to the listing"),
        (status = 400, description = "Form re-rendered with errors", body = FormView<PatronForm>)
    )
)]
pub async fn create_patron(
    State(state): State<AppState>,
    Form(form): Form<PatronForm>,
) -> AppResult<Response> {
    let mut form = form.normalized();
    match state.services.patrons.create(&mut form).await {
        Ok(_) => Ok(Redirect::to("/patrons").into_response()),
        Err(AppError::Validation(errors)) => Ok(rerender(
            StatusCode::BAD_REQUEST,
            FormView::new(None, form).with_errors(errors),
        )),
        Err(e) => Err(e),
    }
}

/// Edit form of a patron with one page of their loans
#[utoipa::path(
    get,
    path = "/patrons/{id}",
    tag = "patrons",
    params(
        ("id" = i32, Path, description = "Patron ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Patron edit form", body = PatronEditView),
        (status = 404, description = "Patron not found")
    )
)]
pub async fn get_patron(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PatronEditView>> {
    let patron = state.services.patrons.get(id).await?;
    let loans = state
        .services
        .patrons
        .loan_history(id, &query.page_only())
        .await?;
    Ok(Json(PatronEditView::new(id, PatronForm::from(&patron), loans)))
}

/// Update a patron (also accepted as POST)
#[utoipa::path(
    put,
    path = "/patrons/{id}",
    tag = "patrons",
    params(
        ("id" = i32, Path, description = "Patron ID")
    ),
    request_body(content = PatronForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Patron updated, redirect to the listing"),
        (status = 400, description = "Form re-rendered with errors", body = PatronEditView),
        (status = 404, description = "Patron not found")
    )
)]
pub async fn update_patron(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Query(query): Query<ListQuery>,
    Form(form): Form<PatronForm>,
) -> AppResult<Response> {
    let form = form.normalized();
    match state.services.patrons.update(id, &form).await {
        Ok(_) => Ok(Redirect::to("/patrons").into_response()),
        Err(AppError::Validation(errors)) => {
            let persisted = state.services.patrons.get(id).await?;
            let loans = state
                .services
                .patrons
                .loan_history(id, &query.page_only())
                .await?;
            Ok(rerender(
                StatusCode::BAD_REQUEST,
                PatronEditView::new(id, form.merged_over(&persisted), loans).with_errors(errors),
            ))
        }
        Err(e) => Err(e),
    }
}
