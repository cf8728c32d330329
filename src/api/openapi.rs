//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{self, books, health, loans, patrons};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Server",
        version = "1.0.0",
        description = "Books, patrons and loans of a lending library. \
                       Every page answers its view model as JSON; forms are submitted \
                       url-encoded and answer 303 on success."
    ),
    paths(
        api::home,
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::new_book,
        books::create_book,
        books::get_book,
        books::update_book,
        // Patrons
        patrons::list_patrons,
        patrons::new_patron,
        patrons::create_patron,
        patrons::get_patron,
        patrons::update_patron,
        // Loans
        loans::list_loans,
        loans::list_active_loans,
        loans::list_overdue_loans,
        loans::new_loan,
        loans::create_loan,
        loans::return_form,
        loans::return_loan,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookForm,
            // Patrons
            crate::models::patron::Patron,
            crate::models::patron::PatronSummary,
            crate::models::patron::PatronForm,
            patrons::PatronEditView,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanForm,
            crate::models::loan::ReturnForm,
            loans::NewLoanView,
            loans::ReturnView,
            // Paging
            crate::models::pagination::ListQuery,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "pages", description = "Site root"),
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "patrons", description = "Patron management"),
        (name = "loans", description = "Checkout and return of books")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
