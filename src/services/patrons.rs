//! Patron management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        form::check,
        loan::LoanDetails,
        pagination::{Page, PageRequest},
        patron::{next_library_id, Patron, PatronForm},
    },
    repository::{LoanStore, PatronStore},
};

#[derive(Clone)]
pub struct PatronsService {
    patrons: Arc<dyn PatronStore>,
    loans: Arc<dyn LoanStore>,
}

impl PatronsService {
    pub fn new(patrons: Arc<dyn PatronStore>, loans: Arc<dyn LoanStore>) -> Self {
        Self { patrons, loans }
    }

    /// Search patrons with pagination
    pub async fn list(&self, request: &PageRequest) -> AppResult<Page<Patron>> {
        let (patrons, total) = self.patrons.list(request).await?;
        Ok(Page::new(patrons, total, request))
    }

    pub async fn get(&self, id: i32) -> AppResult<Patron> {
        self.patrons.get_by_id(id).await
    }

    /// Loan history of a patron, always at least one page
    pub async fn loan_history(&self, patron_id: i32, request: &PageRequest) -> AppResult<Page<LoanDetails>> {
        let (loans, total) = self.loans.list_for_patron(patron_id, request).await?;
        Ok(Page::new(loans, total, request).at_least_one_page())
    }

    /// Library card number the next patron would receive
    pub async fn next_library_id(&self) -> AppResult<String> {
        let max = self.patrons.max_library_id().await?;
        Ok(next_library_id(max))
    }

    /// Create a patron from a normalized form
    ///
    /// The card number is always assigned here and written back into `form`,
    /// whatever the client sent.
    pub async fn create(&self, form: &mut PatronForm) -> AppResult<Patron> {
        form.library_id = self.next_library_id().await?;
        check(&*form).map_err(AppError::Validation)?;

        let patron = self.patrons.create(form).await?;
        tracing::info!(patron_id = patron.id, library_id = %patron.library_id, "Patron created");
        Ok(patron)
    }

    /// Update a patron from a normalized form
    pub async fn update(&self, id: i32, form: &PatronForm) -> AppResult<Patron> {
        self.patrons.get_by_id(id).await?;
        check(form).map_err(AppError::Validation)?;
        self.patrons.update(id, form).await
    }
}
