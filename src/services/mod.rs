//! Business logic services

pub mod books;
pub mod loans;
pub mod patrons;

use std::sync::Arc;

use crate::{
    error::AppResult,
    repository::{BookStore, LoanStore, PatronStore, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub patrons: patrons::PatronsService,
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        let books: Arc<dyn BookStore> = Arc::new(repository.books.clone());
        let patrons: Arc<dyn PatronStore> = Arc::new(repository.patrons.clone());
        let loans: Arc<dyn LoanStore> = Arc::new(repository.loans.clone());
        Self::with_stores(books, patrons, loans, repository)
    }

    /// Create all services over the given stores; `repository` only answers `ping`
    pub fn with_stores(
        books: Arc<dyn BookStore>,
        patrons: Arc<dyn PatronStore>,
        loans: Arc<dyn LoanStore>,
        repository: Repository,
    ) -> Self {
        Self {
            books: books::BooksService::new(books.clone()),
            patrons: patrons::PatronsService::new(patrons.clone(), loans.clone()),
            loans: loans::LoansService::new(loans, books, patrons),
            repository,
        }
    }

    /// Check the database is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
