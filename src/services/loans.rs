//! Loan lifecycle service: checkout and return

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult, Conflict},
    models::{
        book::Book,
        form::check,
        loan::{Loan, LoanDetails, LoanFilter, LoanForm, NewLoan},
        pagination::{Page, PageRequest},
        patron::Patron,
    },
    repository::{BookStore, LoanStore, PatronStore},
};

/// Choices offered by the new loan form
#[derive(Debug, Clone)]
pub struct LoanChoices {
    /// Books without an open loan
    pub books: Vec<Book>,
    pub patrons: Vec<Patron>,
}

#[derive(Clone)]
pub struct LoansService {
    loans: Arc<dyn LoanStore>,
    books: Arc<dyn BookStore>,
    patrons: Arc<dyn PatronStore>,
}

impl LoansService {
    pub fn new(loans: Arc<dyn LoanStore>, books: Arc<dyn BookStore>, patrons: Arc<dyn PatronStore>) -> Self {
        Self { loans, books, patrons }
    }

    /// List loans matching a filter
    pub async fn list(&self, filter: LoanFilter, request: &PageRequest) -> AppResult<Page<LoanDetails>> {
        let (loans, total) = self.loans.list(filter, request).await?;
        Ok(Page::new(loans, total, request))
    }

    pub async fn choices(&self) -> AppResult<LoanChoices> {
        let books = self.books.list_available().await?;
        let patrons = self.patrons.list_all().await?;
        Ok(LoanChoices { books, patrons })
    }

    /// Check a book out to a patron, starting `today`
    pub async fn open(&self, form: &LoanForm, today: NaiveDate) -> AppResult<Loan> {
        let form = form.clone().normalized();
        check(&form).map_err(AppError::Validation)?;
        let (Some(book_id), Some(patron_id)) = (form.selected_book(), form.selected_patron()) else {
            return Err(AppError::Internal("Loan form passed validation without ids".to_string()));
        };

        if self.loans.find_open_by_book(book_id).await?.is_some() {
            return Err(AppError::Conflict(Conflict::BookCheckedOut));
        }

        let loan = self
            .loans
            .create(&NewLoan::starting(book_id, patron_id, today))
            .await?;
        tracing::info!(
            loan_id = loan.id,
            book_id = loan.book_id,
            patron_id = loan.patron_id,
            return_by = %loan.return_by,
            "Book checked out"
        );
        Ok(loan)
    }

    pub async fn get_details(&self, id: i32) -> AppResult<LoanDetails> {
        self.loans
            .get_details(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    /// Record the return of a loan; a missing date means `today`
    pub async fn close(&self, id: i32, returned_on: Option<NaiveDate>, today: NaiveDate) -> AppResult<NaiveDate> {
        let returned_on = returned_on.unwrap_or(today);

        if self.loans.close(id, returned_on).await? == 0 {
            return match self.loans.get_by_id(id).await? {
                Some(_) => Err(AppError::Conflict(Conflict::AlreadyReturned)),
                None => Err(AppError::NotFound(format!("Loan {} not found", id))),
            };
        }

        tracing::info!(loan_id = id, returned_on = %returned_on, "Book returned");
        Ok(returned_on)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::predicate::eq;

    use super::*;
    use crate::repository::{MockBookStore, MockLoanStore, MockPatronStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(loans: MockLoanStore) -> LoansService {
        LoansService::new(
            Arc::new(loans),
            Arc::new(MockBookStore::new()),
            Arc::new(MockPatronStore::new()),
        )
    }

    fn loan_from(id: i32, new: &NewLoan) -> Loan {
        Loan {
            id,
            book_id: new.book_id,
            patron_id: new.patron_id,
            loaned_on: new.loaned_on,
            return_by: new.return_by,
            returned_on: None,
        }
    }

    fn form(book_id: i32, patron_id: i32) -> LoanForm {
        LoanForm::new(book_id, patron_id)
    }

    #[tokio::test]
    async fn test_open_sets_dates() {
        let mut loans = MockLoanStore::new();
        loans.expect_find_open_by_book().returning(|_| Ok(None));
        loans
            .expect_create()
            .times(1)
            .returning(|new| Ok(loan_from(1, new)));

        let loan = service(loans).open(&form(1, 1), date(2024, 3, 1)).await.unwrap();
        assert_eq!(loan.loaned_on, date(2024, 3, 1));
        assert_eq!(loan.return_by, date(2024, 3, 8));
        assert!(loan.is_open());
    }

    #[tokio::test]
    async fn test_checked_out_book_creates_nothing() {
        let mut loans = MockLoanStore::new();
        loans.expect_find_open_by_book().with(eq(1)).returning(|_| {
            Ok(Some(loan_from(7, &NewLoan::starting(1, 2, date(2024, 3, 1)))))
        });
        loans.expect_create().never();

        let result = service(loans).open(&form(1, 3), date(2024, 3, 2)).await;
        match result {
            Err(AppError::Conflict(conflict)) => {
                assert_eq!(conflict.message(), "This book is checked out.");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_choice_is_validation_error() {
        let mut loans = MockLoanStore::new();
        loans.expect_find_open_by_book().never();
        loans.expect_create().never();

        let result = service(loans).open(&LoanForm::default(), date(2024, 3, 1)).await;
        match result {
            Err(AppError::Validation(errors)) => assert_eq!(
                errors.messages(),
                vec!["Please select a book to loan", "Please select a patron for the loan"]
            ),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_numeric_choice_is_validation_error() {
        let mut loans = MockLoanStore::new();
        loans.expect_find_open_by_book().never();
        loans.expect_create().never();

        let form = LoanForm {
            book_id: Some("abc".to_string()),
            patron_id: Some("3".to_string()),
        };
        match service(loans).open(&form, date(2024, 3, 1)).await {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.messages(), vec!["Please select a book to loan"])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_defaults_to_today() {
        let mut loans = MockLoanStore::new();
        loans
            .expect_close()
            .with(eq(4), eq(date(2024, 3, 5)))
            .times(1)
            .returning(|_, _| Ok(1));

        let returned = service(loans).close(4, None, date(2024, 3, 5)).await.unwrap();
        assert_eq!(returned, date(2024, 3, 5));
    }

    #[tokio::test]
    async fn test_close_keeps_submitted_date() {
        let mut loans = MockLoanStore::new();
        loans
            .expect_close()
            .with(eq(4), eq(date(2024, 3, 3)))
            .returning(|_, _| Ok(1));

        let returned = service(loans)
            .close(4, Some(date(2024, 3, 3)), date(2024, 3, 5))
            .await
            .unwrap();
        assert_eq!(returned, date(2024, 3, 3));
    }

    #[tokio::test]
    async fn test_second_return_conflicts() {
        let mut loans = MockLoanStore::new();
        loans.expect_close().returning(|_, _| Ok(0));
        loans.expect_get_by_id().returning(|id| {
            let mut loan = loan_from(id, &NewLoan::starting(1, 1, date(2024, 3, 1)));
            loan.returned_on = Some(date(2024, 3, 4));
            Ok(Some(loan))
        });

        let result = service(loans).close(4, None, date(2024, 3, 5)).await;
        match result {
            Err(AppError::Conflict(conflict)) => {
                assert_eq!(conflict.message(), "This loan has already been returned");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_missing_loan() {
        let mut loans = MockLoanStore::new();
        loans.expect_close().returning(|_, _| Ok(0));
        loans.expect_get_by_id().returning(|_| Ok(None));

        let result = service(loans).close(99, None, date(2024, 3, 5)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_details_missing_loan() {
        let mut loans = MockLoanStore::new();
        loans.expect_get_details().returning(|_| Ok(None));

        let result = service(loans).get_details(5).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    /// Check out, fail a second checkout, return, then check out again
    #[tokio::test]
    async fn test_checkout_return_cycle() {
        let store: Arc<Mutex<Vec<Loan>>> = Arc::new(Mutex::new(Vec::new()));
        let mut loans = MockLoanStore::new();

        let state = store.clone();
        loans.expect_find_open_by_book().returning(move |book_id| {
            Ok(state
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.book_id == book_id && l.is_open())
                .cloned())
        });
        let state = store.clone();
        loans.expect_create().returning(move |new| {
            let mut loans = state.lock().unwrap();
            let loan = loan_from(loans.len() as i32 + 1, new);
            loans.push(loan.clone());
            Ok(loan)
        });
        let state = store.clone();
        loans.expect_close().returning(move |id, returned_on| {
            let mut loans = state.lock().unwrap();
            match loans.iter_mut().find(|l| l.id == id && l.is_open()) {
                Some(loan) => {
                    loan.returned_on = Some(returned_on);
                    Ok(1)
                }
                None => Ok(0),
            }
        });

        let service = service(loans);
        let first = service.open(&form(1, 1), date(2024, 3, 1)).await.unwrap();
        assert_eq!(first.return_by, date(2024, 3, 8));

        let again = service.open(&form(1, 2), date(2024, 3, 2)).await;
        assert!(matches!(again, Err(AppError::Conflict(Conflict::BookCheckedOut))));

        service.close(first.id, None, date(2024, 3, 5)).await.unwrap();

        let second = service.open(&form(1, 2), date(2024, 3, 6)).await.unwrap();
        assert_eq!(second.patron_id, 2);
        assert_eq!(store.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_choices_offer_available_books() {
        let mut books = MockBookStore::new();
        books.expect_list_available().returning(|| {
            Ok(vec![Book {
                id: 2,
                title: "Emma".to_string(),
                author: "Austen".to_string(),
                genre: None,
                first_published: Some(1815),
            }])
        });
        let mut patrons = MockPatronStore::new();
        patrons.expect_list_all().returning(|| Ok(Vec::new()));

        let service = LoansService::new(Arc::new(MockLoanStore::new()), Arc::new(books), Arc::new(patrons));
        let choices = service.choices().await.unwrap();
        assert_eq!(choices.books.len(), 1);
        assert_eq!(choices.books[0].title, "Emma");
        assert!(choices.patrons.is_empty());
    }
}
