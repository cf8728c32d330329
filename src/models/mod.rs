//! Data models for the library

pub mod book;
pub mod form;
pub mod loan;
pub mod pagination;
pub mod patron;

// Re-export commonly used types
pub use book::{Book, BookForm, BookSummary};
pub use form::FieldErrors;
pub use loan::{Loan, LoanDetails, LoanFilter, LoanForm, NewLoan, ReturnForm};
pub use pagination::{ListQuery, Page, PageRequest, PAGE_SIZE};
pub use patron::{Patron, PatronForm, PatronSummary};
