//! Paging and search parameters shared by every listing

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Rows per page, for every listing
pub const PAGE_SIZE: i64 = 10;

/// Raw listing query string (`?page=&search=`)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number, 1-based. Anything unparsable or below 1 means page 1
    pub page: Option<String>,
    /// Substring to look for in the listing's text fields
    pub search: Option<String>,
}

impl ListQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(parse_page(self.page.as_deref()), self.search.clone())
    }

    /// Same paging, search ignored (active/overdue views, loan history)
    pub fn page_only(&self) -> PageRequest {
        PageRequest::new(parse_page(self.page.as_deref()), None)
    }
}

fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Validated page number and search term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    search: Option<String>,
}

impl PageRequest {
    pub fn new(page: i64, search: Option<String>) -> Self {
        Self {
            page: page.max(1),
            search: search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn first() -> Self {
        Self::new(1, None)
    }

    /// Search term; `None` means no filter
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }
}

/// Number of pages needed for `count` rows
pub fn total_pages(count: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (count + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

/// One page of a listing with its navigation metadata
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub rows: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
    /// Total number of matching rows
    pub total: i64,
    pub search: String,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(rows: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let pages = total_pages(total);
        Self {
            rows,
            current_page: request.page,
            total_pages: pages,
            has_previous: request.page > 1,
            has_next: request.page < pages,
            total,
            search: request.search().unwrap_or_default().to_string(),
        }
    }

    /// Report at least one page, even for an empty listing
    pub fn at_least_one_page(mut self) -> Self {
        self.total_pages = self.total_pages.max(1);
        self.has_next = self.current_page < self.total_pages;
        self
    }
}
