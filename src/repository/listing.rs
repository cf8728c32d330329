//! Search/pagination query construction shared by every listing
//!
//! A [`Listing`] describes one entity view: its columns, joins, searchable
//! text columns, fixed predicates and order. From it we build the page query
//! and the matching count query, with every user value bound as a parameter.

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

use crate::models::pagination::PageRequest;

/// Fixed predicate attached to a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// SQL without parameters
    Sql(&'static str),
    /// `column < date`
    Before(&'static str, NaiveDate),
}

#[derive(Debug, Clone)]
pub struct Listing {
    columns: &'static str,
    from: &'static str,
    search_columns: &'static [&'static str],
    conditions: Vec<Condition>,
    order_by: &'static str,
}

impl Listing {
    /// `columns` is the select list, `from` the table with its joins
    pub fn new(columns: &'static str, from: &'static str) -> Self {
        Self {
            columns,
            from,
            search_columns: &[],
            conditions: Vec::new(),
            order_by: "1",
        }
    }

    /// Columns matched against the search term, any of them may match
    pub fn search_in(mut self, columns: &'static [&'static str]) -> Self {
        self.search_columns = columns;
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, order_by: &'static str) -> Self {
        self.order_by = order_by;
        self
    }

    /// Rows of the requested page
    pub fn select_query(&self, request: &PageRequest) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", self.columns, self.from));
        self.push_where(&mut builder, request.search());
        builder.push(" ORDER BY ").push(self.order_by);
        builder
            .push(" LIMIT ")
            .push_bind(request.limit())
            .push(" OFFSET ")
            .push_bind(request.offset());
        builder
    }

    /// Number of rows matching the same filters
    pub fn count_query(&self, request: &PageRequest) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.from));
        self.push_where(&mut builder, request.search());
        builder
    }

    fn push_where(&self, builder: &mut QueryBuilder<'static, Postgres>, search: Option<&str>) {
        let mut separator = " WHERE ";

        for condition in &self.conditions {
            builder.push(separator);
            separator = " AND ";
            match *condition {
                Condition::Sql(sql) => {
                    builder.push(sql);
                }
                Condition::Before(column, date) => {
                    builder.push(column).push(" < ").push_bind(date);
                }
            }
        }

        let term = match search {
            Some(term) if !self.search_columns.is_empty() => term,
            _ => return,
        };

        let pattern = like_pattern(term);
        builder.push(separator).push("(");
        for (i, column) in self.search_columns.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(*column).push(" ILIKE ").push_bind(pattern.clone());
        }
        builder.push(")");
    }
}

/// `%term%` with LIKE wildcards in the term matched literally
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
