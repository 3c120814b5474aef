//! Filter and WHERE-clause construction for log reads

use rusqlite::types::Value;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a caller may request unless configured otherwise
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

/// Constraints and page window for a log read.
///
/// `page` is 1-based. The request layer rejects `page == 0` and
/// `page_size == 0` before a filter reaches the store; if one slips through,
/// page 0 reads as page 1 and a zero page size yields an empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Exact match on the stored level name
    pub level: Option<String>,
    /// Exact match on the service label
    pub service: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            level: None,
            service: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Filter {
    /// Unconstrained filter for the given page window
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Number of rows skipped before this page, saturating at `i64::MAX`
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)).saturating_mul(i64::from(self.page_size))
    }

    /// Predicates for the non-paging part of the filter
    pub fn predicates(&self) -> Predicates {
        let mut predicates = Predicates::new();
        predicates
            .eq_opt("level", self.level.as_deref())
            .eq_opt("service", self.service.as_deref());
        predicates
    }
}

/// Conjunction of `column = ?N` conditions with their bound values.
///
/// Columns are static identifiers; values are only ever bound as parameters.
#[derive(Debug, Default)]
pub struct Predicates {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column` to equal `value`
    pub fn eq(&mut self, column: &'static str, value: impl Into<Value>) -> &mut Self {
        self.params.push(value.into());
        self.clauses.push(format!("{} = ?{}", column, self.params.len()));
        self
    }

    /// Like [`Predicates::eq`], skipped when `value` is absent
    pub fn eq_opt(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.eq(column, value.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Index the next bound parameter will take
    pub fn next_index(&self) -> usize {
        self.params.len() + 1
    }

    /// `WHERE ...` fragment, or an empty string when unconstrained
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconstrained_filter() {
        let predicates = Filter::default().predicates();
        assert!(predicates.is_empty());
        assert_eq!(predicates.where_clause(), "");
        assert_eq!(predicates.next_index(), 1);
    }

    #[test]
    fn test_single_predicate() {
        let predicates = Filter::default().with_service("api").predicates();
        assert_eq!(predicates.where_clause(), "WHERE service = ?1");
        assert_eq!(predicates.into_params(), vec![Value::Text("api".into())]);
    }

    #[test]
    fn test_both_predicates_are_anded() {
        let predicates = Filter::default()
            .with_level("ERROR")
            .with_service("api")
            .predicates();

        assert_eq!(predicates.where_clause(), "WHERE level = ?1 AND service = ?2");
        assert_eq!(predicates.next_index(), 3);
    }

    #[test]
    fn test_values_are_never_interpolated() {
        let hostile = "x' OR '1'='1";
        let predicates = Filter::default().with_service(hostile).predicates();

        assert!(!predicates.where_clause().contains(hostile));
        assert_eq!(predicates.into_params(), vec![Value::Text(hostile.into())]);
    }

    #[test]
    fn test_empty_values_impose_no_constraint() {
        let filter = Filter::default().with_level("").with_service("");
        assert_eq!(filter.level, None);
        assert_eq!(filter.service, None);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Filter::page(1, 50).offset(), 0);
        assert_eq!(Filter::page(3, 20).offset(), 40);
        assert_eq!(Filter::page(0, 20).offset(), 0);
        assert_eq!(Filter::page(u32::MAX, u32::MAX).offset(), i64::MAX);
    }
}
