//! SQL clause types (ORDER BY, LIMIT/OFFSET).

use crate::dialect::Delimiter;
use serde::Serialize;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    column: String,
    direction: Direction,
}

impl OrderBy {
    /// Create an order by term.
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Create an ascending order by term.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    /// Create a descending order by term.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Generate SQL for this term, quoting the column.
    pub fn to_sql(&self, delimiter: Delimiter) -> String {
        format!(
            "{} {}",
            delimiter.quote_identifier(&self.column),
            self.direction.as_sql()
        )
    }
}

/// LIMIT clause with optional OFFSET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limit {
    pub count: u64,
    pub offset: Option<u64>,
}

impl Limit {
    pub fn new(count: u64, offset: Option<u64>) -> Self {
        Self { count, offset }
    }

    /// One-indexed page of `size` rows. Page 0 is treated as page 1.
    pub fn page(size: u64, page: u64) -> Self {
        Self {
            count: size,
            offset: Some(page.saturating_sub(1) * size),
        }
    }

    pub fn to_sql(&self) -> String {
        match self.offset {
            Some(offset) => format!("LIMIT {} OFFSET {}", self.count, offset),
            None => format!("LIMIT {}", self.count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_sql() {
        assert_eq!(OrderBy::desc("id").to_sql(Delimiter::Backtick), "`id` DESC");
        assert_eq!(OrderBy::asc("test").to_sql(Delimiter::None), "test ASC");
    }

    #[test]
    fn test_limit_sql() {
        assert_eq!(Limit::new(3, None).to_sql(), "LIMIT 3");
        assert_eq!(Limit::new(3, Some(10)).to_sql(), "LIMIT 3 OFFSET 10");
    }

    #[test]
    fn test_page() {
        assert_eq!(Limit::page(10, 1), Limit::new(10, Some(0)));
        assert_eq!(Limit::page(10, 3), Limit::new(10, Some(20)));
        assert_eq!(Limit::page(10, 0), Limit::new(10, Some(0)));
    }
}
