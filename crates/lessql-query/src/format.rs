//! Value quoting and the `is` / `is_not` predicate builder.

use crate::dialect::Delimiter;
use lessql_core::{DATETIME_FORMAT, Executor, Value, Values};
use std::fmt::Write as _;

/// Formats values and identifiers into SQL text for one executor.
///
/// Text is quoted by the executor so that escaping follows the backend;
/// everything else is formatted here.
#[derive(Clone, Copy)]
pub struct SqlFormat<'a> {
    executor: &'a dyn Executor,
    delimiter: Delimiter,
}

impl<'a> SqlFormat<'a> {
    pub fn new(executor: &'a dyn Executor, delimiter: Delimiter) -> Self {
        Self {
            executor,
            delimiter,
        }
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn quote_identifier(&self, name: &str) -> String {
        self.delimiter.quote_identifier(name)
    }

    /// Quote a value as a SQL literal.
    pub fn quote(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(false) => "'0'".to_string(),
            Value::Bool(true) => "'1'".to_string(),
            Value::Int(v) => format!("'{v}'"),
            Value::BigInt(v) => format!("'{v}'"),
            Value::Double(v) => format!("'{v:.6}'"),
            Value::Literal(sql) => sql.clone(),
            Value::DateTime(dt) => self
                .executor
                .quote_text(&dt.format(DATETIME_FORMAT).to_string()),
            Value::Text(s) => self.executor.quote_text(s),
            Value::Bytes(bytes) => {
                let mut hex = String::with_capacity(bytes.len() * 2 + 3);
                hex.push_str("X'");
                for b in bytes {
                    let _ = write!(hex, "{b:02X}");
                }
                hex.push('\'');
                hex
            }
        }
    }

    /// Condition "column is value", or "column is in values" for a list.
    ///
    /// NULL and literals are handled: `IS NULL` instead of `= NULL`, and a
    /// list containing NULL adds an `IS NULL` alternative. An empty list is
    /// never true (`0=1`).
    pub fn is(&self, column: &str, values: impl Into<Values>) -> String {
        self.condition(column, values.into(), false)
    }

    /// Negation of [`is`](Self::is). An empty list is always true (`1=1`).
    pub fn is_not(&self, column: &str, values: impl Into<Values>) -> String {
        self.condition(column, values.into(), true)
    }

    fn condition(&self, column: &str, values: Values, negate: bool) -> String {
        let bang = if negate { "!" } else { "" };
        let not = if negate { " NOT" } else { "" };
        let joiner = if negate { " AND " } else { " OR " };

        let mut values = values.into_vec();
        let column = self.quote_identifier(column);

        match values.len() {
            0 => (if negate { "1=1" } else { "0=1" }).to_string(),
            1 => {
                let value = values.remove(0);
                if value.is_null() {
                    format!("{column} IS{not} NULL")
                } else {
                    format!("{column} {bang}= {}", self.quote(&value))
                }
            }
            _ => {
                let mut quoted = Vec::with_capacity(values.len());
                let mut has_null = false;
                for value in &values {
                    if value.is_null() {
                        has_null = true;
                    } else {
                        quoted.push(self.quote(value));
                    }
                }

                let mut clauses = Vec::with_capacity(2);
                if !quoted.is_empty() {
                    clauses.push(format!("{column}{not} IN ( {} )", quoted.join(", ")));
                }
                if has_null {
                    clauses.push(format!("{column} IS{not} NULL"));
                }
                clauses.join(joiner)
            }
        }
    }
}

impl std::fmt::Debug for SqlFormat<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlFormat")
            .field("delimiter", &self.delimiter)
            .finish_non_exhaustive()
    }
}
