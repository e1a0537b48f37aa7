//! Statement builders for INSERT, UPDATE and DELETE.

use crate::format::SqlFormat;
use crate::select::where_suffix;
use indexmap::{IndexMap, IndexSet};
use lessql_core::{Param, Value};

/// A SQL statement ready for the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }
}

/// How several rows are written by one insert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertMethod {
    /// One INSERT per row with quoted values. Works everywhere and supports
    /// literals.
    #[default]
    Default,
    /// One `?` placeholder statement executed once per row with bound
    /// parameters. Literals are bound as plain text.
    Prepared,
    /// A single INSERT with one value list per row.
    Batch,
}

/// A row of column values to insert or set.
pub type Data = IndexMap<String, Value>;

/// INSERT builder.
///
/// Columns are the union of all rows' columns in first-seen order; a row
/// lacking a column inserts NULL there.
#[derive(Debug)]
pub struct InsertBuilder<'a> {
    table: &'a str,
    rows: &'a [Data],
    method: InsertMethod,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(table: &'a str, rows: &'a [Data]) -> Self {
        Self {
            table,
            rows,
            method: InsertMethod::Default,
        }
    }

    pub fn method(mut self, method: InsertMethod) -> Self {
        self.method = method;
        self
    }

    /// Build the statements to execute, in order.
    ///
    /// No rows, or rows without any column, build nothing.
    pub fn build(&self, fmt: &SqlFormat<'_>) -> Vec<Statement> {
        let columns: IndexSet<&str> = self
            .rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        if columns.is_empty() {
            return Vec::new();
        }

        let quoted: Vec<_> = columns.iter().map(|c| fmt.quote_identifier(c)).collect();
        let head = format!(
            "INSERT INTO {} ( {} ) VALUES ",
            fmt.quote_identifier(self.table),
            quoted.join(", ")
        );

        match self.method {
            InsertMethod::Prepared => {
                let placeholders = vec!["?"; columns.len()].join(", ");
                let sql = format!("{head}( {placeholders} )");
                self.rows
                    .iter()
                    .map(|row| Statement {
                        sql: sql.clone(),
                        params: columns
                            .iter()
                            .map(|c| Param::Positional(bindable(row.get(*c))))
                            .collect(),
                    })
                    .collect()
            }
            InsertMethod::Batch => {
                let lists: Vec<_> = self
                    .rows
                    .iter()
                    .map(|row| value_list(fmt, &columns, row))
                    .collect();
                vec![Statement::new(format!("{head}{}", lists.join(", ")))]
            }
            InsertMethod::Default => self
                .rows
                .iter()
                .map(|row| Statement::new(format!("{head}{}", value_list(fmt, &columns, row))))
                .collect(),
        }
    }
}

fn value_list(fmt: &SqlFormat<'_>, columns: &IndexSet<&str>, row: &Data) -> String {
    let values: Vec<_> = columns
        .iter()
        .map(|c| fmt.quote(row.get(*c).unwrap_or(&Value::Null)))
        .collect();
    format!("( {} )", values.join(", "))
}

fn bindable(value: Option<&Value>) -> Value {
    match value {
        None => Value::Null,
        Some(Value::Literal(sql)) => Value::Text(sql.clone()),
        Some(v) => v.clone(),
    }
}

/// UPDATE builder.
#[derive(Debug)]
pub struct UpdateBuilder<'a> {
    table: &'a str,
    data: &'a Data,
    conditions: &'a [String],
    params: &'a [Param],
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(table: &'a str, data: &'a Data) -> Self {
        Self {
            table,
            data,
            conditions: &[],
            params: &[],
        }
    }

    /// Restrict the update; conditions are joined with AND.
    pub fn filter(mut self, conditions: &'a [String], params: &'a [Param]) -> Self {
        self.conditions = conditions;
        self.params = params;
        self
    }

    /// Build the UPDATE, or nothing when there is no data to set.
    pub fn build(&self, fmt: &SqlFormat<'_>) -> Option<Statement> {
        if self.data.is_empty() {
            return None;
        }
        let set: Vec<_> = self
            .data
            .iter()
            .map(|(column, value)| format!("{} = {}", fmt.quote_identifier(column), fmt.quote(value)))
            .collect();
        Some(Statement {
            sql: format!(
                "UPDATE {} SET {}{}",
                fmt.quote_identifier(self.table),
                set.join(", "),
                where_suffix(self.conditions)
            ),
            params: self.params.to_vec(),
        })
    }
}

/// DELETE builder.
#[derive(Debug)]
pub struct DeleteBuilder<'a> {
    table: &'a str,
    conditions: &'a [String],
    params: &'a [Param],
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(table: &'a str) -> Self {
        Self {
            table,
            conditions: &[],
            params: &[],
        }
    }

    /// Restrict the delete; conditions are joined with AND.
    pub fn filter(mut self, conditions: &'a [String], params: &'a [Param]) -> Self {
        self.conditions = conditions;
        self.params = params;
        self
    }

    pub fn build(&self, fmt: &SqlFormat<'_>) -> Statement {
        Statement {
            sql: format!(
                "DELETE FROM {}{}",
                fmt.quote_identifier(self.table),
                where_suffix(self.conditions)
            ),
            params: self.params.to_vec(),
        }
    }
}
