//! The executor boundary.
//!
//! LessQL never talks to a database directly. Everything it needs from a
//! backend goes through the [`Executor`] trait:
//!
//! - [`Executor::query`] - run a statement and fetch every record
//! - [`Executor::execute`] - run a statement and report affected rows
//! - [`Executor::quote_text`] - dialect-native string literal escaping
//! - [`Executor::last_insert_id`] - the key generated by the last insert
//! - [`Executor::begin`] / [`Executor::commit`] / [`Executor::rollback`]
//!
//! Implementations are synchronous; every call blocks until the backend
//! answers.

use crate::error::Result;
use crate::record::Record;
use crate::value::Value;
use serde::Serialize;

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Param {
    /// Bound to the next `?` placeholder
    Positional(Value),
    /// Bound to a `:name` placeholder
    Named(String, Value),
}

impl Param {
    /// The bound value.
    pub fn value(&self) -> &Value {
        match self {
            Param::Positional(v) | Param::Named(_, v) => v,
        }
    }

    /// The placeholder name for named parameters.
    pub fn name(&self) -> Option<&str> {
        match self {
            Param::Positional(_) => None,
            Param::Named(name, _) => Some(name),
        }
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Positional(v)
    }
}

macro_rules! param_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(v: $ty) -> Self {
                    Param::Positional(Value::from(v))
                }
            }
        )*
    };
}

param_from_scalar!(bool, i32, i64, f64, String, &str);

impl<S: Into<String>, V: Into<Value>> From<(S, V)> for Param {
    fn from((name, value): (S, V)) -> Self {
        Param::Named(name.into(), value.into())
    }
}

/// A synchronous SQL backend.
pub trait Executor {
    /// Prepare, execute and fetch all records of a statement.
    #[allow(clippy::result_large_err)]
    fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<Record>>;

    /// Prepare and execute a statement, returning the affected row count.
    #[allow(clippy::result_large_err)]
    fn execute(&self, sql: &str, params: &[Param]) -> Result<u64>;

    /// Quote a string as a SQL literal.
    ///
    /// The default doubles embedded single quotes, which is what ANSI SQL
    /// and SQLite expect.
    fn quote_text(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    /// The key generated by the most recent insert.
    ///
    /// `sequence` names the sequence for backends that generate keys from
    /// one; others ignore it.
    #[allow(clippy::result_large_err)]
    fn last_insert_id(&self, sequence: Option<&str>) -> Result<Option<Value>>;

    /// Begin a transaction.
    #[allow(clippy::result_large_err)]
    fn begin(&self) -> Result<()>;

    /// Commit the current transaction.
    #[allow(clippy::result_large_err)]
    fn commit(&self) -> Result<()>;

    /// Roll back the current transaction.
    #[allow(clippy::result_large_err)]
    fn rollback(&self) -> Result<()>;
}
