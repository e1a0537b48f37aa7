//! Core types for LessQL.
//!
//! This crate provides the foundations shared by every other LessQL crate:
//!
//! - `Value` and `Values` for dynamically-typed SQL values
//! - `Record` for records fetched from a backend
//! - `Executor` trait, the boundary to any SQL backend
//! - `Error` and `Result`

pub mod error;
pub mod executor;
pub mod record;
pub mod value;

pub use error::{
    ConnectionError, ConnectionErrorKind, Error, LogicError, LogicErrorKind,
    QueryError, QueryErrorKind, Result, TransactionError, TransactionErrorKind, TypeError,
};
pub use executor::{Executor, Param};
pub use record::{ColumnInfo, Record};
pub use value::{DATETIME_FORMAT, Value, Values};
