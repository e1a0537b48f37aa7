//! SQL text generation for LessQL.
//!
//! `lessql-query` turns query shapes and row data into SQL text plus
//! parameters. It never executes anything; the resulting statements run
//! through the `Executor` trait from `lessql-core`.
//!
//! - **Identifiers**: `Delimiter` quotes table and column names.
//! - **Values and predicates**: `SqlFormat` quotes values and builds
//!   `is` / `is_not` conditions.
//! - **Statements**: `Select`, `InsertBuilder`, `UpdateBuilder`,
//!   `DeleteBuilder`.
//! - **Caching**: `QueryCache` holds fetched results by query definition.

pub mod builder;
pub mod cache;
pub mod clause;
pub mod dialect;
pub mod format;
pub mod select;

pub use builder::{Data, DeleteBuilder, InsertBuilder, InsertMethod, Statement, UpdateBuilder};
pub use cache::QueryCache;
pub use clause::{Direction, Limit, OrderBy};
pub use dialect::Delimiter;
pub use format::SqlFormat;
pub use select::Select;
