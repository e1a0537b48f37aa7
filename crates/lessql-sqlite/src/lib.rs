//! SQLite executor for LessQL.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! This crate provides a SQLite backend using FFI bindings to libsqlite3.
//! It implements the `Executor` trait from lessql-core, so a
//! `SqliteConnection` can be handed straight to `lessql::Database::new`.
//!
//! # Example
//!
//! ```rust
//! use lessql_core::{Executor, Param, Value};
//! use lessql_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_memory().unwrap();
//! conn.execute_raw("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
//! conn.execute("INSERT INTO user (name) VALUES (?)", &[Param::from("Writer")]).unwrap();
//! assert_eq!(conn.last_insert_id(None).unwrap(), Some(Value::BigInt(1)));
//! ```
//!
//! # Type Mapping
//!
//! | LessQL value | SQLite storage |
//! |--------------|----------------|
//! | `Bool` | INTEGER (0/1) |
//! | `Int`, `BigInt` | INTEGER |
//! | `Double` | REAL |
//! | `Text`, `Literal` | TEXT |
//! | `DateTime` | TEXT (`YYYY-MM-DD HH:MM:SS`) |
//! | `Bytes` | BLOB |
//! | `Null` | NULL |

// Links the bundled SQLite amalgamation the FFI declarations resolve against.
use libsqlite3_sys as _;

pub mod connection;
pub mod ffi;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection};

/// The SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// The SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_version() {
        let version = sqlite_version();
        assert!(
            version.starts_with('3'),
            "Expected SQLite 3.x, got {}",
            version
        );
    }

    #[test]
    fn test_sqlite_version_number() {
        let num = sqlite_version_number();
        assert!(
            num >= 3_000_000,
            "Expected SQLite 3.x.x (>= 3000000), got {}",
            num
        );
    }
}
