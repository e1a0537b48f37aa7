//! Value encoding and decoding between LessQL and SQLite.
//!
//! SQLite has five storage classes (INTEGER, REAL, TEXT, BLOB, NULL). Values
//! without a storage class of their own are stored as TEXT: date/times in
//! `YYYY-MM-DD HH:MM:SS` layout and literals as their SQL text.

use crate::ffi;
use lessql_core::{DATETIME_FORMAT, Value};
use std::ffi::{CStr, c_int};

/// Bind a Value to a prepared statement parameter.
///
/// # Safety
/// - `stmt` must be a valid, non-null prepared statement handle
/// - `index` must be a valid 1-based parameter index
pub unsafe fn bind_value(stmt: *mut ffi::sqlite3_stmt, index: c_int, value: &Value) -> c_int {
    match value {
        Value::Null => unsafe { ffi::sqlite3_bind_null(stmt, index) },

        Value::Bool(b) => unsafe { ffi::sqlite3_bind_int(stmt, index, i32::from(*b)) },

        Value::Int(v) => unsafe { ffi::sqlite3_bind_int(stmt, index, *v) },

        Value::BigInt(v) => unsafe { ffi::sqlite3_bind_int64(stmt, index, *v) },

        Value::Double(v) => unsafe { ffi::sqlite3_bind_double(stmt, index, *v) },

        Value::Text(s) | Value::Literal(s) => unsafe { bind_text(stmt, index, s) },

        Value::DateTime(dt) => {
            let text = dt.format(DATETIME_FORMAT).to_string();
            unsafe { bind_text(stmt, index, &text) }
        }

        Value::Bytes(b) => unsafe {
            ffi::sqlite3_bind_blob(
                stmt,
                index,
                b.as_ptr().cast(),
                b.len() as c_int,
                ffi::SQLITE_TRANSIENT,
            )
        },
    }
}

unsafe fn bind_text(stmt: *mut ffi::sqlite3_stmt, index: c_int, text: &str) -> c_int {
    let bytes = text.as_bytes();
    // SAFETY: SQLITE_TRANSIENT makes SQLite copy the bytes before returning.
    unsafe {
        ffi::sqlite3_bind_text(
            stmt,
            index,
            bytes.as_ptr().cast(),
            bytes.len() as c_int,
            ffi::SQLITE_TRANSIENT,
        )
    }
}

/// Read a column value from a result row.
///
/// # Safety
/// - `stmt` must be a valid prepared statement that has just returned SQLITE_ROW
/// - `index` must be a valid 0-based column index
pub unsafe fn read_column(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Value {
    let col_type = unsafe { ffi::sqlite3_column_type(stmt, index) };

    match col_type {
        ffi::SQLITE_NULL => Value::Null,

        ffi::SQLITE_INTEGER => {
            let v = unsafe { ffi::sqlite3_column_int64(stmt, index) };
            // Choose the smallest representation
            match i32::try_from(v) {
                Ok(small) => Value::Int(small),
                Err(_) => Value::BigInt(v),
            }
        }

        ffi::SQLITE_FLOAT => Value::Double(unsafe { ffi::sqlite3_column_double(stmt, index) }),

        ffi::SQLITE_TEXT => {
            let ptr = unsafe { ffi::sqlite3_column_text(stmt, index) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, index) };
            if ptr.is_null() {
                Value::Null
            } else {
                // SAFETY: SQLite guarantees `len` readable bytes at `ptr` until the next step.
                let slice = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize) };
                Value::Text(String::from_utf8_lossy(slice).into_owned())
            }
        }

        ffi::SQLITE_BLOB => {
            let ptr = unsafe { ffi::sqlite3_column_blob(stmt, index) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, index) };
            if ptr.is_null() || len == 0 {
                Value::Bytes(Vec::new())
            } else {
                let slice = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize) };
                Value::Bytes(slice.to_vec())
            }
        }

        _ => Value::Null,
    }
}

/// Get the column name from a result.
///
/// # Safety
/// - `stmt` must be a valid prepared statement
/// - `index` must be a valid 0-based column index
pub unsafe fn column_name(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Option<String> {
    let ptr = unsafe { ffi::sqlite3_column_name(stmt, index) };
    if ptr.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(String::from)
    }
}
