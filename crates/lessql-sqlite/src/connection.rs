//! SQLite connection implementation.
//!
//! This module provides safe wrappers around SQLite's C API and implements
//! the `Executor` trait from lessql-core.

// Allow casts in FFI code where we need to match C types exactly
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::result_large_err)] // Error type is defined in lessql-core
#![allow(clippy::borrow_as_ptr)] // FFI requires raw pointers
#![allow(clippy::if_not_else)] // Clearer for error handling

use crate::ffi;
use crate::types;
use lessql_core::{
    ColumnInfo, ConnectionError, ConnectionErrorKind, Error, Executor, Param, QueryError,
    QueryErrorKind, Record, TransactionError, TransactionErrorKind, Value,
};
use std::ffi::{CStr, CString, c_int};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for in-memory database.
    pub path: String,
    /// Open flags (read-only, read-write, create)
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
}

impl OpenFlags {
    /// Create flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Create flags for read-write access with creation if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
        }
    }
}

impl SqliteConfig {
    /// Create a new config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a new config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

/// Inner state of the SQLite connection, protected by a mutex.
struct SqliteInner {
    db: *mut ffi::sqlite3,
    in_transaction: bool,
}

// SAFETY: the handle is only touched while the Mutex is held.
unsafe impl Send for SqliteInner {}

/// A connection to a SQLite database.
pub struct SqliteConnection {
    inner: Mutex<SqliteInner>,
    path: String,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteConnection {
    /// Open a new SQLite connection with the given configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self, Error> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "Invalid path: contains null byte".to_string(),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if !db.is_null() {
                // SAFETY: db is valid, errmsg returns a valid C string
                unsafe {
                    let err_ptr = ffi::sqlite3_errmsg(db);
                    let msg = CStr::from_ptr(err_ptr).to_string_lossy().into_owned();
                    ffi::sqlite3_close(db);
                    msg
                }
            } else {
                ffi::error_string(rc).to_string()
            };

            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: format!("Failed to open database: {}", msg),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms as c_int);
            }
        }

        Ok(Self {
            inner: Mutex::new(SqliteInner {
                db,
                in_transaction: false,
            }),
            path: config.path.clone(),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, Error> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self, Error> {
        Self::open(&SqliteConfig::file(path))
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteInner>, Error> {
        self.inner.lock().map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Lock,
                message: "SQLite connection mutex poisoned".to_string(),
                source: None,
            })
        })
    }

    /// Execute SQL directly without preparing (for DDL, scripts, etc.)
    pub fn execute_raw(&self, sql: &str) -> Result<(), Error> {
        let inner = self.lock()?;
        exec(inner.db, sql)
    }

    /// Get the last insert rowid.
    pub fn last_insert_rowid(&self) -> Result<i64, Error> {
        let inner = self.lock()?;
        // SAFETY: db is valid
        Ok(unsafe { ffi::sqlite3_last_insert_rowid(inner.db) })
    }

    /// Is a transaction open?
    pub fn in_transaction(&self) -> bool {
        self.inner.lock().is_ok_and(|inner| inner.in_transaction)
    }

    /// Prepare and execute a query, returning all records.
    fn query_sync(&self, sql: &str, params: &[Param]) -> Result<Vec<Record>, Error> {
        let inner = self.lock()?;
        let stmt = prepare_stmt(inner.db, sql)?;

        if let Err(e) = bind_params(inner.db, stmt, sql, params) {
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(e);
        }

        // SAFETY: stmt is valid
        let col_count = unsafe { ffi::sqlite3_column_count(stmt) };
        let mut col_names = Vec::with_capacity(col_count as usize);
        for i in 0..col_count {
            let name =
                unsafe { types::column_name(stmt, i) }.unwrap_or_else(|| format!("col{}", i));
            col_names.push(name);
        }
        let columns = Arc::new(ColumnInfo::new(col_names));

        let mut records = Vec::new();
        loop {
            // SAFETY: stmt is valid
            let rc = unsafe { ffi::sqlite3_step(stmt) };
            match rc {
                ffi::SQLITE_ROW => {
                    let mut values = Vec::with_capacity(col_count as usize);
                    for i in 0..col_count {
                        // SAFETY: stmt is valid, we just got SQLITE_ROW
                        values.push(unsafe { types::read_column(stmt, i) });
                    }
                    records.push(Record::with_columns(Arc::clone(&columns), values));
                }
                ffi::SQLITE_DONE => break,
                _ => {
                    let err = step_error(inner.db, sql);
                    // SAFETY: stmt is valid
                    unsafe { ffi::sqlite3_finalize(stmt) };
                    return Err(err);
                }
            }
        }

        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };
        Ok(records)
    }

    /// Prepare and execute a statement, returning rows affected.
    fn execute_sync(&self, sql: &str, params: &[Param]) -> Result<u64, Error> {
        let inner = self.lock()?;
        let stmt = prepare_stmt(inner.db, sql)?;

        if let Err(e) = bind_params(inner.db, stmt, sql, params) {
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(e);
        }

        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_step(stmt) };
        let result = match rc {
            // SAFETY: db is valid
            ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
                Ok(unsafe { ffi::sqlite3_changes(inner.db) } as u64)
            }
            _ => Err(step_error(inner.db, sql)),
        };

        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };
        result
    }

    fn set_transaction(&self, sql: &str, open: bool) -> Result<(), Error> {
        let mut inner = self.lock()?;
        if inner.in_transaction == open {
            let (kind, message) = if open {
                (TransactionErrorKind::AlreadyActive, "Already in a transaction")
            } else {
                (TransactionErrorKind::NotActive, "Not in a transaction")
            };
            return Err(Error::Transaction(TransactionError {
                kind,
                message: message.to_string(),
            }));
        }
        exec(inner.db, sql)?;
        inner.in_transaction = open;
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.lock() {
            if !inner.db.is_null() {
                // SAFETY: db is valid
                unsafe {
                    ffi::sqlite3_close_v2(inner.db);
                }
            }
        }
    }
}

impl Executor for SqliteConnection {
    fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<Record>, Error> {
        self.query_sync(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Param]) -> Result<u64, Error> {
        self.execute_sync(sql, params)
    }

    fn last_insert_id(&self, _sequence: Option<&str>) -> Result<Option<Value>, Error> {
        let id = self.last_insert_rowid()?;
        Ok((id != 0).then_some(Value::BigInt(id)))
    }

    fn begin(&self) -> Result<(), Error> {
        self.set_transaction("BEGIN", true)
    }

    fn commit(&self) -> Result<(), Error> {
        self.set_transaction("COMMIT", false)
    }

    fn rollback(&self) -> Result<(), Error> {
        self.set_transaction("ROLLBACK", false)
    }
}

fn exec(db: *mut ffi::sqlite3, sql: &str) -> Result<(), Error> {
    let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;
    let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();

    // SAFETY: All pointers are valid
    let rc = unsafe { ffi::sqlite3_exec(db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg) };

    if rc != ffi::SQLITE_OK {
        let msg = if !errmsg.is_null() {
            // SAFETY: errmsg is valid until freed
            let msg = unsafe { CStr::from_ptr(errmsg).to_string_lossy().into_owned() };
            unsafe { ffi::sqlite3_free(errmsg.cast()) };
            msg
        } else {
            ffi::error_string(rc).to_string()
        };

        return Err(Error::Query(QueryError {
            kind: error_code_to_kind(rc),
            sql: Some(sql.to_string()),
            message: msg,
            source: None,
        }));
    }

    Ok(())
}

fn prepare_stmt(db: *mut ffi::sqlite3, sql: &str) -> Result<*mut ffi::sqlite3_stmt, Error> {
    let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;
    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();

    // SAFETY: All pointers are valid
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(
            db,
            c_sql.as_ptr(),
            c_sql.as_bytes().len() as c_int,
            &mut stmt,
            ptr::null_mut(),
        )
    };

    if rc != ffi::SQLITE_OK {
        return Err(prepare_error(db, sql));
    }

    Ok(stmt)
}

/// Bind positional parameters in order and named parameters by name.
///
/// Names may be given with or without their `:` prefix.
fn bind_params(
    db: *mut ffi::sqlite3,
    stmt: *mut ffi::sqlite3_stmt,
    sql: &str,
    params: &[Param],
) -> Result<(), Error> {
    let mut next_positional: c_int = 1;
    for param in params {
        let index = match param {
            Param::Positional(_) => {
                let index = next_positional;
                next_positional += 1;
                index
            }
            Param::Named(name, _) => named_index(stmt, sql, name)?,
        };
        // SAFETY: stmt is valid, index is 1-based
        let rc = unsafe { types::bind_value(stmt, index, param.value()) };
        if rc != ffi::SQLITE_OK {
            return Err(bind_error(db, sql, index));
        }
    }
    Ok(())
}

fn named_index(stmt: *mut ffi::sqlite3_stmt, sql: &str, name: &str) -> Result<c_int, Error> {
    let full = if name.starts_with([':', '@', '$']) {
        name.to_string()
    } else {
        format!(":{name}")
    };
    let c_name = CString::new(full.as_str()).map_err(|_| null_byte_error(sql))?;
    // SAFETY: stmt and c_name are valid
    let index = unsafe { ffi::sqlite3_bind_parameter_index(stmt, c_name.as_ptr()) };
    if index == 0 {
        return Err(Error::Query(QueryError {
            kind: QueryErrorKind::Bind,
            sql: Some(sql.to_string()),
            message: format!("Unknown named parameter {}", full),
            source: None,
        }));
    }
    Ok(index)
}

fn null_byte_error(sql: &str) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Syntax,
        sql: Some(sql.to_string()),
        message: "SQL contains null byte".to_string(),
        source: None,
    })
}

fn errmsg(db: *mut ffi::sqlite3) -> String {
    // SAFETY: db is valid, errmsg returns a valid C string
    unsafe {
        let ptr = ffi::sqlite3_errmsg(db);
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

fn prepare_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid
    let code = unsafe { ffi::sqlite3_errcode(db) };
    let message = errmsg(db);
    // SQLite reports both as SQLITE_ERROR; only the message tells them apart.
    let kind = if message.contains("syntax error") {
        QueryErrorKind::Syntax
    } else if message.starts_with("no such") {
        QueryErrorKind::NotFound
    } else {
        error_code_to_kind(code)
    };
    Error::Query(QueryError {
        kind,
        sql: Some(sql.to_string()),
        message,
        source: None,
    })
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, param_index: c_int) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Bind,
        sql: Some(sql.to_string()),
        message: format!("Failed to bind parameter {}: {}", param_index, errmsg(db)),
        source: None,
    })
}

fn step_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid
    let code = unsafe { ffi::sqlite3_errcode(db) };
    Error::Query(QueryError {
        kind: error_code_to_kind(code),
        sql: Some(sql.to_string()),
        message: errmsg(db),
        source: None,
    })
}

fn error_code_to_kind(code: c_int) -> QueryErrorKind {
    match code & 0xff {
        ffi::SQLITE_CONSTRAINT => QueryErrorKind::Constraint,
        ffi::SQLITE_NOTFOUND => QueryErrorKind::NotFound,
        ffi::SQLITE_RANGE => QueryErrorKind::Bind,
        _ => QueryErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> SqliteConnection {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL)")
            .unwrap();
        conn
    }

    #[test]
    fn test_open_memory() {
        let conn = SqliteConnection::open_memory().unwrap();
        assert_eq!(conn.path(), ":memory:");
        assert!(!conn.in_transaction());
    }

    #[test]
    fn test_query_and_column_names() {
        let conn = conn();
        conn.execute_raw("INSERT INTO t (name, score) VALUES ('a', 1.5), ('b', NULL)")
            .unwrap();
        let records = conn.query("SELECT * FROM t ORDER BY id", &[]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].column_names().collect::<Vec<_>>(),
            vec!["id", "name", "score"]
        );
        assert_eq!(records[0].get_by_name("id"), Some(&Value::Int(1)));
        assert_eq!(records[0].get_by_name("score"), Some(&Value::Double(1.5)));
        assert_eq!(records[1].get_by_name("score"), Some(&Value::Null));
    }

    #[test]
    fn test_positional_and_named_params() {
        let conn = conn();
        let affected = conn
            .execute(
                "INSERT INTO t (name, score) VALUES (?, ?)",
                &[Param::from("x"), Param::from(2.0)],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let by_name = conn
            .query("SELECT name FROM t WHERE score = :score", &[Param::from(("score", 2.0))])
            .unwrap();
        assert_eq!(by_name.len(), 1);
        let prefixed = conn
            .query("SELECT name FROM t WHERE score = :score", &[Param::from((":score", 2.0))])
            .unwrap();
        assert_eq!(prefixed[0].get(0), Some(&Value::Text("x".into())));
    }

    #[test]
    fn test_unknown_named_param() {
        let conn = conn();
        let err = conn
            .query("SELECT * FROM t WHERE id = :id", &[Param::from(("nope", 1))])
            .unwrap_err();
        assert!(matches!(err, Error::Query(QueryError { kind: QueryErrorKind::Bind, .. })));
    }

    #[test]
    fn test_last_insert_id() {
        let conn = conn();
        conn.execute("INSERT INTO t (name) VALUES ('a')", &[]).unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('b')", &[]).unwrap();
        assert_eq!(conn.last_insert_id(None).unwrap(), Some(Value::BigInt(2)));
    }

    #[test]
    fn test_transaction() {
        let conn = conn();
        conn.begin().unwrap();
        assert!(conn.in_transaction());
        assert!(matches!(conn.begin(), Err(Error::Transaction(_))));
        conn.execute("INSERT INTO t (name) VALUES ('a')", &[]).unwrap();
        conn.rollback().unwrap();
        assert!(conn.query("SELECT * FROM t", &[]).unwrap().is_empty());

        conn.begin().unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('b')", &[]).unwrap();
        conn.commit().unwrap();
        assert_eq!(conn.query("SELECT * FROM t", &[]).unwrap().len(), 1);
        assert!(matches!(conn.commit(), Err(Error::Transaction(_))));
    }

    #[test]
    fn test_constraint_error() {
        let conn = conn();
        conn.execute("INSERT INTO t (id, name) VALUES (1, 'a')", &[]).unwrap();
        let err = conn
            .execute("INSERT INTO t (id, name) VALUES (1, 'b')", &[])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError { kind: QueryErrorKind::Constraint, .. })
        ));
        assert!(err.sql().is_some());
    }

    #[test]
    fn test_syntax_error() {
        let conn = conn();
        let err = conn.query("SELEC * FROM t", &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError { kind: QueryErrorKind::Syntax, .. })
        ));
    }

    #[test]
    fn test_open_flags() {
        let flags = OpenFlags::read_only().to_sqlite_flags();
        assert_eq!(flags & ffi::SQLITE_OPEN_READONLY, ffi::SQLITE_OPEN_READONLY);
        let default = OpenFlags::default().to_sqlite_flags();
        assert_eq!(
            default,
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
        );
    }

    #[test]
    fn test_literal_binds_as_text() {
        let conn = conn();
        conn.execute(
            "INSERT INTO t (name) VALUES (?)",
            &[Param::Positional(Value::literal("NOW()"))],
        )
        .unwrap();
        let records = conn.query("SELECT name FROM t", &[]).unwrap();
        assert_eq!(records[0].get(0), Some(&Value::Text("NOW()".into())));
    }
}
