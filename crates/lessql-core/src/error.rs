//! Error types for LessQL operations.

use std::fmt;

/// The primary error type for all LessQL operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (open, lock, disconnect)
    Connection(ConnectionError),
    /// Query execution errors reported by the executor
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// Transaction errors
    Transaction(TransactionError),
    /// Misuse of results or rows detected by the data-access layer itself
    Logic(LogicError),
    /// Serialization/deserialization errors
    Serde(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the connection
    Connect,
    /// Connection state could not be acquired
    Lock,
    /// Connection lost or closed during operation
    Disconnected,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, not null)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Parameter could not be bound
    Bind,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct TransactionError {
    pub kind: TransactionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionErrorKind {
    /// A transaction is already open
    AlreadyActive,
    /// Commit or rollback without an open transaction
    NotActive,
}

/// A logic error raised by results and rows.
///
/// These are programmer errors: they never come from the database and are
/// raised at the point of detection.
#[derive(Debug, Clone)]
pub struct LogicError {
    pub kind: LogicErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicErrorKind {
    /// `via`, `limit` or an aggregate used on the wrong kind of result
    ScopeViolation,
    /// Key extraction asked for a column the rows do not carry
    MissingKeyColumn,
    /// A graph save made no progress while rows remained dirty
    UnresolvableGraph,
    /// A row was marked clean without a determinable primary key
    CleanWithoutId,
}

impl Error {
    /// Shorthand for a [`LogicError`].
    pub fn logic(kind: LogicErrorKind, message: impl Into<String>) -> Self {
        Error::Logic(LogicError {
            kind,
            message: message.into(),
        })
    }

    /// The logic error kind, if this is a logic error.
    pub fn logic_kind(&self) -> Option<LogicErrorKind> {
        match self {
            Error::Logic(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Is this an error reported by the executor rather than by this layer?
    pub fn is_executor_error(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Query(_) | Error::Transaction(_)
        )
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Transaction(e) => write!(f, "Transaction error: {}", e.message),
            Error::Logic(e) => write!(f, "{}", e),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for LogicErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicErrorKind::ScopeViolation => "scope violation",
            LogicErrorKind::MissingKeyColumn => "missing key column",
            LogicErrorKind::UnresolvableGraph => "unresolvable graph",
            LogicErrorKind::CleanWithoutId => "clean without id",
        };
        f.write_str(name)
    }
}

impl fmt::Display for LogicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Logic error ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for LogicError {}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(err)
    }
}

impl From<LogicError> for Error {
    fn from(err: LogicError) -> Self {
        Error::Logic(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for LessQL operations.
pub type Result<T> = std::result::Result<T, Error>;
