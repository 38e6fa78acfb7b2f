//! Error types for command execution.

use thiserror::Error;

/// Result type for executor operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors surfaced by a [`crate::CommandExecutor`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecError {
    /// The statement itself is bad (syntax, unknown column, ...).
    ///
    /// Never retried.
    #[error("SQL error ({code}): {message}\n{sql}")]
    Sql {
        /// Native error code.
        code: u32,
        /// Native error message.
        message: String,
        /// The statement that failed.
        sql: String,
    },

    /// A unique or primary key constraint was violated.
    #[error("duplicate entry '{value}' for key '{key}'")]
    Duplicate {
        /// The duplicated value as reported by the server.
        value: String,
        /// The violated key, possibly qualified as `table.index`.
        key: String,
    },

    /// The host could not be reached within the retry budget.
    #[error("connection to host '{host}' failed after {attempts} attempt(s): {message}")]
    Connectivity {
        /// Name of the host.
        host: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last native error message.
        message: String,
    },

    /// No host was registered under this name.
    #[error("no such host \"{host}\"")]
    UnknownHost {
        /// The requested host name.
        host: String,
    },

    /// The caller asked for something the executor can't give.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// Any other driver failure, passed through.
    #[error("driver error ({code}): {message}")]
    Driver {
        /// Native error code, 0 when unknown.
        code: u32,
        /// Native error message.
        message: String,
    },
}

impl ExecError {
    /// Creates an SQL error.
    pub fn sql(code: u32, message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Sql {
            code,
            message: message.into(),
            sql: sql.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a pass-through driver error.
    pub fn driver(code: u32, message: impl Into<String>) -> Self {
        Self::Driver {
            code,
            message: message.into(),
        }
    }

    /// Builds a duplicate error from a native integrity-violation message.
    ///
    /// Messages that don't follow the `Duplicate entry '..' for key '..'`
    /// shape keep the raw code and message in `value` and `key`.
    pub fn duplicate_from_message(code: u32, message: &str) -> Self {
        match parse_duplicate_entry(message) {
            Some((value, key)) => Self::Duplicate { value, key },
            None => Self::Duplicate {
                value: code.to_string(),
                key: message.to_string(),
            },
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// Executors have already spent their retry budget before handing a
    /// connectivity error out, so nothing here is retryable by callers
    /// except an explicit reconnect.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecError::Connectivity { .. })
    }

    /// Returns the index name of a duplicate error, without table prefix.
    pub fn duplicate_index(&self) -> Option<&str> {
        match self {
            ExecError::Duplicate { key, .. } => Some(key.rsplit('.').next().unwrap_or(key)),
            _ => None,
        }
    }
}

/// Extracts `(value, key)` from `Duplicate entry '<value>' for key '<key>'`.
///
/// The value is matched lazily, so the first `' for key '` ends it.
pub fn parse_duplicate_entry(message: &str) -> Option<(String, String)> {
    let rest = message.strip_prefix("Duplicate entry '")?;
    let (value, rest) = rest.split_once("' for key '")?;
    let (key, _) = rest.split_once('\'')?;
    Some((value.to_string(), key.to_string()))
}

/// Classification of a native driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Bad SQL.
    Programming,
    /// Server-side internal error caused by the statement.
    Internal,
    /// Constraint violation.
    Integrity,
    /// Connection level problem, possibly transient.
    Operational,
    /// Anything else.
    Other,
}

/// A failure reported by a [`crate::Connection`] or [`crate::Connector`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} ({code}): {message}")]
pub struct DriverError {
    /// Classification of the failure.
    pub kind: DriverErrorKind,
    /// Native error code.
    pub code: u32,
    /// Native error message.
    pub message: String,
}

impl DriverError {
    /// Creates a new driver error.
    pub fn new(kind: DriverErrorKind, code: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Creates an operational (connection level) error.
    pub fn operational(code: u32, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Operational, code, message)
    }
}
