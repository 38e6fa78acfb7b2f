//! Driver seam for [`crate::PooledExecutor`].
//!
//! A driver only knows how to open a connection and run one statement on
//! it. Retry, reconnect and error classification live in the executor.

use crate::config::HostConfig;
use crate::error::DriverError;
use crate::executor::Sql;
use restoc_codec::Value;

/// Raw outcome of a single statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// Rows affected by a write.
    pub affected: u64,
    /// Id generated by an auto-increment insert.
    pub last_insert_id: Option<Value>,
    /// Column names of a result set.
    pub columns: Vec<String>,
    /// Result set rows, in column order.
    pub rows: Vec<Vec<Value>>,
}

impl QueryOutcome {
    /// Outcome of a write that touched `affected` rows.
    pub fn affected(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    /// Outcome of an insert that generated `id`.
    pub fn inserted(id: impl Into<Value>) -> Self {
        Self {
            affected: 1,
            last_insert_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Outcome of a query returning rows.
    pub fn rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }
}

/// An open connection to one host.
pub trait Connection: Send {
    /// Runs one statement.
    ///
    /// # Errors
    ///
    /// Returns a classified driver error on failure.
    fn query(&mut self, sql: &Sql) -> Result<QueryOutcome, DriverError>;

    /// Escapes a string using the connection's charset.
    ///
    /// # Errors
    ///
    /// Returns an operational error if the connection is unusable.
    fn escape_string(&mut self, raw: &str) -> Result<String, DriverError>;

    /// Closes the connection. Errors are ignored.
    fn close(&mut self);
}

/// Opens connections.
pub trait Connector: Send + Sync {
    /// Connection type produced by this connector.
    type Conn: Connection;

    /// Opens a connection, with autocommit on and `SET NAMES <charset>` applied.
    ///
    /// # Errors
    ///
    /// Returns an operational error if the server can't be reached.
    fn connect(&self, config: &HostConfig) -> Result<Self::Conn, DriverError>;
}
