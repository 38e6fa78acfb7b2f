//! Command executor trait definition.

use crate::error::{ExecError, ExecResult};
use restoc_codec::{Value, ValueMap};
use std::fmt;

/// A single row keyed by column name.
pub type Row = ValueMap;

/// A statement to run against a host.
#[derive(Debug, Clone, PartialEq)]
pub enum Sql {
    /// Fully rendered SQL text.
    Text(String),
    /// A template with driver-side parameter substitution.
    Template {
        /// Statement with `%s` placeholders.
        template: String,
        /// Parameters substituted by the driver.
        params: Vec<Value>,
    },
}

impl Sql {
    /// Creates a template statement.
    pub fn template(template: impl Into<String>, params: Vec<Value>) -> Self {
        Sql::Template {
            template: template.into(),
            params,
        }
    }

    /// Returns the statement text (the template for parameterized SQL).
    pub fn text(&self) -> &str {
        match self {
            Sql::Text(s) => s,
            Sql::Template { template, .. } => template,
        }
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sql::Text(s) => f.write_str(s),
            Sql::Template { template, params } => {
                write!(f, "{template} [")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<String> for Sql {
    fn from(s: String) -> Self {
        Sql::Text(s)
    }
}

impl From<&str> for Sql {
    fn from(s: &str) -> Self {
        Sql::Text(s.to_string())
    }
}

/// The shape a SELECT result is returned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectMode {
    /// Every row, keyed by column.
    All,
    /// The first column of the first row.
    Cell,
    /// The first column of every row.
    Column,
    /// First column mapped to second column, for every row.
    Hash,
    /// The named column mapped to the whole row, for every row.
    HashRows(String),
    /// The first row only.
    Row,
}

/// The result of a SELECT, shaped according to its [`SelectMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutput {
    /// Result of [`SelectMode::All`].
    Rows(Vec<Row>),
    /// Result of [`SelectMode::Cell`].
    Cell(Option<Value>),
    /// Result of [`SelectMode::Column`].
    Column(Vec<Value>),
    /// Result of [`SelectMode::Hash`], in row order.
    Hash(Vec<(Value, Value)>),
    /// Result of [`SelectMode::HashRows`], in row order.
    HashRows(Vec<(Value, Row)>),
    /// Result of [`SelectMode::Row`].
    Row(Option<Row>),
}

impl SelectOutput {
    /// Returns an empty output of the given mode.
    pub fn empty(mode: &SelectMode) -> Self {
        match mode {
            SelectMode::All => SelectOutput::Rows(Vec::new()),
            SelectMode::Cell => SelectOutput::Cell(None),
            SelectMode::Column => SelectOutput::Column(Vec::new()),
            SelectMode::Hash => SelectOutput::Hash(Vec::new()),
            SelectMode::HashRows(_) => SelectOutput::HashRows(Vec::new()),
            SelectMode::Row => SelectOutput::Row(None),
        }
    }

    /// Shapes raw tabular data according to `mode`.
    pub fn shape(mode: &SelectMode, columns: &[String], rows: Vec<Vec<Value>>) -> ExecResult<Self> {
        let keyed = |row: Vec<Value>| -> Row { columns.iter().cloned().zip(row).collect() };

        Ok(match mode {
            SelectMode::All => SelectOutput::Rows(rows.into_iter().map(keyed).collect()),
            SelectMode::Cell => {
                SelectOutput::Cell(rows.into_iter().next().and_then(|r| r.into_iter().next()))
            }
            SelectMode::Column => SelectOutput::Column(
                rows.into_iter()
                    .filter_map(|r| r.into_iter().next())
                    .collect(),
            ),
            SelectMode::Hash => SelectOutput::Hash(
                rows.into_iter()
                    .map(|r| {
                        let mut it = r.into_iter();
                        let k = it.next().unwrap_or(Value::Null);
                        let v = it.next().unwrap_or(Value::Null);
                        (k, v)
                    })
                    .collect(),
            ),
            SelectMode::HashRows(field) => {
                if !columns.iter().any(|c| c == field) {
                    return Err(ExecError::invalid_argument(format!(
                        "HASH_ROWS key field '{field}' is not in the result columns"
                    )));
                }
                SelectOutput::HashRows(
                    rows.into_iter()
                        .map(|r| {
                            let row = keyed(r);
                            let key = row.get(field).cloned().unwrap_or(Value::Null);
                            (key, row)
                        })
                        .collect(),
                )
            }
            SelectMode::Row => SelectOutput::Row(rows.into_iter().next().map(keyed)),
        })
    }

    /// Unwraps [`SelectOutput::Rows`], anything else is empty.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            SelectOutput::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    /// Unwraps [`SelectOutput::Row`].
    pub fn into_row(self) -> Option<Row> {
        match self {
            SelectOutput::Row(row) => row,
            SelectOutput::Rows(rows) => rows.into_iter().next(),
            _ => None,
        }
    }

    /// Unwraps [`SelectOutput::Cell`].
    pub fn into_cell(self) -> Option<Value> {
        match self {
            SelectOutput::Cell(cell) => cell,
            _ => None,
        }
    }

    /// Unwraps [`SelectOutput::Column`].
    pub fn into_column(self) -> Vec<Value> {
        match self {
            SelectOutput::Column(values) => values,
            _ => Vec::new(),
        }
    }
}

/// Runs statements against named hosts.
///
/// Executors own connections. Callers hand in fully built statements and
/// get back affected row counts, generated ids, or shaped rows.
///
/// # Invariants
///
/// - Statements for one host run in call order. Only
///   [`CommandExecutor::session_cell`] guarantees that several statements
///   share one session, since a reconnect may happen between calls
/// - Statement-level failures are never retried
/// - Executors must be `Send + Sync`
pub trait CommandExecutor: Send + Sync {
    /// Runs a statement that returns no rows, returning the affected row count.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or the host is unreachable.
    fn execute(&self, host: &str, sql: &Sql) -> ExecResult<u64>;

    /// Runs an INSERT and returns the generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or the host is unreachable.
    fn insert(&self, host: &str, sql: &Sql) -> ExecResult<Value>;

    /// Runs a SELECT and shapes the result according to `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or the host is unreachable.
    fn select(&self, host: &str, sql: &Sql, mode: SelectMode) -> ExecResult<SelectOutput>;

    /// Runs `statements` in order on a single session and returns the first
    /// cell of the last one's result.
    ///
    /// Session state such as user variables set by earlier statements is
    /// visible to later ones. A transient failure replays the whole unit on
    /// a fresh session, never a suffix of it.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails or the host is unreachable.
    fn session_cell(&self, host: &str, statements: &[Sql]) -> ExecResult<Option<Value>>;

    /// Escapes a raw string for inclusion between single quotes.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unknown or unreachable.
    fn escape(&self, host: &str, raw: &str) -> ExecResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["_id".to_string(), "name".to_string()]
    }

    fn rows() -> Vec<Vec<Value>> {
        vec![
            vec![Value::Integer(1), Value::from("a")],
            vec![Value::Integer(2), Value::from("b")],
        ]
    }

    #[test]
    fn shape_all_and_row() {
        let all = SelectOutput::shape(&SelectMode::All, &columns(), rows()).unwrap();
        let all = all.into_rows();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].get("name"), Some(&Value::from("b")));

        let row = SelectOutput::shape(&SelectMode::Row, &columns(), rows())
            .unwrap()
            .into_row()
            .unwrap();
        assert_eq!(row.get("_id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn shape_cell_and_column() {
        let cell = SelectOutput::shape(&SelectMode::Cell, &columns(), rows()).unwrap();
        assert_eq!(cell, SelectOutput::Cell(Some(Value::Integer(1))));

        let col = SelectOutput::shape(&SelectMode::Column, &columns(), rows()).unwrap();
        assert_eq!(col.into_column(), vec![Value::Integer(1), Value::Integer(2)]);

        let empty = SelectOutput::shape(&SelectMode::Cell, &columns(), Vec::new()).unwrap();
        assert_eq!(empty.into_cell(), None);
    }

    #[test]
    fn shape_hash_rows_requires_key_column() {
        let err = SelectOutput::shape(&SelectMode::HashRows("x".into()), &columns(), rows());
        assert!(matches!(err, Err(ExecError::InvalidArgument { .. })));

        let ok = SelectOutput::shape(&SelectMode::HashRows("name".into()), &columns(), rows())
            .unwrap();
        match ok {
            SelectOutput::HashRows(pairs) => {
                assert_eq!(pairs[0].0, Value::from("a"));
                assert_eq!(pairs[0].1.get("_id"), Some(&Value::Integer(1)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sql_display() {
        assert_eq!(Sql::from("SELECT 1").to_string(), "SELECT 1");
        let t = Sql::template("SELECT %s", vec![Value::Integer(1)]);
        assert_eq!(t.to_string(), "SELECT %s [1]");
        assert_eq!(t.text(), "SELECT %s");
    }
}
