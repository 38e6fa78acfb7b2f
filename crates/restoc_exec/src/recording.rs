//! In-memory executor for tests and dry runs.

use crate::error::{ExecError, ExecResult};
use crate::escape::escape_string;
use crate::executor::{CommandExecutor, SelectMode, SelectOutput, Sql};
use parking_lot::Mutex;
use restoc_codec::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

/// Which trait method received a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// [`CommandExecutor::execute`].
    Execute,
    /// [`CommandExecutor::insert`].
    Insert,
    /// [`CommandExecutor::select`].
    Select,
}

/// A statement received by a [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedStatement {
    /// Host the statement was sent to.
    pub host: String,
    /// Method that received it.
    pub kind: StatementKind,
    /// The statement.
    pub sql: Sql,
}

/// A scripted answer for the next statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Answer for `execute`.
    Affected(u64),
    /// Answer for `insert`.
    InsertId(Value),
    /// Answer for `select`. The output is returned as is, whatever the mode.
    Selected(SelectOutput),
    /// Fail the statement.
    Error(ExecError),
}

/// An executor that records statements instead of running them.
///
/// Statements are answered from a FIFO of scripted [`Response`]s. When the
/// queue is empty the defaults apply:
///
/// - `execute` affects 1 row
/// - `insert` returns the next id from an internal counter starting at 1
/// - `select` returns an empty result of the requested mode
///
/// A [`CommandExecutor::session_cell`] unit logs every statement and
/// consumes one response per statement. The last one is logged as a
/// select and answers the cell, earlier ones as executes.
///
/// # Example
///
/// ```rust
/// use restoc_exec::{CommandExecutor, RecordingExecutor, Response, Sql};
///
/// let exec = RecordingExecutor::new();
/// exec.push(Response::Affected(0));
/// assert_eq!(exec.execute("primary", &Sql::from("DELETE FROM t")).unwrap(), 0);
/// assert_eq!(exec.execute("primary", &Sql::from("DELETE FROM t")).unwrap(), 1);
/// assert_eq!(exec.statements().len(), 2);
/// ```
#[derive(Debug)]
pub struct RecordingExecutor {
    log: Mutex<Vec<LoggedStatement>>,
    responses: Mutex<VecDeque<Response>>,
    next_id: AtomicI64,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl RecordingExecutor {
    /// Creates an executor with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push(&self, response: Response) {
        self.responses.lock().push_back(response);
    }

    /// Queues a single-cell select answer.
    pub fn push_cell(&self, value: impl Into<Value>) {
        self.push(Response::Selected(SelectOutput::Cell(Some(value.into()))));
    }

    /// Returns a copy of every statement received so far.
    #[must_use]
    pub fn statements(&self) -> Vec<LoggedStatement> {
        self.log.lock().clone()
    }

    /// Returns the text of every statement received so far.
    #[must_use]
    pub fn sql(&self) -> Vec<String> {
        self.log.lock().iter().map(|s| s.sql.to_string()).collect()
    }

    /// Returns the text of the most recent statement.
    #[must_use]
    pub fn last_sql(&self) -> Option<String> {
        self.log.lock().last().map(|s| s.sql.to_string())
    }

    /// Forgets recorded statements. Scripted responses are kept.
    pub fn clear(&self) {
        self.log.lock().clear();
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }

    fn record(&self, host: &str, kind: StatementKind, sql: &Sql) -> Option<Response> {
        tracing::debug!(target: "restoc::sql", host, ?kind, "{sql}");
        self.log.lock().push(LoggedStatement {
            host: host.to_string(),
            kind,
            sql: sql.clone(),
        });
        self.responses.lock().pop_front()
    }
}

fn unexpected(kind: StatementKind, response: &Response) -> ExecError {
    ExecError::invalid_argument(format!(
        "scripted response {response:?} does not answer a {kind:?} statement"
    ))
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, host: &str, sql: &Sql) -> ExecResult<u64> {
        match self.record(host, StatementKind::Execute, sql) {
            None => Ok(1),
            Some(Response::Affected(n)) => Ok(n),
            Some(Response::Error(e)) => Err(e),
            Some(other) => Err(unexpected(StatementKind::Execute, &other)),
        }
    }

    fn insert(&self, host: &str, sql: &Sql) -> ExecResult<Value> {
        match self.record(host, StatementKind::Insert, sql) {
            None => Ok(Value::Integer(self.next_id.fetch_add(1, Ordering::SeqCst))),
            Some(Response::InsertId(id)) => Ok(id),
            Some(Response::Error(e)) => Err(e),
            Some(other) => Err(unexpected(StatementKind::Insert, &other)),
        }
    }

    fn select(&self, host: &str, sql: &Sql, mode: SelectMode) -> ExecResult<SelectOutput> {
        match self.record(host, StatementKind::Select, sql) {
            None => Ok(SelectOutput::empty(&mode)),
            Some(Response::Selected(output)) => Ok(output),
            Some(Response::Error(e)) => Err(e),
            Some(other) => Err(unexpected(StatementKind::Select, &other)),
        }
    }

    fn session_cell(&self, host: &str, statements: &[Sql]) -> ExecResult<Option<Value>> {
        let Some((last, leading)) = statements.split_last() else {
            return Ok(None);
        };
        for sql in leading {
            match self.record(host, StatementKind::Execute, sql) {
                None | Some(Response::Affected(_) | Response::InsertId(_)) => {}
                Some(Response::Error(e)) => return Err(e),
                Some(other) => return Err(unexpected(StatementKind::Execute, &other)),
            }
        }
        match self.record(host, StatementKind::Select, last) {
            None => Ok(None),
            Some(Response::Selected(output)) => Ok(output.into_cell()),
            Some(Response::Error(e)) => Err(e),
            Some(other) => Err(unexpected(StatementKind::Select, &other)),
        }
    }

    fn escape(&self, _host: &str, raw: &str) -> ExecResult<String> {
        Ok(escape_string(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_script_is_empty() {
        let exec = RecordingExecutor::new();
        assert_eq!(exec.execute("primary", &Sql::from("DO 1")).unwrap(), 1);
        assert_eq!(exec.insert("primary", &Sql::from("INSERT")).unwrap(), Value::Integer(1));
        assert_eq!(exec.insert("primary", &Sql::from("INSERT")).unwrap(), Value::Integer(2));
        assert_eq!(
            exec.select("primary", &Sql::from("SELECT"), SelectMode::Row).unwrap(),
            SelectOutput::Row(None)
        );
    }

    #[test]
    fn statements_are_logged_in_order() {
        let exec = RecordingExecutor::new();
        exec.execute("primary", &Sql::from("A")).unwrap();
        exec.select("replica", &Sql::from("B"), SelectMode::All).unwrap();

        let log = exec.statements();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, StatementKind::Execute);
        assert_eq!(log[1].host, "replica");
        assert_eq!(exec.last_sql().as_deref(), Some("B"));

        exec.clear();
        assert!(exec.sql().is_empty());
    }

    #[test]
    fn scripted_errors_and_mismatches() {
        let exec = RecordingExecutor::new();
        exec.push(Response::Error(ExecError::driver(1, "boom")));
        exec.push(Response::Affected(3));

        assert!(matches!(
            exec.execute("primary", &Sql::from("A")),
            Err(ExecError::Driver { .. })
        ));
        assert!(matches!(
            exec.insert("primary", &Sql::from("B")),
            Err(ExecError::InvalidArgument { .. })
        ));
        assert_eq!(exec.pending(), 0);
    }

    #[test]
    fn push_cell_answers_select() {
        let exec = RecordingExecutor::new();
        exec.push_cell("1-abc");
        let out = exec
            .select("primary", &Sql::from("SELECT `_rev`"), SelectMode::Cell)
            .unwrap();
        assert_eq!(out.into_cell(), Some(Value::from("1-abc")));
    }

    #[test]
    fn session_unit_consumes_one_response_per_statement() {
        let exec = RecordingExecutor::new();
        exec.push(Response::Affected(0));
        exec.push(Response::Affected(1));
        exec.push_cell(9i64);
        exec.push(Response::Affected(7));

        let unit = [Sql::from("SET @k = 9"), Sql::from("INSERT"), Sql::from("SELECT @k")];
        assert_eq!(
            exec.session_cell("primary", &unit).unwrap(),
            Some(Value::Integer(9))
        );

        let kinds: Vec<_> = exec.statements().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![StatementKind::Execute, StatementKind::Execute, StatementKind::Select]
        );
        assert_eq!(exec.pending(), 1);
    }

    #[test]
    fn session_unit_stops_at_first_error() {
        let exec = RecordingExecutor::new();
        exec.push(Response::Error(ExecError::driver(2, "down")));

        let unit = [Sql::from("SET @k = 1"), Sql::from("SELECT @k")];
        assert!(matches!(
            exec.session_cell("primary", &unit),
            Err(ExecError::Driver { code: 2, .. })
        ));
        assert_eq!(exec.sql(), vec!["SET @k = 1"]);
        assert_eq!(exec.session_cell("primary", &[]).unwrap(), None);
    }
}
