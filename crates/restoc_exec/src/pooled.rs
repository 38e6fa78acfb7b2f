//! Retrying executor holding one connection per host.

use crate::config::{ExecutorConfig, HostRegistry};
use crate::driver::{Connection, Connector, QueryOutcome};
use crate::error::{DriverError, DriverErrorKind, ExecError, ExecResult};
use crate::executor::{CommandExecutor, SelectMode, SelectOutput, Sql};
use parking_lot::Mutex;
use restoc_codec::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A [`CommandExecutor`] over a pluggable driver.
///
/// Keeps one cached connection per named host. Operational failures drop
/// the connection and retry after a fixed backoff until the retry budget
/// runs out, at which point a [`ExecError::Connectivity`] is returned.
/// Statement and integrity failures are classified and returned at once.
pub struct PooledExecutor<C: Connector> {
    connector: C,
    hosts: Arc<HostRegistry>,
    connections: Mutex<HashMap<String, Arc<Mutex<C::Conn>>>>,
    config: ExecutorConfig,
}

impl<C: Connector> PooledExecutor<C> {
    /// Creates an executor using `connector` for the hosts in `hosts`.
    pub fn new(connector: C, hosts: Arc<HostRegistry>, config: ExecutorConfig) -> Self {
        Self {
            connector,
            hosts,
            connections: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Returns the host registry.
    pub fn hosts(&self) -> &HostRegistry {
        &self.hosts
    }

    /// Returns the number of open connections.
    pub fn open_connections(&self) -> usize {
        self.connections.lock().len()
    }

    /// Closes and forgets the connection for `host`, if any.
    pub fn clear_connection(&self, host: &str) {
        let removed = self.connections.lock().remove(host);
        if let Some(conn) = removed {
            conn.lock().close();
            debug!(host, "connection cleared");
        }
    }

    /// Returns the cached connection for `host`, connecting if needed.
    ///
    /// The map lock is only held for lookups and insertion, so a slow or
    /// unreachable host never stalls statements for other hosts.
    fn connection(&self, host: &str) -> ExecResult<Arc<Mutex<C::Conn>>> {
        if let Some(conn) = self.connections.lock().get(host) {
            return Ok(Arc::clone(conn));
        }

        let config = self.hosts.get(host).ok_or_else(|| ExecError::UnknownHost {
            host: host.to_string(),
        })?;

        let retry = &self.config.retry;
        let mut attempt = 0;
        let mut conn = loop {
            attempt += 1;
            match self.connector.connect(&config) {
                Ok(conn) => break conn,
                Err(e) if e.kind == DriverErrorKind::Operational => {
                    if attempt >= retry.max_attempts {
                        error!(host, attempt, code = e.code, "giving up connecting: {}", e.message);
                        return Err(ExecError::Connectivity {
                            host: host.to_string(),
                            attempts: attempt,
                            message: e.message,
                        });
                    }
                    warn!(host, attempt, code = e.code, "connect failed, retrying: {}", e.message);
                    std::thread::sleep(retry.backoff);
                }
                Err(e) => return Err(ExecError::driver(e.code, e.message)),
            }
        };

        let mut connections = self.connections.lock();
        if let Some(existing) = connections.get(host) {
            // Another caller connected first.
            let existing = Arc::clone(existing);
            drop(connections);
            conn.close();
            return Ok(existing);
        }
        debug!(host, attempt, "connected");
        let conn = Arc::new(Mutex::new(conn));
        connections.insert(host.to_string(), Arc::clone(&conn));
        Ok(conn)
    }

    fn run(&self, host: &str, label: &str, sql: &Sql) -> ExecResult<QueryOutcome> {
        debug!(target: "restoc::sql", host, kind = label, "{sql}");

        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let conn = self.connection(host)?;
            let result = conn.lock().query(sql);

            let err = match result {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };

            match self.classify(host, sql, err, attempt) {
                Ok(()) => {
                    self.clear_connection(host);
                    std::thread::sleep(retry.backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Maps a driver failure to the error handed to the caller, or `Ok` if
    /// the statement should be retried.
    fn classify(&self, host: &str, sql: &Sql, err: DriverError, attempt: u32) -> ExecResult<()> {
        let retry = &self.config.retry;
        match err.kind {
            DriverErrorKind::Programming | DriverErrorKind::Internal => {
                Err(ExecError::sql(err.code, err.message, sql.to_string()))
            }
            DriverErrorKind::Integrity => {
                Err(ExecError::duplicate_from_message(err.code, &err.message))
            }
            DriverErrorKind::Operational if !retry.is_transient(err.code) => {
                Err(ExecError::sql(err.code, err.message, sql.to_string()))
            }
            DriverErrorKind::Operational => {
                if attempt >= retry.max_attempts {
                    error!(host, attempt, code = err.code, "giving up: {}", err.message);
                    return Err(ExecError::Connectivity {
                        host: host.to_string(),
                        attempts: attempt,
                        message: err.message,
                    });
                }
                warn!(host, attempt, code = err.code, "operational error, retrying: {}", err.message);
                Ok(())
            }
            DriverErrorKind::Other => Err(ExecError::driver(err.code, err.message)),
        }
    }
}

impl<C: Connector> CommandExecutor for PooledExecutor<C> {
    fn execute(&self, host: &str, sql: &Sql) -> ExecResult<u64> {
        Ok(self.run(host, "EXECUTE", sql)?.affected)
    }

    fn insert(&self, host: &str, sql: &Sql) -> ExecResult<Value> {
        Ok(self
            .run(host, "INSERT", sql)?
            .last_insert_id
            .unwrap_or(Value::Null))
    }

    fn select(&self, host: &str, sql: &Sql, mode: SelectMode) -> ExecResult<SelectOutput> {
        let outcome = self.run(host, "SELECT", sql)?;
        SelectOutput::shape(&mode, &outcome.columns, outcome.rows)
    }

    fn session_cell(&self, host: &str, statements: &[Sql]) -> ExecResult<Option<Value>> {
        for sql in statements {
            debug!(target: "restoc::sql", host, kind = "SESSION", "{sql}");
        }

        let retry = &self.config.retry;
        let mut attempt = 0;
        'unit: loop {
            attempt += 1;
            let conn = self.connection(host)?;
            let mut session = conn.lock();
            let mut last = None;
            for sql in statements {
                match session.query(sql) {
                    Ok(outcome) => last = Some(outcome),
                    Err(err) => {
                        drop(session);
                        self.classify(host, sql, err, attempt)?;
                        self.clear_connection(host);
                        std::thread::sleep(retry.backoff);
                        continue 'unit;
                    }
                }
            }
            drop(session);

            return match last {
                Some(outcome) => Ok(SelectOutput::shape(
                    &SelectMode::Cell,
                    &outcome.columns,
                    outcome.rows,
                )?
                .into_cell()),
                None => Ok(None),
            };
        }
    }

    fn escape(&self, host: &str, raw: &str) -> ExecResult<String> {
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let conn = self.connection(host)?;
            let result = conn.lock().escape_string(raw);
            match result {
                Ok(escaped) => return Ok(escaped),
                Err(e) if e.kind == DriverErrorKind::Operational && attempt < retry.max_attempts => {
                    warn!(host, attempt, "escape failed, reconnecting: {}", e.message);
                    self.clear_connection(host);
                }
                Err(e) if e.kind == DriverErrorKind::Operational => {
                    return Err(ExecError::Connectivity {
                        host: host.to_string(),
                        attempts: attempt,
                        message: e.message,
                    });
                }
                Err(e) => return Err(ExecError::driver(e.code, e.message)),
            }
        }
    }
}
