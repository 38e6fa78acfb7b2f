//! # RestOC Exec
//!
//! The command executor boundary. Everything above this crate builds SQL
//! text; everything here runs it against a named host and shapes the
//! result.
//!
//! - [`CommandExecutor`] is the seam record code talks to
//! - [`PooledExecutor`] keeps one connection per host and retries
//!   operational failures over any [`Connector`]
//! - [`RecordingExecutor`] records statements and answers from a script
//!
//! ## Usage
//!
//! ```
//! use restoc_exec::{CommandExecutor, RecordingExecutor, SelectMode, Sql};
//!
//! let exec = RecordingExecutor::new();
//! let rows = exec
//!     .select("primary", &Sql::from("SELECT * FROM `app`.`users`"), SelectMode::All)
//!     .unwrap();
//! assert!(rows.into_rows().is_empty());
//! assert_eq!(exec.sql(), vec!["SELECT * FROM `app`.`users`"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod driver;
mod error;
mod escape;
mod executor;
mod pooled;
mod recording;

pub use config::{ExecutorConfig, HostConfig, HostRegistry, RetryConfig};
pub use driver::{Connection, Connector, QueryOutcome};
pub use error::{parse_duplicate_entry, DriverError, DriverErrorKind, ExecError, ExecResult};
pub use escape::escape_string;
pub use executor::{CommandExecutor, Row, SelectMode, SelectOutput, Sql};
pub use pooled::PooledExecutor;
pub use recording::{LoggedStatement, RecordingExecutor, Response, StatementKind};
