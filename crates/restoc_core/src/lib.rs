//! # RestOC Core
//!
//! Record layer for MySQL-backed services.
//!
//! This crate provides:
//! - Schema structures describing a table's fields, keys and indexes
//! - A value escaper and condition compiler producing SQL predicates
//! - SELECT/INSERT/UPDATE/DELETE builders
//! - The record lifecycle (create, save, delete) with dirty tracking,
//!   optimistic revisions and an optional change-audit table
//! - DDL for tables and databases
//!
//! Nothing here talks to a server directly. Every statement goes through a
//! [`restoc_exec::CommandExecutor`].
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use restoc_codec::Value;
//! use restoc_core::{AuditInfo, AutoPrimary, Conflict, FieldNode, ScalarType, Structure, Table};
//! use restoc_exec::RecordingExecutor;
//!
//! let structure = Structure::builder("primary", "app", "users")
//!     .primary("_id")
//!     .auto_primary(AutoPrimary::AutoIncrement)
//!     .field("_id", FieldNode::scalar(ScalarType::Uint))
//!     .field("email", FieldNode::scalar(ScalarType::String))
//!     .build()
//!     .unwrap();
//!
//! let exec = Arc::new(RecordingExecutor::new());
//! let users = Table::new(structure, exec.clone());
//!
//! let mut user = users.record([("email", Value::from("a@b.c"))]).unwrap();
//! let id = user.create(&Conflict::Error, &AuditInfo::None).unwrap();
//! assert_eq!(id, Some(Value::Integer(1)));
//! assert_eq!(
//!     exec.last_sql().unwrap(),
//!     "INSERT INTO `app`.`users` (`email`) VALUES ('a@b.c')"
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod changes;
mod condition;
mod config;
mod ddl;
mod error;
mod escape;
mod record;
mod revision;
mod rows;
mod schema;
mod search;
mod statement;
mod table;

pub use changes::{diff, entry, required_fields, AuditInfo, ChangeEntry};
pub use condition::{process_value, where_term, Condition, Filter, OPERATORS};
pub use config::Custom;
pub use ddl::{
    create_statements, db_create, db_create_statement, db_drop, drop_statements, node_to_type,
};
pub use error::{RecordError, RecordResult};
pub use escape::Escaper;
pub use record::{Dirty, Record};
pub use revision::{counter as revision_counter, next as next_revision};
pub use rows::{process_row, process_rows};
pub use schema::{
    AutoPrimary, AutoPrimaryDef, ChangesDef, ChangesMode, Decode, FieldDef, FieldNode,
    IndexColumn, IndexDef, IndexDefinition, IndexFieldsDef, NodeClass, ScalarNode, ScalarType,
    SqlHint, SqlHintDef, Structure, StructureBuilder, StructureDef, StructuredNode,
};
pub use search::{search_filter, terms_from_map, SearchKind, SearchTerm};
pub use statement::{
    Conflict, DeleteStatement, Direction, InsertStatement, Limit, OrderBy, Projection,
    SelectStatement, UpdateStatement,
};
pub use table::{Fetch, FetchOptions, Table};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
