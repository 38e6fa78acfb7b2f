//! Sample structures and a table harness.
//!
//! Every table here runs against a [`RecordingExecutor`], so tests can
//! script host responses and assert on the exact SQL sent.

use restoc_codec::Value;
use restoc_core::{
    AutoPrimary, ChangesMode, FieldNode, IndexDef, NodeClass, Record, ScalarNode, ScalarType,
    Structure, Table,
};
use restoc_exec::{RecordingExecutor, Row};
use std::io::Write;
use std::ops::Deref;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// `app.users`: auto-increment key, a unique email, a JSON `meta` hash.
pub fn users_structure() -> Structure {
    Structure::builder("primary", "app", "users")
        .primary("_id")
        .auto_primary(AutoPrimary::AutoIncrement)
        .field("_id", FieldNode::scalar(ScalarType::Uint))
        .field(
            "email",
            FieldNode::Scalar(ScalarNode::new(ScalarType::String).with_maximum(127)),
        )
        .field(
            "name",
            FieldNode::Scalar(
                ScalarNode::new(ScalarType::String)
                    .optional()
                    .with_maximum(64),
            ),
        )
        .field("verified", FieldNode::scalar(ScalarType::Bool))
        .field(
            "age",
            FieldNode::Scalar(ScalarNode::new(ScalarType::Uint).optional()),
        )
        .field("meta", FieldNode::json(NodeClass::Hash))
        .index(IndexDef::unique("ui_email", ["email"]).expect("valid index"))
        .build()
        .expect("valid users structure")
}

/// `app.posts`: UUID key generated by the host, revisions on `_rev` and a
/// change history with the given required fields (plain history when
/// empty).
pub fn audited_structure(required: &[&str]) -> Structure {
    let changes = if required.is_empty() {
        ChangesMode::On
    } else {
        ChangesMode::Required(required.iter().map(|s| (*s).to_string()).collect())
    };
    Structure::builder("primary", "app", "posts")
        .primary("_id")
        .auto_primary(AutoPrimary::Generated("UUID()".to_string()))
        .field("_id", FieldNode::scalar(ScalarType::Uuid))
        .field(
            "title",
            FieldNode::Scalar(ScalarNode::new(ScalarType::String).with_maximum(255)),
        )
        .field(
            "_rev",
            FieldNode::Scalar(
                ScalarNode::new(ScalarType::String)
                    .optional()
                    .with_maximum(40),
            ),
        )
        .changes(changes)
        .revisions("_rev")
        .build()
        .expect("valid posts structure")
}

/// JSON definition equivalent to [`users_structure`].
pub const USERS_JSON: &str = r#"{
    "db": "app",
    "table": "users",
    "primary": "_id",
    "auto_primary": true,
    "fields": [
        {"name": "_id", "type": "uint"},
        {"name": "email", "type": "string", "maximum": 127},
        {"name": "name", "type": "string", "maximum": 64, "optional": true},
        {"name": "verified", "type": "bool"},
        {"name": "age", "type": "uint", "optional": true},
        {"name": "meta", "type": "hash", "sql": {"json": true}}
    ],
    "indexes": [
        {"name": "ui_email", "type": "unique", "fields": "email"}
    ]
}"#;

/// Writes a structure definition to a temporary file.
pub fn structure_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(json.as_bytes())
        .expect("Failed to write structure");
    file
}

/// Builds a row from pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// A table bound to a recording executor.
pub struct TestTable {
    /// The executor, for scripting responses and reading the log.
    pub exec: Arc<RecordingExecutor>,
    /// The table.
    pub table: Table,
}

impl TestTable {
    /// Binds `structure` to a fresh recording executor.
    pub fn new(structure: Structure) -> Self {
        let exec = Arc::new(RecordingExecutor::new());
        let table = Table::new(structure, exec.clone());
        Self { exec, table }
    }

    /// Every statement sent so far.
    pub fn sql(&self) -> Vec<String> {
        self.exec.sql()
    }

    /// Wraps `pairs` as a record loaded from the host.
    pub fn loaded(&self, pairs: &[(&str, Value)]) -> Record {
        self.table.from_row(row(pairs))
    }
}

impl Deref for TestTable {
    type Target = Table;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}
