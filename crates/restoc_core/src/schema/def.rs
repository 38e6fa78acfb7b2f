//! Structure definitions loaded from JSON.
//!
//! ```json
//! {
//!   "host": "primary",
//!   "db": "app",
//!   "table": "users",
//!   "primary": "_id",
//!   "auto_primary": "UUID()",
//!   "changes": ["user"],
//!   "revisions": "_rev",
//!   "create": ["email", "name", "_rev"],
//!   "fields": [
//!     {"name": "_id", "type": "uuid"},
//!     {"name": "email", "type": "string", "maximum": 127},
//!     {"name": "name", "type": "hash", "sql": {"json": true}},
//!     {"name": "_rev", "type": "string", "maximum": 40, "optional": true}
//!   ],
//!   "indexes": [
//!     {"name": "ui_email", "type": "unique", "fields": "email"}
//!   ]
//! }
//! ```

use super::node::{FieldNode, NodeClass, ScalarNode, ScalarType, SqlHint, StructuredNode};
use super::structure::{AutoPrimary, ChangesMode, IndexColumn, IndexDef, Structure};
use crate::error::{RecordError, RecordResult};
use restoc_codec::Value;
use serde::Deserialize;
use std::path::Path;

/// `auto_primary` as written in a definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AutoPrimaryDef {
    /// `true` for auto-increment, `false` for none.
    Flag(bool),
    /// A generating expression.
    Expression(String),
}

/// `changes` as written in a definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChangesDef {
    /// On or off.
    Flag(bool),
    /// On, with required caller fields.
    Required(Vec<String>),
}

/// `sql` hint as written in a definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SqlHintDef {
    /// Shorthand for `{"type": ...}`.
    Type(String),
    /// Full form.
    Full {
        /// Column type.
        #[serde(default, rename = "type")]
        column_type: Option<String>,
        /// Column options.
        #[serde(default)]
        opts: Option<String>,
        /// JSON storage flag.
        #[serde(default)]
        json: bool,
    },
}

impl From<SqlHintDef> for SqlHint {
    fn from(def: SqlHintDef) -> Self {
        match def {
            SqlHintDef::Type(t) => SqlHint::default().with_type(t),
            SqlHintDef::Full {
                column_type,
                opts,
                json,
            } => SqlHint {
                column_type,
                opts,
                json,
            },
        }
    }
}

/// One field as written in a definition.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// A scalar type name, or `array`, `hash`, `parent`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether `NULL` is allowed.
    #[serde(default)]
    pub optional: bool,
    /// Lower bound.
    #[serde(default)]
    pub minimum: Option<serde_json::Value>,
    /// Upper bound.
    #[serde(default)]
    pub maximum: Option<serde_json::Value>,
    /// Allowed values.
    #[serde(default)]
    pub options: Option<Vec<serde_json::Value>>,
    /// Storage hints.
    #[serde(default)]
    pub sql: Option<SqlHintDef>,
}

impl FieldDef {
    /// Converts the definition into a node.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidFieldType`] for unknown types.
    pub fn into_node(self) -> RecordResult<FieldNode> {
        let sql = self.sql.map(SqlHint::from).unwrap_or_default();

        if let Some(class) = NodeClass::parse(&self.type_name) {
            return Ok(FieldNode::Structured(StructuredNode {
                class,
                optional: self.optional,
                sql,
            }));
        }

        let kind: ScalarType = self.type_name.parse()?;
        Ok(FieldNode::Scalar(ScalarNode {
            kind,
            optional: self.optional,
            minimum: self.minimum.map(Value::from),
            maximum: self.maximum.map(Value::from),
            options: self
                .options
                .map(|opts| opts.into_iter().map(Value::from).collect()),
            sql,
        }))
    }
}

/// Index columns as written in a definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndexFieldsDef {
    /// A single column.
    One(String),
    /// Several columns.
    Many(Vec<String>),
}

/// One index as written in a definition.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDefinition {
    /// Index name.
    pub name: String,
    /// Kind keyword, `index` when omitted.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Columns, the index name when omitted.
    #[serde(default)]
    pub fields: Option<IndexFieldsDef>,
}

impl IndexDefinition {
    fn into_index(self) -> RecordResult<IndexDef> {
        let columns = match self.fields {
            None => vec![self.name.clone()],
            Some(IndexFieldsDef::One(f)) => vec![f],
            Some(IndexFieldsDef::Many(fs)) => fs,
        };
        let columns = columns
            .iter()
            .map(|c| IndexColumn::parse(c))
            .collect::<RecordResult<Vec<_>>>()?;
        Ok(IndexDef {
            name: self.name,
            kind: self.kind.unwrap_or_else(|| "index".to_string()),
            columns,
        })
    }
}

fn default_host() -> String {
    "primary".to_string()
}

/// A whole structure as written in a definition.
#[derive(Debug, Clone, Deserialize)]
pub struct StructureDef {
    /// Host name, `primary` when omitted.
    #[serde(default = "default_host")]
    pub host: String,
    /// Database name.
    pub db: String,
    /// Table name.
    pub table: String,
    /// Primary key field.
    #[serde(default)]
    pub primary: Option<String>,
    /// Primary key population policy.
    #[serde(default)]
    pub auto_primary: Option<AutoPrimaryDef>,
    /// Change-audit mode.
    #[serde(default)]
    pub changes: Option<ChangesDef>,
    /// Revision field.
    #[serde(default)]
    pub revisions: Option<String>,
    /// `CREATE TABLE` column order.
    #[serde(default)]
    pub create: Option<Vec<String>>,
    /// Storage engine.
    #[serde(default)]
    pub engine: Option<String>,
    /// Table charset.
    #[serde(default)]
    pub charset: Option<String>,
    /// Table collation.
    #[serde(default)]
    pub collate: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Secondary indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl StructureDef {
    /// Parses a definition from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidStructure`] on malformed JSON.
    pub fn from_json(text: &str) -> RecordResult<Self> {
        serde_json::from_str(text).map_err(|e| RecordError::invalid_structure(e.to_string()))
    }

    /// Validates the definition and builds a [`Structure`].
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types or an inconsistent structure.
    pub fn build(self) -> RecordResult<Structure> {
        let mut builder = Structure::builder(self.host, self.db, self.table);

        if let Some(primary) = self.primary {
            builder = builder.primary(primary);
        }
        builder = builder.auto_primary(match self.auto_primary {
            None | Some(AutoPrimaryDef::Flag(false)) => AutoPrimary::None,
            Some(AutoPrimaryDef::Flag(true)) => AutoPrimary::AutoIncrement,
            Some(AutoPrimaryDef::Expression(expr)) => AutoPrimary::Generated(expr),
        });
        builder = builder.changes(match self.changes {
            None | Some(ChangesDef::Flag(false)) => ChangesMode::Off,
            Some(ChangesDef::Flag(true)) => ChangesMode::On,
            Some(ChangesDef::Required(fields)) => ChangesMode::Required(fields),
        });
        if let Some(rev) = self.revisions {
            builder = builder.revisions(rev);
        }
        if let Some(create) = self.create {
            builder = builder.create_order(create);
        }
        if let Some(engine) = self.engine {
            builder = builder.engine(engine);
        }
        if let Some(charset) = self.charset {
            builder = builder.charset(charset);
        }
        if let Some(collate) = self.collate {
            builder = builder.collate(collate);
        }
        for field in self.fields {
            let name = field.name.clone();
            builder = builder.field(name, field.into_node()?);
        }
        for index in self.indexes {
            builder = builder.index(index.into_index()?);
        }

        builder.build()
    }
}

impl Structure {
    /// Builds a structure from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON, unknown types or an
    /// inconsistent structure.
    pub fn from_json(text: &str) -> RecordResult<Self> {
        StructureDef::from_json(text)?.build()
    }

    /// Builds a structure from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, or for the same reasons
    /// as [`Structure::from_json`].
    pub fn from_json_file(path: impl AsRef<Path>) -> RecordResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RecordError::invalid_structure(format!("can't read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const USERS: &str = r#"{
        "db": "app",
        "table": "users",
        "primary": "_id",
        "auto_primary": "UUID()",
        "changes": ["user"],
        "revisions": "_rev",
        "create": ["email", "tags", "_rev"],
        "fields": [
            {"name": "_id", "type": "uuid"},
            {"name": "email", "type": "string", "maximum": 127},
            {"name": "tags", "type": "array", "optional": true, "sql": {"json": true}},
            {"name": "_rev", "type": "string", "optional": true, "sql": "varchar(40)"}
        ],
        "indexes": [
            {"name": "ui_email", "type": "unique", "fields": "email"},
            {"name": "i_email_prefix", "fields": ["email:8"]}
        ]
    }"#;

    #[test]
    fn loads_full_definition() {
        let s = Structure::from_json(USERS).unwrap();
        assert_eq!(s.host(), "primary");
        assert_eq!(s.primary(), Some("_id"));
        assert_eq!(s.auto_primary(), &AutoPrimary::Generated("UUID()".into()));
        assert_eq!(s.changes().required(), &["user".to_string()]);
        assert_eq!(s.revision_field(), Some("_rev"));
        assert!(s.field("tags").unwrap().is_json());
        assert_eq!(
            s.field("_rev").unwrap().sql().column_type.as_deref(),
            Some("varchar(40)")
        );
        assert_eq!(s.indexes()[0].kind, "unique");
        assert_eq!(s.indexes()[1].kind, "index");
        assert_eq!(s.indexes()[1].columns[0].prefix, Some(8));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = Structure::from_json(
            r#"{"db":"a","table":"b","fields":[{"name":"x","type":"money"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::InvalidFieldType { .. }));
    }

    #[test]
    fn malformed_json_is_invalid_structure() {
        let err = Structure::from_json("{").unwrap_err();
        assert!(matches!(err, RecordError::InvalidStructure { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USERS.as_bytes()).unwrap();
        let s = Structure::from_json_file(file.path()).unwrap();
        assert_eq!(s.table(), "users");

        let err = Structure::from_json_file("/nonexistent/users.json").unwrap_err();
        assert!(err.to_string().contains("can't read"));
    }
}
