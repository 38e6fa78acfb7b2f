//! Per record-type table description.

use super::node::{FieldNode, ScalarType};
use crate::config::Custom;
use crate::error::{RecordError, RecordResult};
use std::collections::{BTreeMap, HashSet};

/// How the primary key is populated on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AutoPrimary {
    /// The caller supplies it.
    #[default]
    None,
    /// The engine generates it (`auto_increment`).
    AutoIncrement,
    /// An SQL expression generates it, e.g. `UUID()`.
    Generated(String),
}

impl AutoPrimary {
    /// Returns true unless the caller supplies the key.
    pub fn is_auto(&self) -> bool {
        !matches!(self, AutoPrimary::None)
    }
}

/// Change-audit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChangesMode {
    /// No audit table.
    #[default]
    Off,
    /// Every mutation writes an audit entry.
    On,
    /// Every mutation writes an audit entry carrying these caller fields.
    Required(Vec<String>),
}

impl ChangesMode {
    /// Returns true if mutations are audited.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ChangesMode::Off)
    }

    /// Returns the fields callers must supply.
    pub fn required(&self) -> &[String] {
        match self {
            ChangesMode::Required(fields) => fields,
            _ => &[],
        }
    }
}

/// One column of an index, optionally a prefix of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Field name.
    pub field: String,
    /// Prefix length.
    pub prefix: Option<u32>,
}

impl IndexColumn {
    /// Parses `field` or `field:length`.
    ///
    /// # Errors
    ///
    /// Returns an error if the length isn't a number.
    pub fn parse(column: &str) -> RecordResult<Self> {
        match column.split_once(':') {
            None => Ok(Self {
                field: column.to_string(),
                prefix: None,
            }),
            Some((field, len)) => {
                let prefix = len.trim().parse().map_err(|_| {
                    RecordError::invalid_structure(format!("invalid index prefix \"{column}\""))
                })?;
                Ok(Self {
                    field: field.to_string(),
                    prefix: Some(prefix),
                })
            }
        }
    }
}

/// A named secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Index kind keyword (`index`, `unique`, `fulltext`, ...).
    pub kind: String,
    /// Indexed columns, in order.
    pub columns: Vec<IndexColumn>,
}

impl IndexDef {
    /// A plain index over `columns` (`field` or `field:length`).
    ///
    /// # Errors
    ///
    /// Returns an error if a prefix length isn't a number.
    pub fn new<S: AsRef<str>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> RecordResult<Self> {
        Ok(Self {
            name: name.into(),
            kind: "index".to_string(),
            columns: columns
                .into_iter()
                .map(|c| IndexColumn::parse(c.as_ref()))
                .collect::<RecordResult<_>>()?,
        })
    }

    /// A unique index over `columns`.
    ///
    /// # Errors
    ///
    /// Returns an error if a prefix length isn't a number.
    pub fn unique<S: AsRef<str>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> RecordResult<Self> {
        Ok(Self::new(name, columns)?.with_kind("unique"))
    }

    /// Sets the kind keyword.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// How a column is decoded after being read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// 0/1 to boolean.
    Bool,
    /// JSON text to a structured value.
    Json,
}

/// The static description of one record type.
///
/// Immutable once built. Field order is declaration order and drives
/// projections and INSERT column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    host: String,
    db: String,
    table: String,
    primary: Option<String>,
    auto_primary: AutoPrimary,
    fields: Vec<(String, FieldNode)>,
    positions: BTreeMap<String, usize>,
    indexes: Vec<IndexDef>,
    changes: ChangesMode,
    revision_field: Option<String>,
    create: Option<Vec<String>>,
    engine: Option<String>,
    charset: Option<String>,
    collate: Option<String>,
    to_process: Vec<(String, Decode)>,
}

impl Structure {
    /// Starts a structure for `` `db`.`table` `` on `host`.
    pub fn builder(
        host: impl Into<String>,
        db: impl Into<String>,
        table: impl Into<String>,
    ) -> StructureBuilder {
        StructureBuilder {
            host: host.into(),
            db: db.into(),
            table: table.into(),
            primary: None,
            auto_primary: AutoPrimary::None,
            fields: Vec::new(),
            indexes: Vec::new(),
            changes: ChangesMode::Off,
            revision_field: None,
            create: None,
            engine: None,
            charset: None,
            collate: None,
        }
    }

    /// Host statements run on.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Database name.
    pub fn db(&self) -> &str {
        &self.db
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `` `db`.`table` ``.
    pub fn qualified(&self) -> String {
        format!("`{}`.`{}`", self.db, self.table)
    }

    /// `` `db`.`table_changes` ``.
    pub fn changes_table(&self) -> String {
        format!("`{}`.`{}_changes`", self.db, self.table)
    }

    /// Primary key field, if any.
    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    /// Primary key field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingPrimaryKey`] if the structure has none.
    pub fn require_primary(&self) -> RecordResult<&str> {
        self.primary()
            .ok_or_else(|| RecordError::MissingPrimaryKey {
                field: String::new(),
            })
    }

    /// Primary key population policy.
    pub fn auto_primary(&self) -> &AutoPrimary {
        &self.auto_primary
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldNode)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field.
    pub fn field(&self, name: &str) -> Option<&FieldNode> {
        self.positions.get(name).map(|&i| &self.fields[i].1)
    }

    /// Looks up a field, failing if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`].
    pub fn require_field(&self, name: &str) -> RecordResult<&FieldNode> {
        self.field(name)
            .ok_or_else(|| RecordError::unknown_field(name, format!("{}.{}", self.db, self.table)))
    }

    /// Returns true if `name` is a field.
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Secondary indexes.
    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    /// Change-audit mode.
    pub fn changes(&self) -> &ChangesMode {
        &self.changes
    }

    /// Revision field, if revisions are kept.
    pub fn revision_field(&self) -> Option<&str> {
        self.revision_field.as_deref()
    }

    /// Column order for `CREATE TABLE`, primary key excluded.
    pub fn create_order(&self) -> Option<&[String]> {
        self.create.as_deref()
    }

    /// Storage engine.
    pub fn engine(&self) -> &str {
        self.engine.as_deref().unwrap_or("InnoDB")
    }

    /// Table charset.
    pub fn charset(&self) -> &str {
        self.charset.as_deref().unwrap_or("utf8")
    }

    /// Table collation.
    pub fn collate(&self) -> &str {
        self.collate.as_deref().unwrap_or("utf8_bin")
    }

    /// Fields decoded in place after every read.
    pub fn to_process(&self) -> &[(String, Decode)] {
        &self.to_process
    }

    /// Returns a copy with the host and database overridden.
    #[must_use]
    pub fn customize(&self, custom: &Custom) -> Self {
        let mut out = self.clone();
        if let Some(host) = &custom.host {
            out.host.clone_from(host);
        }
        out.db = custom.db_name(&self.db);
        out
    }
}

/// Builder for [`Structure`].
#[derive(Debug, Clone)]
pub struct StructureBuilder {
    host: String,
    db: String,
    table: String,
    primary: Option<String>,
    auto_primary: AutoPrimary,
    fields: Vec<(String, FieldNode)>,
    indexes: Vec<IndexDef>,
    changes: ChangesMode,
    revision_field: Option<String>,
    create: Option<Vec<String>>,
    engine: Option<String>,
    charset: Option<String>,
    collate: Option<String>,
}

impl StructureBuilder {
    /// Declares the primary key field.
    #[must_use]
    pub fn primary(mut self, field: impl Into<String>) -> Self {
        self.primary = Some(field.into());
        self
    }

    /// Sets the primary key population policy.
    #[must_use]
    pub fn auto_primary(mut self, auto: AutoPrimary) -> Self {
        self.auto_primary = auto;
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, node: FieldNode) -> Self {
        self.fields.push((name.into(), node));
        self
    }

    /// Appends an index.
    #[must_use]
    pub fn index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    /// Sets the change-audit mode.
    #[must_use]
    pub fn changes(mut self, changes: ChangesMode) -> Self {
        self.changes = changes;
        self
    }

    /// Keeps revisions in `field`.
    #[must_use]
    pub fn revisions(mut self, field: impl Into<String>) -> Self {
        self.revision_field = Some(field.into());
        self
    }

    /// Sets the `CREATE TABLE` column order.
    #[must_use]
    pub fn create_order<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.create = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Sets the table charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the table collation.
    #[must_use]
    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    /// Validates and builds the structure.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidStructure`] if a referenced field is
    /// missing or declared twice, or if the audit or auto-primary settings
    /// need a primary key that isn't there.
    pub fn build(self) -> RecordResult<Structure> {
        let name = format!("{}.{}", self.db, self.table);
        let invalid = |msg: String| Err(RecordError::invalid_structure(format!("{name}: {msg}")));

        let mut positions = BTreeMap::new();
        for (i, (field, _)) in self.fields.iter().enumerate() {
            if positions.insert(field.clone(), i).is_some() {
                return invalid(format!("field \"{field}\" declared twice"));
            }
        }

        if let Some(primary) = &self.primary {
            if !positions.contains_key(primary) {
                return invalid(format!("primary key \"{primary}\" is not a field"));
            }
        } else {
            if self.auto_primary.is_auto() {
                return invalid("auto primary requires a primary key".to_string());
            }
            if self.changes.is_enabled() {
                return invalid("change audit requires a primary key".to_string());
            }
            if self.revision_field.is_some() {
                return invalid("revisions require a primary key".to_string());
            }
        }

        if let AutoPrimary::Generated(expr) = &self.auto_primary {
            if expr.trim().is_empty() {
                return invalid("empty auto primary expression".to_string());
            }
        }

        if let ChangesMode::Required(fields) = &self.changes {
            if fields.is_empty() {
                return invalid("required change fields can't be empty".to_string());
            }
        }

        if let Some(rev) = &self.revision_field {
            match positions.get(rev).map(|&i| &self.fields[i].1) {
                None => return invalid(format!("revision field \"{rev}\" is not a field")),
                Some(node) if node.scalar_type() != Some(ScalarType::String) => {
                    return invalid(format!("revision field \"{rev}\" must be a string"));
                }
                Some(_) => {}
            }
        }

        if let Some(order) = &self.create {
            let mut seen = HashSet::new();
            for field in order {
                if !positions.contains_key(field) {
                    return invalid(format!("create field \"{field}\" is not a field"));
                }
                if !seen.insert(field) {
                    return invalid(format!("create field \"{field}\" listed twice"));
                }
            }
        }

        for index in &self.indexes {
            if index.columns.is_empty() {
                return invalid(format!("index \"{}\" has no columns", index.name));
            }
            for column in &index.columns {
                if !positions.contains_key(&column.field) {
                    return invalid(format!(
                        "index \"{}\" references unknown field \"{}\"",
                        index.name, column.field
                    ));
                }
            }
        }

        let to_process = self
            .fields
            .iter()
            .filter_map(|(field, node)| {
                if node.is_json() {
                    Some((field.clone(), Decode::Json))
                } else if node.scalar_type() == Some(ScalarType::Bool) {
                    Some((field.clone(), Decode::Bool))
                } else {
                    None
                }
            })
            .collect();

        Ok(Structure {
            host: self.host,
            db: self.db,
            table: self.table,
            primary: self.primary,
            auto_primary: self.auto_primary,
            fields: self.fields,
            positions,
            indexes: self.indexes,
            changes: self.changes,
            revision_field: self.revision_field,
            create: self.create,
            engine: self.engine,
            charset: self.charset,
            collate: self.collate,
            to_process,
        })
    }
}
