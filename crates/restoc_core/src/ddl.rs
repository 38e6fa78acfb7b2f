//! Table and database DDL.

use crate::error::{RecordError, RecordResult};
use crate::escape::Escaper;
use crate::schema::{AutoPrimary, FieldNode, IndexDef, ScalarNode, ScalarType, Structure};
use crate::table::Table;
use restoc_codec::Value;
use restoc_exec::{CommandExecutor, Sql};
use tracing::info;

const LONGTEXT: i64 = 4_294_967_295;
const MEDIUMTEXT: i64 = 16_777_215;
const TEXT: i64 = 65_535;

/// Returns the MySQL column type for `node`, ignoring any SQL hint.
///
/// # Errors
///
/// Returns [`RecordError::InvalidFieldType`] for `any`,
/// [`RecordError::InvalidStructure`] for strings without a maximum, and
/// [`RecordError::UnsupportedNode`] for structured fields not stored as
/// JSON.
pub fn node_to_type(esc: &Escaper<'_>, field: &str, node: &FieldNode) -> RecordResult<String> {
    match node {
        FieldNode::Structured(n) if n.sql.json => Ok("text".to_string()),
        FieldNode::Structured(n) => Err(RecordError::UnsupportedNode {
            class: n.class.to_string(),
            field: field.to_string(),
        }),
        FieldNode::Scalar(n) => scalar_type(esc, field, node, n),
    }
}

fn scalar_type(
    esc: &Escaper<'_>,
    field: &str,
    node: &FieldNode,
    n: &ScalarNode,
) -> RecordResult<String> {
    let fixed = match n.kind {
        ScalarType::Any => {
            return Err(RecordError::InvalidFieldType {
                type_name: "any".to_string(),
                node_class: "column".to_string(),
            })
        }
        ScalarType::String | ScalarType::Base64 => return string_type(esc, field, node, n),
        ScalarType::Bool => "tinyint(1) unsigned",
        ScalarType::Date => "date",
        ScalarType::Datetime => "datetime",
        ScalarType::Decimal => "decimal",
        ScalarType::Float => "double",
        ScalarType::Int => "integer",
        ScalarType::Ip => "char(15)",
        ScalarType::Json => "text",
        ScalarType::Md5 => "char(32)",
        ScalarType::Price => "decimal(8,2)",
        ScalarType::Time => "time",
        ScalarType::Timestamp => "timestamp",
        ScalarType::Uint => "integer unsigned",
        ScalarType::Uuid | ScalarType::Uuid4 => "char(36)",
    };
    Ok(fixed.to_string())
}

fn string_type(
    esc: &Escaper<'_>,
    field: &str,
    node: &FieldNode,
    n: &ScalarNode,
) -> RecordResult<String> {
    if let Some(options) = &n.options {
        let quoted = options
            .iter()
            .map(|o| esc.value(field, node, o))
            .collect::<RecordResult<Vec<_>>>()?;
        return Ok(format!("enum({})", quoted.join(",")));
    }

    let Some(max) = n.maximum.as_ref().and_then(Value::as_integer) else {
        return Err(RecordError::invalid_structure(format!(
            "{} field \"{field}\" needs a maximum or an explicit sql type",
            n.kind
        )));
    };
    let min = n.minimum.as_ref().and_then(Value::as_integer);

    Ok(match max {
        _ if min == Some(max) => format!("char({max})"),
        LONGTEXT => "longtext".to_string(),
        MEDIUMTEXT => "mediumtext".to_string(),
        TEXT => "text".to_string(),
        _ => format!("varchar({max})"),
    })
}

fn column_type(esc: &Escaper<'_>, field: &str, node: &FieldNode) -> RecordResult<String> {
    match &node.sql().column_type {
        Some(t) => Ok(t.clone()),
        None => node_to_type(esc, field, node),
    }
}

fn index_line(index: &IndexDef) -> String {
    let columns = index
        .columns
        .iter()
        .map(|c| match c.prefix {
            Some(len) => format!("`{}`({len})", c.field),
            None => format!("`{}`", c.field),
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{} `{}` ({columns})", index.kind, index.name)
}

fn table_options(s: &Structure) -> String {
    format!(
        "ENGINE={} CHARSET={} COLLATE={}",
        s.engine(),
        s.charset(),
        s.collate()
    )
}

/// Renders the CREATE TABLE statements for `structure`: the table itself,
/// followed by its `_changes` table when change audit is on.
///
/// Columns follow the create order, or declaration order if none was
/// given, with the primary key first.
///
/// # Errors
///
/// Returns [`RecordError::InvalidStructure`] if the create order misses a
/// field, or any error from [`node_to_type`].
pub fn create_statements(structure: &Structure, esc: &Escaper<'_>) -> RecordResult<Vec<String>> {
    let s = structure;
    let primary = s.primary();

    let order: Vec<&str> = match s.create_order() {
        Some(order) => {
            let missing: Vec<&str> = s
                .field_names()
                .filter(|f| Some(*f) != primary && !order.iter().any(|o| o == f))
                .collect();
            if !missing.is_empty() {
                return Err(RecordError::invalid_structure(format!(
                    "create order for {} is missing `{}`",
                    s.qualified(),
                    missing.join("`, `")
                )));
            }
            order.iter().map(String::as_str).collect()
        }
        None => s.field_names().collect(),
    };

    let mut lines = Vec::with_capacity(order.len() + 1);
    for field in order.into_iter().filter(|f| Some(*f) != primary) {
        let node = s.require_field(field)?;
        let opts = match &node.sql().opts {
            Some(o) => o.clone(),
            None if node.is_optional() => "null".to_string(),
            None => "not null".to_string(),
        };
        lines.push(format!("`{field}` {} {opts}", column_type(esc, field, node)?));
    }

    let mut indexes = Vec::with_capacity(s.indexes().len() + 1);
    let mut id_type = None;
    if let Some(pk) = primary {
        let node = s.require_field(pk)?;
        let ty = column_type(esc, pk, node)?;
        let opts = node.sql().opts.clone().unwrap_or_else(|| "not null".to_string());
        let auto = if *s.auto_primary() == AutoPrimary::AutoIncrement {
            "auto_increment "
        } else {
            ""
        };
        lines.insert(0, format!("`{pk}` {ty} {auto}{opts}"));
        indexes.push(format!("primary key (`{pk}`)"));
        id_type = Some(ty);
    }
    indexes.extend(s.indexes().iter().map(index_line));

    let body = lines.into_iter().chain(indexes).collect::<Vec<_>>().join(", ");
    let mut out = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} ({body}) {}",
        s.qualified(),
        table_options(s)
    )];

    if let (Some(pk), Some(ty)) = (primary, id_type) {
        if s.changes().is_enabled() {
            out.push(format!(
                "CREATE TABLE IF NOT EXISTS {} (`{pk}` {ty} not null, \
                 `created` datetime not null DEFAULT CURRENT_TIMESTAMP, \
                 `items` text not null, index `{pk}` (`{pk}`)) {}",
                s.changes_table(),
                table_options(s)
            ));
        }
    }
    Ok(out)
}

/// Renders the DROP TABLE statements for `structure`.
pub fn drop_statements(structure: &Structure) -> Vec<String> {
    let mut out = vec![format!("DROP TABLE {}", structure.qualified())];
    if structure.changes().is_enabled() {
        out.push(format!("DROP TABLE {}", structure.changes_table()));
    }
    out
}

impl Table {
    /// Creates the table, and its `_changes` table when change audit is on.
    ///
    /// # Errors
    ///
    /// Same as [`create_statements`], or an executor error.
    pub fn table_create(&self) -> RecordResult<()> {
        for sql in create_statements(self.structure(), &self.escaper())? {
            self.execute(sql)?;
        }
        info!(table = %self.structure().qualified(), "table created");
        Ok(())
    }

    /// Drops the table, and its `_changes` table when change audit is on.
    ///
    /// # Errors
    ///
    /// Returns an executor error.
    pub fn table_drop(&self) -> RecordResult<()> {
        for sql in drop_statements(self.structure()) {
            self.execute(sql)?;
        }
        info!(table = %self.structure().qualified(), "table dropped");
        Ok(())
    }
}

/// Renders `CREATE DATABASE`. The collation is only used with a charset.
pub fn db_create_statement(name: &str, charset: Option<&str>, collate: Option<&str>) -> String {
    let mut sql = format!("CREATE DATABASE IF NOT EXISTS `{name}`");
    if let Some(charset) = charset {
        sql.push_str(" DEFAULT CHARACTER SET ");
        sql.push_str(charset);
        if let Some(collate) = collate {
            sql.push_str(" COLLATE ");
            sql.push_str(collate);
        }
    }
    sql
}

/// Creates database `name` on `host` if it doesn't exist.
///
/// # Errors
///
/// Returns an executor error.
pub fn db_create(
    exec: &dyn CommandExecutor,
    host: &str,
    name: &str,
    charset: Option<&str>,
    collate: Option<&str>,
) -> RecordResult<()> {
    exec.execute(host, &Sql::from(db_create_statement(name, charset, collate)))?;
    info!(host, db = name, "database created");
    Ok(())
}

/// Drops database `name` on `host` if it exists.
///
/// # Errors
///
/// Returns an executor error.
pub fn db_drop(exec: &dyn CommandExecutor, host: &str, name: &str) -> RecordResult<()> {
    exec.execute(host, &Sql::from(format!("DROP DATABASE IF EXISTS `{name}`")))?;
    info!(host, db = name, "database dropped");
    Ok(())
}
