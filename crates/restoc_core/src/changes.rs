//! Change audit: the `<table>_changes` history.

use crate::error::{RecordError, RecordResult};
use crate::escape::Escaper;
use crate::schema::{ChangesMode, Structure};
use crate::statement::InsertStatement;
use restoc_codec::{to_json, Value, ValueMap};
use restoc_exec::{CommandExecutor, Sql};

/// Caller-supplied data for the audit entry of one mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuditInfo {
    /// Nothing supplied.
    #[default]
    None,
    /// Extra fields merged into the entry.
    Fields(ValueMap),
    /// Don't write an entry for this save.
    Skip,
}

impl AuditInfo {
    /// Supplies extra fields from pairs.
    pub fn fields<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        AuditInfo::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<ValueMap> for AuditInfo {
    fn from(map: ValueMap) -> Self {
        AuditInfo::Fields(map)
    }
}

/// One row of a `<table>_changes` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    /// Primary key of the audited record.
    pub id: Value,
    /// When the entry was written.
    pub created: Value,
    /// Decoded `{old, new, ...}` payload.
    pub items: Value,
}

/// Picks the fields the audit mode requires out of `supplied`.
///
/// # Errors
///
/// Returns [`RecordError::MissingAuditFields`] if any required field is
/// absent.
pub fn required_fields(mode: &ChangesMode, supplied: Option<&ValueMap>) -> RecordResult<ValueMap> {
    let required = mode.required();
    let empty = ValueMap::new();
    let supplied = supplied.unwrap_or(&empty);

    let missing: Vec<String> = required
        .iter()
        .filter(|k| !supplied.contains_key(*k))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(RecordError::MissingAuditFields { fields: missing });
    }

    Ok(required
        .iter()
        .filter_map(|k| supplied.get(k).map(|v| (k.clone(), v.clone())))
        .collect())
}

/// Resolves the extra fields for an audit entry before any SQL runs.
///
/// Returns `None` when no entry should be written.
pub(crate) fn prepare(structure: &Structure, info: &AuditInfo) -> RecordResult<Option<ValueMap>> {
    let mode = structure.changes();
    if !mode.is_enabled() {
        return Ok(None);
    }
    match info {
        AuditInfo::Skip => Ok(None),
        AuditInfo::None => required_fields(mode, None).map(Some),
        AuditInfo::Fields(map) => required_fields(mode, Some(map)).map(Some),
    }
}

/// Returns the `(old, new)` values of every field that differs.
///
/// Nested maps are compared key by key, so only the changed part of a
/// structured field is reported.
pub fn diff(old: &ValueMap, new: &ValueMap) -> (ValueMap, ValueMap) {
    let mut out_old = ValueMap::new();
    let mut out_new = ValueMap::new();

    for (key, before) in old {
        match new.get(key) {
            None => {
                out_old.insert(key.clone(), before.clone());
                out_new.insert(key.clone(), Value::Null);
            }
            Some(after) if after == before => {}
            Some(Value::Map(after)) => {
                if let Value::Map(before) = before {
                    let (o, n) = diff(before, after);
                    out_old.insert(key.clone(), Value::Map(o));
                    out_new.insert(key.clone(), Value::Map(n));
                } else {
                    out_old.insert(key.clone(), before.clone());
                    out_new.insert(key.clone(), Value::Map(after.clone()));
                }
            }
            Some(after) => {
                out_old.insert(key.clone(), before.clone());
                out_new.insert(key.clone(), after.clone());
            }
        }
    }
    for (key, after) in new {
        if !old.contains_key(key) {
            out_old.insert(key.clone(), Value::Null);
            out_new.insert(key.clone(), after.clone());
        }
    }

    (out_old, out_new)
}

/// Builds the `{old, new, ...extra}` payload.
pub fn entry(old: Value, new: Value, extra: ValueMap) -> Value {
    let mut items = extra;
    items.insert("old".to_string(), old);
    items.insert("new".to_string(), new);
    Value::Map(items)
}

/// Inserts one audit row for `id`.
pub(crate) fn insert(
    structure: &Structure,
    exec: &dyn CommandExecutor,
    id: &Value,
    items: &Value,
) -> RecordResult<u64> {
    let primary = structure.require_primary()?;
    let node = structure.require_field(primary)?;
    let esc = Escaper::new(exec, structure.host());

    let sql = InsertStatement::new(structure.changes_table(), [primary, "created", "items"])
        .row(vec![
            esc.value(primary, node, id)?,
            "CURRENT_TIMESTAMP".to_string(),
            esc.quote(&to_json(items)?)?,
        ])
        .build();

    tracing::debug!(table = %structure.changes_table(), "writing change entry");
    Ok(exec.execute(structure.host(), &Sql::from(sql))?)
}
