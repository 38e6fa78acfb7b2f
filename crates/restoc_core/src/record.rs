//! A single row with change tracking.

use crate::changes::{self, AuditInfo};
use crate::error::{RecordError, RecordResult};
use crate::revision;
use crate::schema::{AutoPrimary, Structure};
use crate::statement::{Conflict, DeleteStatement, InsertStatement, SelectStatement, UpdateStatement};
use crate::table::Table;
use restoc_codec::{Value, ValueMap};
use restoc_exec::{SelectMode, Sql};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Placeholder the host fills with a generated primary key.
const AUTO_PRIMARY_VAR: &str = "@_AUTO_PRIMARY";

/// Fields changed since the record was loaded or last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dirty {
    /// Only these fields.
    Fields(BTreeSet<String>),
    /// Every field, as for a record built by the caller.
    All,
}

impl Dirty {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        matches!(self, Dirty::Fields(f) if f.is_empty())
    }

    fn mark(&mut self, field: &str) {
        if let Dirty::Fields(fields) = self {
            fields.insert(field.to_string());
        }
    }

    fn clean() -> Self {
        Dirty::Fields(BTreeSet::new())
    }
}

/// One record of a [`Table`].
#[derive(Debug, Clone)]
pub struct Record {
    table: Table,
    values: ValueMap,
    dirty: Dirty,
    snapshot: Option<ValueMap>,
}

impl Record {
    pub(crate) fn new(table: Table, values: ValueMap) -> RecordResult<Self> {
        let structure = table.structure();
        for (field, value) in &values {
            structure.require_field(field)?.validate(field, value)?;
        }
        Ok(Self {
            table,
            values,
            dirty: Dirty::All,
            snapshot: None,
        })
    }

    pub(crate) fn from_row(table: Table, values: ValueMap) -> Self {
        Self {
            table,
            values,
            dirty: Dirty::clean(),
            snapshot: None,
        }
    }

    /// The table this record belongs to.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Returns the value of `field`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// All values.
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// Consumes the record, returning its values.
    pub fn into_values(self) -> ValueMap {
        self.values
    }

    /// The primary key value, if set.
    pub fn primary_key(&self) -> Option<&Value> {
        self.table
            .structure()
            .primary()
            .and_then(|p| self.values.get(p))
            .filter(|v| !v.is_null())
    }

    /// Returns true if the record has no primary key value yet.
    pub fn is_new(&self) -> bool {
        self.primary_key().is_none()
    }

    /// The fields changed since the last load or write.
    pub fn dirty(&self) -> &Dirty {
        &self.dirty
    }

    /// Returns true if there is anything to save.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Sets one field.
    ///
    /// [`Value::Literal`] values are accepted as-is and sent to the host
    /// unescaped.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`] or
    /// [`RecordError::InvalidValue`].
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> RecordResult<&mut Self> {
        let value = value.into();
        self.table
            .structure()
            .require_field(field)?
            .validate(field, &value)?;

        self.keep_snapshot();
        self.dirty.mark(field);
        self.values.insert(field.to_string(), value);
        Ok(self)
    }

    /// Sets a field to raw SQL, such as `NOW()`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`].
    pub fn set_literal(&mut self, field: &str, sql: impl Into<String>) -> RecordResult<&mut Self> {
        self.set(field, Value::literal(sql))
    }

    /// Replaces every value except the primary key, marking all fields
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`] or
    /// [`RecordError::InvalidValue`].
    pub fn replace(&mut self, values: ValueMap) -> RecordResult<&mut Self> {
        let table = self.table.clone();
        let structure = table.structure();
        for (field, value) in &values {
            structure.require_field(field)?.validate(field, value)?;
        }

        self.keep_snapshot();
        let primary = structure.primary().map(String::from);
        let kept = primary.as_ref().and_then(|p| self.values.remove(p));
        self.values = values;
        if let (Some(p), Some(v)) = (primary, kept) {
            self.values.insert(p, v);
        }
        self.dirty = Dirty::All;
        Ok(self)
    }

    pub(crate) fn put_unchecked(&mut self, field: &str, value: Value) {
        self.dirty.mark(field);
        self.values.insert(field.to_string(), value);
    }

    fn keep_snapshot(&mut self) {
        if self.snapshot.is_none() && self.table.structure().changes().is_enabled() {
            self.snapshot = Some(self.values.clone());
        }
    }

    fn write_change(&self, items: Value) -> RecordResult<()> {
        let id = self.primary_key().cloned().unwrap_or(Value::Null);
        changes::insert(self.table.structure(), self.table.executor(), &id, &items)?;
        Ok(())
    }

    /// Inserts the record.
    ///
    /// Returns the primary key, or `None` if the host inserted nothing
    /// (for example with [`Conflict::Ignore`]). Record types without a
    /// primary key return `Some(true)` on success.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingAuditFields`] before any SQL runs if
    /// the audit mode needs fields `audit` doesn't carry,
    /// [`RecordError::Duplicate`] on a key collision under
    /// [`Conflict::Error`], or another executor error.
    pub fn create(&mut self, conflict: &Conflict, audit: &AuditInfo) -> RecordResult<Option<Value>> {
        let table = self.table.clone();
        let s = table.structure();
        check_conflict(s, conflict)?;
        let extra = changes::prepare(s, audit)?;

        // Committed to the record only once the row is in.
        let mut values = self.values.clone();
        if let Some(rev) = s.revision_field() {
            let next = revision::next(None, &values, rev)?;
            values.insert(rev.to_string(), Value::Text(next));
        }

        let primary = s.primary();
        let generate = self.is_new() && s.auto_primary().is_auto();
        let esc = table.escaper();

        let mut columns = Vec::with_capacity(values.len() + 1);
        let mut literals = Vec::with_capacity(values.len() + 1);
        for (field, node) in s.fields() {
            if generate && Some(field) == primary {
                if let AutoPrimary::Generated(_) = s.auto_primary() {
                    columns.push(field);
                    literals.push(AUTO_PRIMARY_VAR.to_string());
                }
            } else if let Some(value) = values.get(field) {
                columns.push(field);
                literals.push(esc.value(field, node, value)?);
            }
        }

        let sql = InsertStatement::new(s.qualified(), columns)
            .row(literals)
            .conflict(conflict)
            .build();

        let exec = table.executor();
        let host = s.host();
        let result = match (generate, s.auto_primary()) {
            (true, AutoPrimary::AutoIncrement) => {
                let id = exec.insert(host, &Sql::from(sql))?;
                Some(id).filter(Value::is_truthy)
            }
            (true, AutoPrimary::Generated(expr)) => {
                let unit = [
                    Sql::from(format!("SET {AUTO_PRIMARY_VAR} = {expr}")),
                    Sql::from(sql),
                    Sql::from(format!("SELECT {AUTO_PRIMARY_VAR}")),
                ];
                exec.session_cell(host, &unit)?.filter(|v| !v.is_null())
            }
            _ => {
                if exec.execute(host, &Sql::from(sql))? == 0 {
                    None
                } else {
                    Some(self.primary_key().cloned().unwrap_or(Value::Bool(true)))
                }
            }
        };

        let Some(id) = result else {
            debug!(table = %s.qualified(), "create inserted nothing");
            return Ok(None);
        };

        if generate {
            if let Some(p) = primary {
                values.insert(p.to_string(), id.clone());
            }
        }
        self.values = values;
        self.dirty = Dirty::clean();
        self.snapshot = None;

        info!(table = %s.qualified(), id = ?id, "record created");
        if let Some(extra) = extra {
            self.write_change(changes::entry(Value::Null, Value::from("inserted"), extra))?;
        }
        Ok(Some(id))
    }

    /// Writes changed fields back, or every field with `replace`.
    ///
    /// Returns `false` if nothing was dirty or the row wasn't updated. A
    /// clean record sends nothing, even with `replace`.
    /// With revisions enabled the stored revision must still match the
    /// record's, and a new one is written.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingPrimaryKey`] for an unsaved record,
    /// [`RecordError::RevisionConflict`] if the row changed underneath, or
    /// an audit or executor error.
    pub fn save(&mut self, replace: bool, audit: &AuditInfo) -> RecordResult<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }

        let table = self.table.clone();
        let s = table.structure();
        let primary = s.require_primary()?;
        let id = self
            .primary_key()
            .cloned()
            .ok_or_else(|| RecordError::MissingPrimaryKey {
                field: primary.to_string(),
            })?;
        let extra = changes::prepare(s, audit)?;
        let exec = table.executor();
        let id_term = table.field_term(primary, &id)?;

        if let Some(rev) = s.revision_field() {
            let current = self.values.get(rev).and_then(Value::as_text).map(String::from);
            let sql = SelectStatement::new(s.qualified(), [rev])
                .terms([id_term.clone()])
                .build();
            let stored = exec
                .select(s.host(), &Sql::from(sql), SelectMode::Cell)?
                .into_cell()
                .filter(Value::is_truthy);
            let Some(stored) = stored else {
                return Ok(false);
            };
            if stored.as_text() != current.as_deref() {
                warn!(table = %s.qualified(), id = %id, "revision conflict");
                return Err(RecordError::RevisionConflict {
                    primary: id.to_string(),
                });
            }
            let next = revision::next(current.as_deref(), &self.values, rev)?;
            self.put_unchecked(rev, Value::Text(next));
        }

        let esc = table.escaper();
        let skip_primary = s.auto_primary().is_auto();
        let mut update = UpdateStatement::new(s.qualified());
        let all = replace || self.dirty == Dirty::All;
        for (field, node) in s.fields() {
            if field == primary && (all || skip_primary) {
                continue;
            }
            if all || matches!(&self.dirty, Dirty::Fields(f) if f.contains(field)) {
                let value = self.values.get(field).unwrap_or(&Value::Null);
                update = update.set(field, esc.value(field, node, value)?);
            }
        }
        if update.is_empty() {
            return Ok(false);
        }

        let affected = exec.execute(s.host(), &Sql::from(update.terms([id_term]).build()))?;
        if affected != 1 {
            debug!(table = %s.qualified(), id = %id, affected, "save updated nothing");
            return Ok(false);
        }

        if let Some(extra) = extra {
            let old = self.snapshot.take().unwrap_or_default();
            let (before, after) = changes::diff(&old, &self.values);
            self.write_change(changes::entry(Value::Map(before), Value::Map(after), extra))?;
        }
        self.dirty = Dirty::clean();
        self.snapshot = None;
        info!(table = %s.qualified(), id = %id, "record saved");
        Ok(true)
    }

    /// Deletes the row and forgets the primary key.
    ///
    /// Returns `false` if no row was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingPrimaryKey`] for an unsaved record,
    /// or an audit or executor error.
    pub fn delete(&mut self, audit: &AuditInfo) -> RecordResult<bool> {
        let table = self.table.clone();
        let s = table.structure();
        let primary = s.require_primary()?;
        let id = self
            .primary_key()
            .cloned()
            .ok_or_else(|| RecordError::MissingPrimaryKey {
                field: primary.to_string(),
            })?;
        let extra = changes::prepare(s, audit)?;

        let sql = DeleteStatement::new(s.qualified())
            .terms([table.field_term(primary, &id)?])
            .build();
        if table.executor().execute(s.host(), &Sql::from(sql))? != 1 {
            return Ok(false);
        }

        if let Some(extra) = extra {
            self.write_change(changes::entry(
                Value::Map(self.values.clone()),
                Value::Null,
                extra,
            ))?;
        }

        self.values.remove(primary);
        info!(table = %s.qualified(), id = %id, "record deleted");
        Ok(true)
    }
}

/// Rejects per-field conflict policies naming no fields or unknown ones.
fn check_conflict(s: &Structure, conflict: &Conflict) -> RecordResult<()> {
    let Conflict::Update(fields) = conflict else {
        return Ok(());
    };
    if fields.is_empty() {
        return Err(RecordError::invalid_conflict("update field list is empty"));
    }
    match fields.iter().find(|f| s.field(f).is_none()) {
        Some(unknown) => Err(RecordError::invalid_conflict(format!(
            "unknown update field \"{unknown}\""
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ChangesMode, FieldNode, ScalarNode, ScalarType};
    use restoc_exec::{RecordingExecutor, Response};
    use std::sync::Arc;

    fn builder() -> crate::schema::StructureBuilder {
        Structure::builder("primary", "app", "posts")
            .primary("_id")
            .field("_id", FieldNode::scalar(ScalarType::Uint))
            .field("title", FieldNode::scalar(ScalarType::String))
            .field(
                "views",
                FieldNode::Scalar(ScalarNode::new(ScalarType::Uint).optional()),
            )
    }

    fn table(builder: crate::schema::StructureBuilder) -> (Arc<RecordingExecutor>, Table) {
        let exec = Arc::new(RecordingExecutor::new());
        (exec.clone(), Table::new(builder.build().unwrap(), exec))
    }

    fn loaded(table: &Table, pairs: &[(&str, Value)]) -> Record {
        table.from_row(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn set_validates() {
        let (_, table) = table(builder());
        let mut r = table.record([("title", Value::from("a"))]).unwrap();
        assert!(matches!(
            r.set("nope", 1i64),
            Err(RecordError::UnknownField { .. })
        ));
        assert!(matches!(
            r.set("views", -1i64),
            Err(RecordError::InvalidValue { .. })
        ));
        r.set("views", 2i64).unwrap().set_literal("title", "UPPER('x')").unwrap();
        assert_eq!(r.get("title"), Some(&Value::literal("UPPER('x')")));
        assert!(table.record([("views", Value::from("many"))]).is_err());
    }

    #[test]
    fn create_with_auto_increment() {
        let (exec, table) = table(builder().auto_primary(AutoPrimary::AutoIncrement));
        let mut r = table.record([("title", Value::from("hi"))]).unwrap();
        exec.push(Response::InsertId(Value::Integer(12)));

        let id = r.create(&Conflict::Error, &AuditInfo::None).unwrap();
        assert_eq!(id, Some(Value::Integer(12)));
        assert_eq!(r.primary_key(), Some(&Value::Integer(12)));
        assert!(!r.is_dirty());
        assert_eq!(
            exec.last_sql().unwrap(),
            "INSERT INTO `app`.`posts` (`title`) VALUES ('hi')"
        );
    }

    #[test]
    fn create_with_generated_primary() {
        let (exec, table) = table(builder().auto_primary(AutoPrimary::Generated("UUID()".into())));
        let mut r = table.record([("title", Value::from("hi"))]).unwrap();
        exec.push(Response::Affected(0));
        exec.push(Response::Affected(1));
        exec.push_cell(Value::Integer(5));

        assert_eq!(
            r.create(&Conflict::Error, &AuditInfo::None).unwrap(),
            Some(Value::Integer(5))
        );
        assert_eq!(
            exec.sql(),
            vec![
                "SET @_AUTO_PRIMARY = UUID()".to_string(),
                "INSERT INTO `app`.`posts` (`_id`,`title`) VALUES (@_AUTO_PRIMARY,'hi')".to_string(),
                "SELECT @_AUTO_PRIMARY".to_string(),
            ]
        );
    }

    #[test]
    fn create_update_conflict_needs_known_fields() {
        let (exec, table) = table(builder());
        let mut r = table
            .record([("_id", Value::Integer(3)), ("title", Value::from("x"))])
            .unwrap();

        let err = r.create(&Conflict::Update(Vec::new()), &AuditInfo::None).unwrap_err();
        assert!(matches!(err, RecordError::InvalidConflict { .. }));

        let err = r
            .create(&Conflict::Update(vec!["title".into(), "nope".into()]), &AuditInfo::None)
            .unwrap_err();
        assert!(matches!(&err, RecordError::InvalidConflict { message } if message.contains("nope")));
        assert!(exec.statements().is_empty());

        r.create(&Conflict::Update(vec!["title".into()]), &AuditInfo::None).unwrap();
        assert_eq!(
            exec.last_sql().unwrap(),
            "INSERT INTO `app`.`posts` (`_id`,`title`) VALUES (3,'x') ON DUPLICATE KEY UPDATE `title` = VALUES(`title`)"
        );
    }

    #[test]
    fn ignored_create_keeps_record_unchanged() {
        let b = builder()
            .field("_rev", FieldNode::scalar(ScalarType::String))
            .revisions("_rev");
        let (exec, table) = table(b);
        let mut r = table
            .record([("_id", Value::Integer(3)), ("title", Value::from("x"))])
            .unwrap();

        exec.push(Response::Affected(0));
        assert_eq!(r.create(&Conflict::Ignore, &AuditInfo::None).unwrap(), None);
        assert_eq!(r.get("_rev"), None);
        assert!(r.is_dirty());

        assert_eq!(
            r.create(&Conflict::Ignore, &AuditInfo::None).unwrap(),
            Some(Value::Integer(3))
        );
        assert!(r.get("_rev").and_then(Value::as_text).unwrap().starts_with("1-"));
        assert!(!r.is_dirty());
    }

    #[test]
    fn create_with_explicit_key_and_ignore() {
        let (exec, table) = table(builder().auto_primary(AutoPrimary::AutoIncrement));
        let mut r = table
            .record([("_id", Value::Integer(3)), ("title", Value::from("x"))])
            .unwrap();
        exec.push(Response::Affected(0));
        assert_eq!(r.create(&Conflict::Ignore, &AuditInfo::None).unwrap(), None);
        assert_eq!(
            exec.last_sql().unwrap(),
            "INSERT IGNORE INTO `app`.`posts` (`_id`,`title`) VALUES (3,'x')"
        );
    }

    #[test]
    fn create_writes_audit_entry() {
        let (exec, table) = table(builder().changes(ChangesMode::Required(vec!["user".into()])));
        let mut r = table
            .record([("_id", Value::Integer(1)), ("title", Value::from("x"))])
            .unwrap();

        let err = r.create(&Conflict::Error, &AuditInfo::None).unwrap_err();
        assert!(matches!(err, RecordError::MissingAuditFields { .. }));
        assert!(exec.statements().is_empty());

        r.create(
            &Conflict::Error,
            &AuditInfo::fields([("user", Value::Integer(7))]),
        )
        .unwrap();
        let sql = exec.sql();
        assert_eq!(sql.len(), 2);
        assert_eq!(
            sql[1],
            r#"INSERT INTO `app`.`posts_changes` (`_id`,`created`,`items`) VALUES (1,CURRENT_TIMESTAMP,'{\"new\":\"inserted\",\"old\":null,\"user\":7}')"#
        );
    }

    #[test]
    fn save_sends_only_dirty_fields() {
        let (exec, table) = table(builder());
        let mut r = loaded(
            &table,
            &[
                ("_id", Value::Integer(4)),
                ("title", Value::from("a")),
                ("views", Value::Integer(1)),
            ],
        );
        assert!(!r.save(false, &AuditInfo::None).unwrap());
        assert!(exec.statements().is_empty());

        r.set("views", 2i64).unwrap();
        assert!(r.save(false, &AuditInfo::None).unwrap());
        assert_eq!(
            exec.last_sql().unwrap(),
            "UPDATE `app`.`posts` SET `views` = 2 WHERE `_id` = 4"
        );
        assert!(!r.is_dirty());

        r.set("views", 3i64).unwrap();
        assert!(r.save(true, &AuditInfo::None).unwrap());
        assert_eq!(
            exec.last_sql().unwrap(),
            "UPDATE `app`.`posts` SET `title` = 'a', `views` = 3 WHERE `_id` = 4"
        );
    }

    #[test]
    fn replace_save_of_clean_record_sends_nothing() {
        let (exec, table) = table(builder());
        let mut r = loaded(
            &table,
            &[("_id", Value::Integer(4)), ("title", Value::from("a"))],
        );
        assert!(!r.save(true, &AuditInfo::None).unwrap());
        assert!(exec.statements().is_empty());
    }

    #[test]
    fn save_without_key_fails() {
        let (_, table) = table(builder());
        let mut r = table.record([("title", Value::from("a"))]).unwrap();
        assert!(matches!(
            r.save(false, &AuditInfo::None),
            Err(RecordError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn save_reports_unchanged_row() {
        let (exec, table) = table(builder());
        let mut r = loaded(&table, &[("_id", Value::Integer(4))]);
        r.set("title", "b").unwrap();
        exec.push(Response::Affected(0));
        assert!(!r.save(false, &AuditInfo::None).unwrap());
        assert!(r.is_dirty());
    }

    #[test]
    fn revision_checked_and_bumped() {
        let b = builder()
            .field("_rev", FieldNode::scalar(ScalarType::String))
            .revisions("_rev");
        let (exec, table) = table(b);
        let mut r = loaded(
            &table,
            &[
                ("_id", Value::Integer(1)),
                ("title", Value::from("a")),
                ("_rev", Value::from("1-aaaa")),
            ],
        );

        r.set("title", "b").unwrap();
        exec.push_cell("1-aaaa");
        assert!(r.save(false, &AuditInfo::None).unwrap());
        let rev = r.get("_rev").and_then(Value::as_text).unwrap().to_string();
        assert!(rev.starts_with("2-"));
        assert_eq!(
            exec.sql()[0],
            "SELECT `_rev` FROM `app`.`posts` WHERE `_id` = 1"
        );
        assert!(exec.last_sql().unwrap().contains(&format!("`_rev` = '{rev}'")));

        r.set("title", "c").unwrap();
        exec.push_cell("7-other");
        assert!(matches!(
            r.save(false, &AuditInfo::None),
            Err(RecordError::RevisionConflict { .. })
        ));
        assert_eq!(r.get("_rev").and_then(Value::as_text), Some(rev.as_str()));

        exec.push(Response::Selected(restoc_exec::SelectOutput::Cell(None)));
        assert!(!r.save(false, &AuditInfo::None).unwrap());
    }

    #[test]
    fn save_audits_the_diff() {
        let (exec, table) = table(builder().changes(ChangesMode::On));
        let mut r = loaded(
            &table,
            &[("_id", Value::Integer(2)), ("title", Value::from("a"))],
        );
        r.set("title", "b").unwrap();
        r.save(false, &AuditInfo::None).unwrap();
        let last = exec.last_sql().unwrap();
        assert!(last.starts_with("INSERT INTO `app`.`posts_changes`"));
        assert!(last.contains(r#"{\"new\":{\"title\":\"b\"},\"old\":{\"title\":\"a\"}}"#));

        exec.clear();
        r.set("title", "c").unwrap();
        r.save(false, &AuditInfo::Skip).unwrap();
        assert_eq!(exec.statements().len(), 1);
    }

    #[test]
    fn delete_strips_primary_key() {
        let (exec, table) = table(builder().changes(ChangesMode::On));
        let mut r = loaded(
            &table,
            &[("_id", Value::Integer(9)), ("title", Value::from("a"))],
        );
        assert!(r.delete(&AuditInfo::None).unwrap());
        assert!(r.is_new());
        let sql = exec.sql();
        assert_eq!(sql[0], "DELETE FROM `app`.`posts` WHERE `_id` = 9");
        assert!(sql[1].contains(r#"\"new\":null"#));
        assert!(sql[1].starts_with("INSERT INTO `app`.`posts_changes` (`_id`,`created`,`items`) VALUES (9,"));

        assert!(matches!(
            r.delete(&AuditInfo::None),
            Err(RecordError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn delete_of_missing_row_is_false() {
        let (exec, table) = table(builder());
        let mut r = loaded(&table, &[("_id", Value::Integer(9))]);
        exec.push(Response::Affected(0));
        assert!(!r.delete(&AuditInfo::None).unwrap());
        assert!(!r.is_new());
    }
}
