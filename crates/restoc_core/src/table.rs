//! Record-type operations that don't need a loaded record.

use crate::changes::{self, ChangeEntry};
use crate::condition::{where_term, Filter};
use crate::config::Custom;
use crate::error::{RecordError, RecordResult};
use crate::escape::Escaper;
use crate::record::Record;
use crate::revision;
use crate::rows::{process_row, process_rows};
use crate::schema::{AutoPrimary, Structure};
use crate::statement::{
    Conflict, DeleteStatement, InsertStatement, Limit, OrderBy, SelectStatement, UpdateStatement,
};
use restoc_codec::{from_json, Value, ValueMap};
use restoc_exec::{CommandExecutor, Row, SelectMode, Sql};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The result of a read: one optional row when a single row was asked
/// for, a list otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    /// A single row was requested (scalar id, or a limit of one).
    One(Option<T>),
    /// Any number of rows.
    Many(Vec<T>),
}

impl<T> Fetch<T> {
    /// Flattens into a list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Fetch::One(one) => one.into_iter().collect(),
            Fetch::Many(many) => many,
        }
    }

    /// Returns the single row, or the first of many.
    pub fn into_one(self) -> Option<T> {
        match self {
            Fetch::One(one) => one,
            Fetch::Many(many) => many.into_iter().next(),
        }
    }

    /// Returns true if nothing was found.
    pub fn is_empty(&self) -> bool {
        match self {
            Fetch::One(one) => one.is_none(),
            Fetch::Many(many) => many.is_empty(),
        }
    }

    /// Number of rows found.
    pub fn len(&self) -> usize {
        match self {
            Fetch::One(one) => usize::from(one.is_some()),
            Fetch::Many(many) => many.len(),
        }
    }

    /// Maps every row.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Fetch<U> {
        match self {
            Fetch::One(one) => Fetch::One(one.map(f)),
            Fetch::Many(many) => Fetch::Many(many.into_iter().map(&mut f).collect()),
        }
    }
}

/// Projection, ordering and paging for reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Columns to return. Only honoured by the `_rows` reads; records
    /// always load every field.
    pub fields: Option<Vec<String>>,
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// ORDER BY terms. Each must name a structure field.
    pub order_by: Vec<OrderBy>,
    /// LIMIT clause.
    pub limit: Option<Limit>,
}

impl FetchOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the returned columns.
    #[must_use]
    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets `DISTINCT`.
    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Sets the ORDER BY terms.
    #[must_use]
    pub fn order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A record type bound to an executor.
///
/// Cheap to clone. Every [`Record`] keeps a handle to the table it was
/// loaded from or created for.
#[derive(Clone)]
pub struct Table {
    structure: Arc<Structure>,
    exec: Arc<dyn CommandExecutor>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("host", &self.structure.host())
            .field("table", &self.structure.qualified())
            .finish_non_exhaustive()
    }
}

/// Returns true if `ids` selects a single row.
fn is_scalar(ids: &Value) -> bool {
    !matches!(ids, Value::Array(_) | Value::Map(_))
}

impl Table {
    /// Binds `structure` to `exec`.
    pub fn new(structure: Structure, exec: Arc<dyn CommandExecutor>) -> Self {
        Self {
            structure: Arc::new(structure),
            exec,
        }
    }

    /// Returns a table using the host and database overrides of `custom`.
    #[must_use]
    pub fn with_custom(&self, custom: &Custom) -> Self {
        if custom.is_empty() {
            return self.clone();
        }
        Self {
            structure: Arc::new(self.structure.customize(custom)),
            exec: Arc::clone(&self.exec),
        }
    }

    /// The structure.
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// The executor.
    pub fn executor(&self) -> &dyn CommandExecutor {
        self.exec.as_ref()
    }

    /// An escaper for this table's host.
    pub fn escaper(&self) -> Escaper<'_> {
        Escaper::new(self.exec.as_ref(), self.structure.host())
    }

    pub(crate) fn host(&self) -> &str {
        self.structure.host()
    }

    pub(crate) fn execute(&self, sql: String) -> RecordResult<u64> {
        Ok(self.exec.execute(self.host(), &Sql::from(sql))?)
    }

    /// Creates a new, unsaved record from caller-supplied fields.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is unknown or a value is invalid.
    pub fn record<K, I>(&self, fields: I) -> RecordResult<Record>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Record::new(
            self.clone(),
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    /// Wraps a row read back from the host.
    pub fn from_row(&self, row: Row) -> Record {
        Record::from_row(self.clone(), row)
    }

    fn primary_term(&self, ids: &Value) -> RecordResult<String> {
        let primary = self.structure.require_primary()?;
        self.field_term(primary, ids)
    }

    pub(crate) fn field_term(&self, field: &str, value: &Value) -> RecordResult<String> {
        where_term(&self.structure, &self.escaper(), field, value)
    }

    fn terms(&self, ids: Option<&Value>, filter: &Filter) -> RecordResult<Vec<String>> {
        let mut terms = Vec::with_capacity(filter.len() + 1);
        if let Some(ids) = ids {
            terms.push(self.primary_term(ids)?);
        }
        terms.extend(filter.compile(&self.structure, &self.escaper())?);
        Ok(terms)
    }

    fn projection(&self, fields: Option<&[String]>) -> RecordResult<Vec<String>> {
        match fields {
            None => Ok(self.structure.field_names().map(String::from).collect()),
            Some(fields) => {
                for f in fields {
                    self.structure.require_field(f)?;
                }
                Ok(fields.to_vec())
            }
        }
    }

    fn select(
        &self,
        terms: Vec<String>,
        single: bool,
        fields: Vec<String>,
        opts: &FetchOptions,
    ) -> RecordResult<Fetch<Row>> {
        for o in &opts.order_by {
            self.structure.require_field(&o.field)?;
        }
        let sql = SelectStatement::new(self.structure.qualified(), fields)
            .distinct(opts.distinct)
            .terms(terms)
            .order_by(&opts.order_by)
            .limit(opts.limit)
            .build();
        let sql = Sql::from(sql);

        if single {
            let mut row = self.exec.select(self.host(), &sql, SelectMode::Row)?.into_row();
            if let Some(row) = row.as_mut() {
                process_row(&self.structure, row)?;
            }
            Ok(Fetch::One(row))
        } else {
            let mut rows = self.exec.select(self.host(), &sql, SelectMode::All)?.into_rows();
            process_rows(&self.structure, &mut rows)?;
            Ok(Fetch::Many(rows))
        }
    }

    /// Counts the rows matching `ids` (primary key values) and `filter`.
    ///
    /// # Errors
    ///
    /// Returns a compilation or executor error.
    pub fn count(&self, ids: Option<&Value>, filter: &Filter) -> RecordResult<u64> {
        let sql = SelectStatement::count(self.structure.qualified())
            .terms(self.terms(ids, filter)?)
            .build();
        let cell = self
            .exec
            .select(self.host(), &Sql::from(sql), SelectMode::Cell)?
            .into_cell();
        Ok(match cell {
            Some(Value::Integer(n)) => u64::try_from(n).unwrap_or(0),
            Some(Value::Text(s)) => s.parse().unwrap_or(0),
            _ => 0,
        })
    }

    /// Returns the primary key of the record whose primary key, or
    /// `index` field, equals `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure has no primary key or `index`
    /// isn't a field.
    pub fn exists(&self, id: &Value, index: Option<&str>) -> RecordResult<Option<Value>> {
        let primary = self.structure.require_primary()?.to_string();
        let opts = FetchOptions::new().fields([primary.clone()]);

        let found = match index {
            Some(index) => {
                let filter = Filter::new().with(index, id.clone());
                self.filter_rows(&filter, &opts.limit(Limit::Count(1)))?
            }
            None => self.get_rows(Some(id), &Filter::new(), &opts)?,
        };

        Ok(found.into_one().and_then(|mut row| row.remove(&primary)))
    }

    /// Fetches records by primary key, narrowed by `filter`.
    ///
    /// A scalar id or a limit of one returns [`Fetch::One`].
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if a projection is
    /// requested, or a compilation or executor error.
    pub fn get(
        &self,
        ids: Option<&Value>,
        filter: &Filter,
        opts: &FetchOptions,
    ) -> RecordResult<Fetch<Record>> {
        if opts.fields.is_some() {
            return Err(RecordError::invalid_argument(
                "field projection is only available for raw rows",
            ));
        }
        Ok(self.get_rows(ids, filter, opts)?.map(|row| self.from_row(row)))
    }

    /// Like [`Table::get`], returning decoded rows.
    ///
    /// # Errors
    ///
    /// Returns a compilation or executor error.
    pub fn get_rows(
        &self,
        ids: Option<&Value>,
        filter: &Filter,
        opts: &FetchOptions,
    ) -> RecordResult<Fetch<Row>> {
        let single = ids.is_some_and(is_scalar) || opts.limit.is_some_and(Limit::is_single);
        let fields = self.projection(opts.fields.as_deref())?;
        self.select(self.terms(ids, filter)?, single, fields, opts)
    }

    /// Fetches records matching `filter`.
    ///
    /// A limit of one returns [`Fetch::One`].
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] for an empty filter or a
    /// projection, or a compilation or executor error.
    pub fn filter(&self, filter: &Filter, opts: &FetchOptions) -> RecordResult<Fetch<Record>> {
        if opts.fields.is_some() {
            return Err(RecordError::invalid_argument(
                "field projection is only available for raw rows",
            ));
        }
        Ok(self.filter_rows(filter, opts)?.map(|row| self.from_row(row)))
    }

    /// Like [`Table::filter`], returning decoded rows.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] for an empty filter, or a
    /// compilation or executor error.
    pub fn filter_rows(&self, filter: &Filter, opts: &FetchOptions) -> RecordResult<Fetch<Row>> {
        if filter.is_empty() {
            return Err(RecordError::invalid_argument(
                "filter needs at least one condition",
            ));
        }
        let single = opts.limit.is_some_and(Limit::is_single);
        let fields = self.projection(opts.fields.as_deref())?;
        self.select(self.terms(None, filter)?, single, fields, opts)
    }

    /// Deletes rows whose primary key, or `index` field, matches `ids`.
    /// Deletes every row when `ids` is `None`.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::AuditNotAllowed`] for audited tables.
    pub fn delete_get(&self, ids: Option<&Value>, index: Option<&str>) -> RecordResult<u64> {
        if self.structure.changes().is_enabled() {
            return Err(RecordError::audit_not_allowed("delete_get"));
        }

        let mut sql = DeleteStatement::new(self.structure.qualified());
        if let Some(ids) = ids {
            let field = match index {
                Some(index) => index,
                None => self.structure.require_primary()?,
            };
            sql = sql.terms([self.field_term(field, ids)?]);
        }

        let affected = self.execute(sql.build())?;
        debug!(table = %self.structure.qualified(), affected, "delete_get");
        Ok(affected)
    }

    /// Sets `field` to `value` on the rows matching `ids` and `filter`, or
    /// every row when both are empty.
    ///
    /// Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`], or a compilation or executor
    /// error.
    pub fn update_field(
        &self,
        field: &str,
        value: &Value,
        ids: Option<&Value>,
        filter: &Filter,
    ) -> RecordResult<u64> {
        let node = self.structure.require_field(field)?;
        let literal = self.escaper().value(field, node, value)?;
        let sql = UpdateStatement::new(self.structure.qualified())
            .set(field, literal)
            .terms(self.terms(ids, filter)?)
            .build();
        self.execute(sql)
    }

    /// Inserts many records in one statement.
    ///
    /// Returns the number of rows inserted or changed. Revisions are set on
    /// each record first.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::AuditNotAllowed`] for audited tables and
    /// [`RecordError::InvalidConflict`] for a per-field conflict policy.
    pub fn create_many(&self, records: &mut [Record], conflict: &Conflict) -> RecordResult<u64> {
        if self.structure.changes().is_enabled() {
            return Err(RecordError::audit_not_allowed("create_many"));
        }
        if let Conflict::Update(_) = conflict {
            return Err(RecordError::invalid_conflict(
                "create_many accepts \"error\", \"ignore\" or \"replace\"",
            ));
        }
        if records.is_empty() {
            return Ok(0);
        }

        let s = &self.structure;
        let primary = s.primary();
        let columns: Vec<&str> = s
            .field_names()
            .filter(|f| Some(*f) != primary || *s.auto_primary() != AutoPrimary::AutoIncrement)
            .collect();

        let esc = self.escaper();
        let mut insert = InsertStatement::new(s.qualified(), columns.iter().copied());
        for record in records.iter_mut() {
            if let Some(rev) = s.revision_field() {
                let next = revision::next(None, record.values(), rev)?;
                record.put_unchecked(rev, Value::Text(next));
            }

            let mut row = Vec::with_capacity(columns.len());
            for &field in &columns {
                let value = record.get(field).unwrap_or(&Value::Null);
                match (s.auto_primary(), value) {
                    (AutoPrimary::Generated(expr), Value::Null) if Some(field) == primary => {
                        row.push(expr.clone());
                    }
                    (_, value) => {
                        let node = s.require_field(field)?;
                        row.push(esc.value(field, node, value)?);
                    }
                }
            }
            insert = insert.row(row);
        }

        let affected = self.execute(insert.conflict(conflict).build())?;
        debug!(table = %s.qualified(), rows = records.len(), affected, "create_many");
        Ok(affected)
    }

    /// Returns the audit history of record `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure has no primary key, or a codec
    /// error if an entry isn't valid JSON.
    pub fn get_changes(&self, id: &Value, order_by: &[OrderBy]) -> RecordResult<Vec<ChangeEntry>> {
        let primary = self.structure.require_primary()?;
        let columns = [primary, "created", "items"];
        if let Some(o) = order_by.iter().find(|o| !columns.contains(&o.field.as_str())) {
            return Err(RecordError::unknown_field(&o.field, self.structure.changes_table()));
        }
        let sql = SelectStatement::new(self.structure.changes_table(), columns)
        .terms([self.primary_term(id)?])
        .order_by(order_by)
        .build();

        let rows = self
            .exec
            .select(self.host(), &Sql::from(sql), SelectMode::All)?
            .into_rows();

        rows.into_iter()
            .map(|mut row| {
                let items = match row.remove("items") {
                    Some(Value::Text(text)) => from_json(&text)?,
                    Some(other) => other,
                    None => Value::Null,
                };
                Ok(ChangeEntry {
                    id: row.remove(primary).unwrap_or(Value::Null),
                    created: row.remove("created").unwrap_or(Value::Null),
                    items,
                })
            })
            .collect()
    }

    /// Writes an audit entry for `id` by hand.
    ///
    /// Useful for record types whose child tables change without the
    /// parent being saved.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::AuditDisabled`] if the table keeps no
    /// history, or [`RecordError::MissingAuditFields`] if `items` lacks a
    /// required field.
    pub fn add_changes(&self, id: &Value, items: &ValueMap) -> RecordResult<bool> {
        let mode = self.structure.changes();
        if !mode.is_enabled() {
            return Err(RecordError::AuditDisabled {
                table: self.structure.qualified(),
            });
        }
        changes::required_fields(mode, Some(items))?;
        let affected = changes::insert(
            &self.structure,
            self.exec.as_ref(),
            id,
            &Value::Map(items.clone()),
        )?;
        Ok(affected > 0)
    }

    /// Asks the host for a fresh UUID.
    ///
    /// # Errors
    ///
    /// Returns an executor error.
    pub fn uuid(&self) -> RecordResult<Option<String>> {
        let cell = self
            .exec
            .select(self.host(), &Sql::from("select uuid()"), SelectMode::Cell)?
            .into_cell();
        Ok(cell.map(|v| match v {
            Value::Text(s) => s,
            other => other.to_string(),
        }))
    }
}
