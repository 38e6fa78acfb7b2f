//! Statement builder: SELECT, INSERT, UPDATE and DELETE text.
//!
//! Builders take already compiled pieces (escaped literals, predicate
//! terms) and only assemble them. Identifiers are backtick-quoted here.

use crate::error::{RecordError, RecordResult};
use std::fmt;
use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        })
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field name.
    pub field: String,
    /// Explicit direction, the engine default when `None`.
    pub direction: Option<Direction>,
}

impl OrderBy {
    /// Orders by `field` with no explicit direction.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: None,
        }
    }

    /// Orders by `field` ascending.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Some(Direction::Asc),
        }
    }

    /// Orders by `field` descending.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Some(Direction::Desc),
        }
    }

    /// Parses a comma separated list of terms, e.g. `name,!created`.
    ///
    /// # Errors
    ///
    /// Returns the first term that fails to parse.
    pub fn parse_list(s: &str) -> RecordResult<Vec<Self>> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for OrderBy {
    type Err = RecordError;

    /// Parses `field`, `!field` (descending) or `field ASC|DESC`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(field) = s.strip_prefix('!') {
            if field.is_empty() {
                return Err(RecordError::invalid_argument("empty order by field"));
            }
            return Ok(Self::desc(field));
        }
        match s.split_whitespace().collect::<Vec<_>>().as_slice() {
            [field] => Ok(Self::new(*field)),
            [field, dir] if dir.eq_ignore_ascii_case("asc") => Ok(Self::asc(*field)),
            [field, dir] if dir.eq_ignore_ascii_case("desc") => Ok(Self::desc(*field)),
            _ => Err(RecordError::invalid_argument(format!(
                "invalid order by \"{s}\""
            ))),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.field)?;
        if let Some(dir) = self.direction {
            write!(f, " {dir}")?;
        }
        Ok(())
    }
}

/// A LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `LIMIT n`.
    Count(u64),
    /// `LIMIT offset, count`.
    Range {
        /// Rows to skip.
        offset: u64,
        /// Rows to return.
        count: u64,
    },
}

impl Limit {
    /// Returns true if at most one row is requested.
    pub fn is_single(self) -> bool {
        match self {
            Limit::Count(n) => n == 1,
            Limit::Range { count, .. } => count == 1,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Count(n) => write!(f, "LIMIT {n}"),
            Limit::Range { offset, count } => write!(f, "LIMIT {offset}, {count}"),
        }
    }
}

/// Columns a SELECT returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Named fields.
    Fields(Vec<String>),
    /// `COUNT(*)`.
    Count,
}

fn where_clause(out: &mut String, terms: &[String]) {
    if !terms.is_empty() {
        out.push_str(" WHERE ");
        out.push_str(&terms.join(" AND "));
    }
}

fn quoted_list(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("`{f}`"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Builds a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement {
    table: String,
    distinct: bool,
    projection: Projection,
    terms: Vec<String>,
    order_by: Vec<OrderBy>,
    limit: Option<Limit>,
}

impl SelectStatement {
    /// Selects `fields` from `table` (already qualified and quoted).
    pub fn new<S: Into<String>>(table: impl Into<String>, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            table: table.into(),
            distinct: false,
            projection: Projection::Fields(fields.into_iter().map(Into::into).collect()),
            terms: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Counts the rows of `table`.
    pub fn count(table: impl Into<String>) -> Self {
        Self {
            projection: Projection::Count,
            ..Self::new(table, Vec::<String>::new())
        }
    }

    /// Adds `DISTINCT`.
    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Appends compiled `` `field` <predicate> `` terms.
    #[must_use]
    pub fn terms(mut self, terms: impl IntoIterator<Item = String>) -> Self {
        self.terms.extend(terms);
        self
    }

    /// Sets the ORDER BY terms.
    #[must_use]
    pub fn order_by(mut self, order_by: &[OrderBy]) -> Self {
        self.order_by = order_by.to_vec();
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: Option<Limit>) -> Self {
        self.limit = limit;
        self
    }

    /// Renders the statement.
    pub fn build(&self) -> String {
        let mut out = String::from("SELECT ");
        if self.distinct {
            out.push_str("DISTINCT ");
        }
        match &self.projection {
            Projection::Count => out.push_str("COUNT(*)"),
            Projection::Fields(fields) if fields.is_empty() => out.push('*'),
            Projection::Fields(fields) => out.push_str(&quoted_list(fields)),
        }
        out.push_str(" FROM ");
        out.push_str(&self.table);
        where_clause(&mut out, &self.terms);
        if !self.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            out.push_str(
                &self
                    .order_by
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        if let Some(limit) = self.limit {
            out.push(' ');
            out.push_str(&limit.to_string());
        }
        out
    }
}

/// What to do when an INSERT hits an existing key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Conflict {
    /// Fail with a duplicate error.
    #[default]
    Error,
    /// `INSERT IGNORE`.
    Ignore,
    /// Overwrite every inserted column.
    Replace,
    /// Overwrite only these columns.
    Update(Vec<String>),
}

impl FromStr for Conflict {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Conflict::Error),
            "ignore" => Ok(Conflict::Ignore),
            "replace" => Ok(Conflict::Replace),
            other => Err(RecordError::invalid_conflict(format!(
                "\"{other}\" must be one of \"error\", \"ignore\", \"replace\", or a list of fields"
            ))),
        }
    }
}

/// Builds an INSERT of one or more rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    table: String,
    ignore: bool,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    update: Vec<String>,
}

impl InsertStatement {
    /// Inserts into `columns` of `table` (already qualified and quoted).
    pub fn new<S: Into<String>>(table: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            table: table.into(),
            ignore: false,
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            update: Vec::new(),
        }
    }

    /// Appends a row of already escaped literals.
    #[must_use]
    pub fn row(mut self, values: Vec<String>) -> Self {
        self.rows.push(values);
        self
    }

    /// Applies a conflict policy.
    #[must_use]
    pub fn conflict(mut self, conflict: &Conflict) -> Self {
        match conflict {
            Conflict::Error => {}
            Conflict::Ignore => self.ignore = true,
            Conflict::Replace => self.update.clone_from(&self.columns),
            Conflict::Update(fields) => self.update.clone_from(fields),
        }
        self
    }

    /// Renders the statement.
    pub fn build(&self) -> String {
        let mut out = String::from("INSERT ");
        if self.ignore {
            out.push_str("IGNORE ");
        }
        out.push_str("INTO ");
        out.push_str(&self.table);
        out.push_str(" (");
        out.push_str(&quoted_list(&self.columns));
        out.push_str(") VALUES ");
        out.push_str(
            &self
                .rows
                .iter()
                .map(|r| format!("({})", r.join(",")))
                .collect::<Vec<_>>()
                .join(","),
        );
        if !self.update.is_empty() {
            out.push_str(" ON DUPLICATE KEY UPDATE ");
            out.push_str(
                &self
                    .update
                    .iter()
                    .map(|f| format!("`{f}` = VALUES(`{f}`)"))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        out
    }
}

/// Builds an UPDATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    table: String,
    set: Vec<(String, String)>,
    terms: Vec<String>,
}

impl UpdateStatement {
    /// Updates `table` (already qualified and quoted).
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set: Vec::new(),
            terms: Vec::new(),
        }
    }

    /// Sets `field` to an already escaped literal.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, literal: impl Into<String>) -> Self {
        self.set.push((field.into(), literal.into()));
        self
    }

    /// Appends compiled `` `field` <predicate> `` terms.
    #[must_use]
    pub fn terms(mut self, terms: impl IntoIterator<Item = String>) -> Self {
        self.terms.extend(terms);
        self
    }

    /// Returns true if nothing is set.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Renders the statement.
    pub fn build(&self) -> String {
        let mut out = format!("UPDATE {} SET ", self.table);
        out.push_str(
            &self
                .set
                .iter()
                .map(|(f, v)| format!("`{f}` = {v}"))
                .collect::<Vec<_>>()
                .join(", "),
        );
        where_clause(&mut out, &self.terms);
        out
    }
}

/// Builds a DELETE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatement {
    table: String,
    terms: Vec<String>,
}

impl DeleteStatement {
    /// Deletes from `table` (already qualified and quoted).
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            terms: Vec::new(),
        }
    }

    /// Appends compiled `` `field` <predicate> `` terms.
    #[must_use]
    pub fn terms(mut self, terms: impl IntoIterator<Item = String>) -> Self {
        self.terms.extend(terms);
        self
    }

    /// Renders the statement.
    pub fn build(&self) -> String {
        let mut out = format!("DELETE FROM {}", self.table);
        where_clause(&mut out, &self.terms);
        out
    }
}
