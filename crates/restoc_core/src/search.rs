//! Translation of user-facing search terms into filters.

use crate::condition::Filter;
use crate::error::{RecordError, RecordResult};
use crate::record::Record;
use crate::table::{Fetch, FetchOptions, Table};
use restoc_codec::{Value, ValueMap};
use restoc_exec::Row;
use std::str::FromStr;

/// How a search term matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
    /// Equal to the value.
    #[default]
    Exact,
    /// Starts with the value.
    Start,
    /// Ends with the value.
    End,
    /// `*` in the value matches anything.
    Asterisk,
    /// Greater than or equal to the value.
    Greater,
    /// Less than or equal to the value.
    Less,
}

impl FromStr for SearchKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "exact" => SearchKind::Exact,
            "start" => SearchKind::Start,
            "end" => SearchKind::End,
            "asterisk" => SearchKind::Asterisk,
            "greater" => SearchKind::Greater,
            "less" => SearchKind::Less,
            other => {
                return Err(RecordError::invalid_argument(format!(
                    "invalid search type \"{other}\""
                )))
            }
        })
    }
}

/// One field's search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    /// Text to look for.
    pub value: String,
    /// How to match it.
    pub kind: SearchKind,
}

impl SearchTerm {
    /// Creates a term.
    pub fn new(value: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// An exact match.
    pub fn exact(value: impl Into<String>) -> Self {
        Self::new(value, SearchKind::Exact)
    }

    /// Reads a term from a string (exact match) or a
    /// `{"value": .., "type": ..}` map.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] for any other shape or an
    /// unknown type.
    pub fn from_value(field: &str, value: &Value) -> RecordResult<Self> {
        match value {
            Value::Text(s) => Ok(Self::exact(s.clone())),
            Value::Map(m) => {
                let text = m.get("value").and_then(Value::as_text).ok_or_else(|| {
                    RecordError::invalid_argument(format!("{field}: search value must be text"))
                })?;
                let kind = match m.get("type") {
                    None => SearchKind::Exact,
                    Some(Value::Text(t)) => t.parse()?,
                    Some(other) => {
                        return Err(RecordError::invalid_argument(format!(
                            "{field}: search type must be text, got {}",
                            other.kind()
                        )))
                    }
                };
                Ok(Self::new(text, kind))
            }
            other => Err(RecordError::invalid_argument(format!(
                "{field}: must be a string or map, got {}",
                other.kind()
            ))),
        }
    }

    /// Returns the condition value for this term.
    pub fn to_condition(&self) -> Value {
        let v = self.value.replace('_', r"\_").replace('%', r"\%");
        let op = |name: &str, v: String| Value::map([(name, Value::Text(v))]);
        match self.kind {
            SearchKind::Exact => Value::Text(v),
            SearchKind::Start => op("like", format!("{v}%")),
            SearchKind::End => op("like", format!("%{v}")),
            SearchKind::Asterisk => op("like", v.replace('*', "%")),
            SearchKind::Greater => op("gte", v),
            SearchKind::Less => op("lte", v),
        }
    }
}

/// Builds a filter from `(field, term)` pairs.
pub fn search_filter<'a>(terms: impl IntoIterator<Item = (&'a str, &'a SearchTerm)>) -> Filter {
    terms
        .into_iter()
        .map(|(field, term)| (field, term.to_condition()))
        .collect()
}

/// Reads search terms from a map of field to string or term map.
///
/// # Errors
///
/// Same as [`SearchTerm::from_value`].
pub fn terms_from_map(map: &ValueMap) -> RecordResult<Vec<(String, SearchTerm)>> {
    map.iter()
        .map(|(field, value)| Ok((field.clone(), SearchTerm::from_value(field, value)?)))
        .collect()
}

fn has_ids(ids: Option<&Value>) -> bool {
    ids.is_some_and(Value::is_truthy)
}

impl Table {
    /// Finds records matching search terms, restricted to `ids` when
    /// given.
    ///
    /// # Errors
    ///
    /// Same as [`Table::get`] and [`Table::filter`].
    pub fn search(
        &self,
        terms: &[(String, SearchTerm)],
        ids: Option<&Value>,
        opts: &FetchOptions,
    ) -> RecordResult<Fetch<Record>> {
        let filter = search_filter(terms.iter().map(|(f, t)| (f.as_str(), t)));
        if has_ids(ids) {
            self.get(ids, &filter, opts)
        } else {
            self.filter(&filter, opts)
        }
    }

    /// Like [`Table::search`], returning decoded rows.
    ///
    /// # Errors
    ///
    /// Same as [`Table::get_rows`] and [`Table::filter_rows`].
    pub fn search_rows(
        &self,
        terms: &[(String, SearchTerm)],
        ids: Option<&Value>,
        opts: &FetchOptions,
    ) -> RecordResult<Fetch<Row>> {
        let filter = search_filter(terms.iter().map(|(f, t)| (f.as_str(), t)));
        if has_ids(ids) {
            self.get_rows(ids, &filter, opts)
        } else {
            self.filter_rows(&filter, opts)
        }
    }
}
