//! Condition compiler: a field and a filter value to an SQL predicate.

use crate::error::{RecordError, RecordResult};
use crate::escape::Escaper;
use crate::schema::{FieldNode, Structure};
use restoc_codec::{Value, ValueMap};

/// Recognized operator keys, in the order they are checked.
///
/// When a mapping holds several of them, the first in this list wins.
pub const OPERATORS: [&str; 7] = ["between", "lt", "gt", "lte", "gte", "neq", "like"];

/// A single compiled-to-be condition on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `= v`, or `IS NULL` for null.
    Eq(Value),
    /// `IN (...)`.
    In(Vec<Value>),
    /// `BETWEEN lo AND hi`.
    Between(Value, Value),
    /// `< v`.
    Lt(Value),
    /// `> v`.
    Gt(Value),
    /// `<= v`.
    Lte(Value),
    /// `>= v`.
    Gte(Value),
    /// `!= v`, or `IS NOT NULL` for null.
    Neq(Value),
    /// `NOT IN (...)`.
    NotIn(Vec<Value>),
    /// `LIKE pattern`.
    Like(Value),
}

impl Condition {
    /// Interprets a filter value.
    ///
    /// Arrays become set membership, maps are operator mappings, anything
    /// else is an equality.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidOperator`] for a mapping without a
    /// recognized key, and [`RecordError::InvalidValue`] for a malformed
    /// `between` operand or an empty list.
    pub fn from_value(field: &str, value: &Value) -> RecordResult<Self> {
        match value {
            Value::Array(items) => Ok(Condition::In(non_empty(field, items)?)),
            Value::Map(ops) => Self::from_operators(field, ops),
            other => Ok(Condition::Eq(other.clone())),
        }
    }

    fn from_operators(field: &str, ops: &ValueMap) -> RecordResult<Self> {
        let Some((op, operand)) = OPERATORS
            .iter()
            .find_map(|op| ops.get(*op).map(|v| (*op, v)))
        else {
            return Err(RecordError::InvalidOperator {
                keys: ops.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        };

        Ok(match op {
            "between" => match operand.as_array() {
                Some([lo, hi]) => Condition::Between(lo.clone(), hi.clone()),
                _ => {
                    return Err(RecordError::invalid_value(
                        field,
                        "between needs exactly [low, high]",
                    ))
                }
            },
            "lt" => Condition::Lt(operand.clone()),
            "gt" => Condition::Gt(operand.clone()),
            "lte" => Condition::Lte(operand.clone()),
            "gte" => Condition::Gte(operand.clone()),
            "neq" => match operand {
                Value::Array(items) => Condition::NotIn(non_empty(field, items)?),
                other => Condition::Neq(other.clone()),
            },
            _ => Condition::Like(operand.clone()),
        })
    }

    /// Renders the predicate, without the field name.
    ///
    /// # Errors
    ///
    /// Returns any error raised while escaping an operand.
    pub fn compile(&self, esc: &Escaper<'_>, field: &str, node: &FieldNode) -> RecordResult<String> {
        let one = |v: &Value| esc.value(field, node, v);
        let list = |vs: &[Value]| -> RecordResult<String> {
            let parts = vs
                .iter()
                .map(|v| one(v))
                .collect::<RecordResult<Vec<_>>>()?;
            Ok(parts.join(","))
        };

        Ok(match self {
            Condition::Eq(Value::Null) => "IS NULL".to_string(),
            Condition::Eq(v) => format!("= {}", one(v)?),
            Condition::In(vs) => format!("IN ({})", list(vs)?),
            Condition::Between(lo, hi) => format!("BETWEEN {} AND {}", one(lo)?, one(hi)?),
            Condition::Lt(v) => format!("< {}", one(v)?),
            Condition::Gt(v) => format!("> {}", one(v)?),
            Condition::Lte(v) => format!("<= {}", one(v)?),
            Condition::Gte(v) => format!(">= {}", one(v)?),
            Condition::Neq(Value::Null) => "IS NOT NULL".to_string(),
            Condition::Neq(v) => format!("!= {}", one(v)?),
            Condition::NotIn(vs) => format!("NOT IN ({})", list(vs)?),
            Condition::Like(v) => format!("LIKE {}", one(v)?),
        })
    }
}

fn non_empty(field: &str, items: &[Value]) -> RecordResult<Vec<Value>> {
    if items.is_empty() {
        return Err(RecordError::invalid_value(field, "empty value list"));
    }
    Ok(items.to_vec())
}

/// Compiles the predicate for `value` on `field`, without the field name.
///
/// ```
/// use restoc_core::{process_value, Escaper, FieldNode, ScalarType, Structure};
/// use restoc_codec::Value;
/// use restoc_exec::RecordingExecutor;
///
/// let s = Structure::builder("primary", "app", "t")
///     .field("n", FieldNode::scalar(ScalarType::Int))
///     .build()
///     .unwrap();
/// let exec = RecordingExecutor::new();
/// let esc = Escaper::new(&exec, "primary");
/// let list = Value::from(vec![Value::Integer(1), Value::Integer(2), Value::Null]);
/// assert_eq!(process_value(&s, &esc, "n", &list).unwrap(), "IN (1,2,NULL)");
/// ```
///
/// # Errors
///
/// Returns [`RecordError::UnknownField`] if `field` isn't in the structure,
/// or any error from [`Condition::from_value`] and [`Condition::compile`].
pub fn process_value(
    structure: &Structure,
    esc: &Escaper<'_>,
    field: &str,
    value: &Value,
) -> RecordResult<String> {
    let node = structure.require_field(field)?;
    Condition::from_value(field, value)?.compile(esc, field, node)
}

/// Compiles `` `field` <predicate> ``.
///
/// # Errors
///
/// Same as [`process_value`].
pub fn where_term(
    structure: &Structure,
    esc: &Escaper<'_>,
    field: &str,
    value: &Value,
) -> RecordResult<String> {
    Ok(format!("`{field}` {}", process_value(structure, esc, field, value)?))
}

/// An ordered list of field conditions, AND-joined when compiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    terms: Vec<(String, Value)>,
}

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value);
        self
    }

    /// Adds a condition in place.
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.terms.push((field.into(), value.into()));
    }

    /// Returns true if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Iterates over `(field, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.terms.iter().map(|(f, v)| (f.as_str(), v))
    }

    /// Builds a filter from a map value, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if `value` isn't a map.
    pub fn from_value(value: &Value) -> RecordResult<Self> {
        match value {
            Value::Map(m) => Ok(m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            other => Err(RecordError::invalid_argument(format!(
                "filter must be a map, got {}",
                other.kind()
            ))),
        }
    }

    /// Compiles every condition to `` `field` <predicate> ``.
    ///
    /// # Errors
    ///
    /// Returns the first compilation error.
    pub fn compile(&self, structure: &Structure, esc: &Escaper<'_>) -> RecordResult<Vec<String>> {
        self.iter()
            .map(|(field, value)| where_term(structure, esc, field, value))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
