//! Field nodes: the typed description of one column.

use crate::error::{RecordError, RecordResult};
use restoc_codec::Value;
use std::fmt;
use std::str::FromStr;

/// The declared type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Anything. Can't be stored in a column.
    Any,
    /// Base64 text.
    Base64,
    /// Boolean, stored as `tinyint(1)`.
    Bool,
    /// `YYYY-MM-DD`.
    Date,
    /// `YYYY-MM-DD HH:MM:SS`.
    Datetime,
    /// Fixed point number.
    Decimal,
    /// Floating point number.
    Float,
    /// Signed integer.
    Int,
    /// Dotted IPv4 address.
    Ip,
    /// JSON text.
    Json,
    /// 32 hex characters.
    Md5,
    /// Money, two decimals.
    Price,
    /// Free text.
    String,
    /// `HH:MM:SS`.
    Time,
    /// Seconds since the epoch, stored as a `timestamp`.
    Timestamp,
    /// Unsigned integer.
    Uint,
    /// Any UUID.
    Uuid,
    /// Version 4 UUID.
    Uuid4,
}

impl ScalarType {
    /// Every scalar type.
    pub const ALL: [ScalarType; 18] = [
        ScalarType::Any,
        ScalarType::Base64,
        ScalarType::Bool,
        ScalarType::Date,
        ScalarType::Datetime,
        ScalarType::Decimal,
        ScalarType::Float,
        ScalarType::Int,
        ScalarType::Ip,
        ScalarType::Json,
        ScalarType::Md5,
        ScalarType::Price,
        ScalarType::String,
        ScalarType::Time,
        ScalarType::Timestamp,
        ScalarType::Uint,
        ScalarType::Uuid,
        ScalarType::Uuid4,
    ];

    /// Returns the type's name as written in structure files.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Any => "any",
            ScalarType::Base64 => "base64",
            ScalarType::Bool => "bool",
            ScalarType::Date => "date",
            ScalarType::Datetime => "datetime",
            ScalarType::Decimal => "decimal",
            ScalarType::Float => "float",
            ScalarType::Int => "int",
            ScalarType::Ip => "ip",
            ScalarType::Json => "json",
            ScalarType::Md5 => "md5",
            ScalarType::Price => "price",
            ScalarType::String => "string",
            ScalarType::Time => "time",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Uint => "uint",
            ScalarType::Uuid => "uuid",
            ScalarType::Uuid4 => "uuid4",
        }
    }

    /// Returns true for types quoted as-is, without escaping.
    pub fn is_fixed_format(self) -> bool {
        matches!(
            self,
            ScalarType::Base64
                | ScalarType::Date
                | ScalarType::Datetime
                | ScalarType::Md5
                | ScalarType::Time
                | ScalarType::Uuid
                | ScalarType::Uuid4
        )
    }

    /// Returns true for types rendered as decimal numbers.
    pub fn is_decimal(self) -> bool {
        matches!(self, ScalarType::Decimal | ScalarType::Float | ScalarType::Price)
    }

    /// Returns true for integer types.
    pub fn is_integer(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Uint)
    }

    /// Returns true if min/max bound the length rather than the value.
    pub fn bounds_length(self) -> bool {
        matches!(self, ScalarType::String | ScalarType::Base64)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| RecordError::InvalidFieldType {
                type_name: s.to_string(),
                node_class: "scalar".to_string(),
            })
    }
}

/// The class of a structured (non-scalar) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// A list of values.
    Array,
    /// A map with arbitrary keys.
    Hash,
    /// A map with declared children.
    Parent,
}

impl NodeClass {
    /// Returns the class name as written in structure files.
    pub fn name(self) -> &'static str {
        match self {
            NodeClass::Array => "array",
            NodeClass::Hash => "hash",
            NodeClass::Parent => "parent",
        }
    }

    /// Parses a class name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "array" => Some(NodeClass::Array),
            "hash" => Some(NodeClass::Hash),
            "parent" => Some(NodeClass::Parent),
            _ => None,
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-field storage hints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlHint {
    /// Column type overriding the one derived from the node.
    pub column_type: Option<String>,
    /// Column options overriding `null` / `not null`.
    pub opts: Option<String>,
    /// Store a structured value as JSON text.
    pub json: bool,
}

impl SqlHint {
    /// A hint that only sets the JSON flag.
    pub fn json() -> Self {
        Self {
            json: true,
            ..Self::default()
        }
    }

    /// Sets the column type.
    #[must_use]
    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    /// Sets the column options.
    #[must_use]
    pub fn with_opts(mut self, opts: impl Into<String>) -> Self {
        self.opts = Some(opts.into());
        self
    }
}

/// A scalar field description.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarNode {
    /// Declared type.
    pub kind: ScalarType,
    /// Whether `NULL` is allowed.
    pub optional: bool,
    /// Lower bound (length for strings).
    pub minimum: Option<Value>,
    /// Upper bound (length for strings).
    pub maximum: Option<Value>,
    /// Allowed values.
    pub options: Option<Vec<Value>>,
    /// Storage hints.
    pub sql: SqlHint,
}

impl ScalarNode {
    /// Creates a required node of `kind` with no constraints.
    pub fn new(kind: ScalarType) -> Self {
        Self {
            kind,
            optional: false,
            minimum: None,
            maximum: None,
            options: None,
            sql: SqlHint::default(),
        }
    }

    /// Marks the node optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets the bounds.
    #[must_use]
    pub fn with_range(mut self, minimum: Option<Value>, maximum: Option<Value>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Sets the maximum only.
    #[must_use]
    pub fn with_maximum(mut self, maximum: impl Into<Value>) -> Self {
        self.maximum = Some(maximum.into());
        self
    }

    /// Sets the allowed values.
    #[must_use]
    pub fn with_options<T: Into<Value>>(mut self, options: impl IntoIterator<Item = T>) -> Self {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the storage hints.
    #[must_use]
    pub fn with_sql(mut self, sql: SqlHint) -> Self {
        self.sql = sql;
        self
    }
}

/// A structured field description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredNode {
    /// Node class.
    pub class: NodeClass,
    /// Whether `NULL` is allowed.
    pub optional: bool,
    /// Storage hints. Only `json: true` nodes can be stored.
    pub sql: SqlHint,
}

/// The description of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode {
    /// A single typed value.
    Scalar(ScalarNode),
    /// A nested array or map.
    Structured(StructuredNode),
}

impl FieldNode {
    /// Creates a required scalar node.
    pub fn scalar(kind: ScalarType) -> Self {
        FieldNode::Scalar(ScalarNode::new(kind))
    }

    /// Creates a structured node stored as JSON text.
    pub fn json(class: NodeClass) -> Self {
        FieldNode::Structured(StructuredNode {
            class,
            optional: false,
            sql: SqlHint::json(),
        })
    }

    /// Creates a structured node without storage hints.
    pub fn structured(class: NodeClass) -> Self {
        FieldNode::Structured(StructuredNode {
            class,
            optional: false,
            sql: SqlHint::default(),
        })
    }

    /// Returns the storage hints.
    pub fn sql(&self) -> &SqlHint {
        match self {
            FieldNode::Scalar(n) => &n.sql,
            FieldNode::Structured(n) => &n.sql,
        }
    }

    /// Returns true if `NULL` is allowed.
    pub fn is_optional(&self) -> bool {
        match self {
            FieldNode::Scalar(n) => n.optional,
            FieldNode::Structured(n) => n.optional,
        }
    }

    /// Returns the scalar type, if this is a scalar node.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            FieldNode::Scalar(n) => Some(n.kind),
            FieldNode::Structured(_) => None,
        }
    }

    /// Returns true if values read back need JSON decoding.
    pub fn is_json(&self) -> bool {
        match self {
            FieldNode::Scalar(n) => n.kind == ScalarType::Json,
            FieldNode::Structured(n) => n.sql.json,
        }
    }

    /// Checks `value` against the node's type and constraints.
    ///
    /// Literals are never checked.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidValue`] naming `field`.
    pub fn validate(&self, field: &str, value: &Value) -> RecordResult<()> {
        if value.is_literal() {
            return Ok(());
        }
        if value.is_null() {
            return if self.is_optional() {
                Ok(())
            } else {
                Err(RecordError::invalid_value(field, "missing"))
            };
        }
        match self {
            FieldNode::Structured(node) => {
                let ok = match node.class {
                    NodeClass::Array => value.as_array().is_some(),
                    NodeClass::Hash | NodeClass::Parent => value.as_map().is_some(),
                };
                if ok {
                    Ok(())
                } else {
                    Err(RecordError::invalid_value(
                        field,
                        format!("expected {}, got {}", node.class, value.kind()),
                    ))
                }
            }
            FieldNode::Scalar(node) => validate_scalar(node, value)
                .map_err(|reason| RecordError::invalid_value(field, reason)),
        }
    }
}

fn validate_scalar(node: &ScalarNode, value: &Value) -> Result<(), String> {
    check_type(node.kind, value)?;

    if let Some(options) = &node.options {
        if !options.contains(value) {
            return Err(format!("{value} is not one of the allowed options"));
        }
    }

    if node.kind.bounds_length() {
        let len = value.as_text().map_or(0, |s| s.chars().count());
        #[allow(clippy::cast_possible_wrap)]
        let len = len as i64;
        if let Some(min) = node.minimum.as_ref().and_then(Value::as_integer) {
            if len < min {
                return Err(format!("shorter than {min} characters"));
            }
        }
        if let Some(max) = node.maximum.as_ref().and_then(Value::as_integer) {
            if len > max {
                return Err(format!("longer than {max} characters"));
            }
        }
    } else if node.kind.is_integer() || node.kind.is_decimal() {
        let Some(n) = numeric(value) else {
            return Ok(());
        };
        if let Some(min) = node.minimum.as_ref().and_then(Value::as_float) {
            if n < min {
                return Err(format!("less than {min}"));
            }
        }
        if let Some(max) = node.maximum.as_ref().and_then(Value::as_float) {
            if n > max {
                return Err(format!("greater than {max}"));
            }
        }
    } else if let Some(text) = value.as_text() {
        if let Some(min) = node.minimum.as_ref().and_then(Value::as_text) {
            if text < min {
                return Err(format!("before {min}"));
            }
        }
        if let Some(max) = node.maximum.as_ref().and_then(Value::as_text) {
            if text > max {
                return Err(format!("after {max}"));
            }
        }
    }

    Ok(())
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Text(s) => s.trim().parse().ok(),
        other => other.as_float(),
    }
}

fn check_type(kind: ScalarType, value: &Value) -> Result<(), String> {
    let mismatch = || format!("not a valid {kind}: {value}");
    let text = value.as_text();

    let ok = match kind {
        ScalarType::Any => true,
        ScalarType::Bool => matches!(value, Value::Bool(_) | Value::Integer(0 | 1)),
        ScalarType::Int => {
            value.as_integer().is_some() || text.is_some_and(|s| s.trim().parse::<i64>().is_ok())
        }
        ScalarType::Uint => match value {
            Value::Integer(n) => *n >= 0,
            Value::Text(s) => s.trim().parse::<u64>().is_ok(),
            _ => false,
        },
        ScalarType::Decimal | ScalarType::Float | ScalarType::Price => {
            numeric(value).is_some_and(f64::is_finite)
        }
        ScalarType::Timestamp => match value {
            Value::Integer(n) => *n >= 0,
            Value::Text(_) => true,
            _ => false,
        },
        ScalarType::Json => true,
        ScalarType::String => text.is_some(),
        ScalarType::Base64 => text.is_some_and(is_base64),
        ScalarType::Date => text.is_some_and(is_date),
        ScalarType::Datetime => text.is_some_and(|s| {
            s.is_ascii()
                && s.len() == 19
                && s.as_bytes()[10] == b' '
                && is_date(&s[..10])
                && is_time(&s[11..])
        }),
        ScalarType::Time => text.is_some_and(is_time),
        ScalarType::Md5 => text.is_some_and(|s| s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit())),
        ScalarType::Ip => text.is_some_and(is_ipv4),
        ScalarType::Uuid => text.is_some_and(is_uuid),
        ScalarType::Uuid4 => text.is_some_and(|s| is_uuid(s) && s.as_bytes()[14] == b'4'),
    };

    if ok {
        Ok(())
    } else {
        Err(mismatch())
    }
}

fn digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == 3 && digits(parts[0], 4) && digits(parts[1], 2) && digits(parts[2], 2)
}

fn is_time(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    parts.len() == 3 && parts.iter().all(|p| digits(p, 2))
}

fn is_ipv4(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.len() <= 3 && p.parse::<u8>().is_ok())
}

fn is_uuid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && [8, 4, 4, 4, 12]
            .iter()
            .zip(&groups)
            .all(|(len, g)| g.len() == *len && g.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn is_base64(s: &str) -> bool {
    s.len() % 4 == 0
        && s.trim_end_matches('=').bytes().all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_names_round_trip() {
        for kind in ScalarType::ALL {
            assert_eq!(kind.name().parse::<ScalarType>().unwrap(), kind);
        }
        assert!(matches!(
            "money".parse::<ScalarType>(),
            Err(RecordError::InvalidFieldType { .. })
        ));
    }

    #[test]
    fn null_requires_optional() {
        let required = FieldNode::scalar(ScalarType::Int);
        assert!(required.validate("n", &Value::Null).is_err());

        let optional = FieldNode::Scalar(ScalarNode::new(ScalarType::Int).optional());
        assert!(optional.validate("n", &Value::Null).is_ok());
    }

    #[test]
    fn literals_skip_validation() {
        let node = FieldNode::scalar(ScalarType::Datetime);
        assert!(node.validate("created", &Value::literal("NOW()")).is_ok());
    }

    #[test]
    fn string_length_bounds() {
        let node = FieldNode::Scalar(
            ScalarNode::new(ScalarType::String)
                .with_range(Some(Value::Integer(2)), Some(Value::Integer(4))),
        );
        assert!(node.validate("s", &Value::from("abc")).is_ok());
        assert!(node.validate("s", &Value::from("a")).is_err());
        assert!(node.validate("s", &Value::from("abcde")).is_err());
        assert!(node.validate("s", &Value::Integer(3)).is_err());
    }

    #[test]
    fn numeric_bounds_and_uint() {
        let node = FieldNode::Scalar(
            ScalarNode::new(ScalarType::Uint).with_range(None, Some(Value::Integer(10))),
        );
        assert!(node.validate("n", &Value::Integer(10)).is_ok());
        assert!(node.validate("n", &Value::Integer(11)).is_err());
        assert!(node.validate("n", &Value::Integer(-1)).is_err());
        assert!(node.validate("n", &Value::from("7")).is_ok());
    }

    #[test]
    fn options() {
        let node = FieldNode::Scalar(ScalarNode::new(ScalarType::String).with_options(["a", "b"]));
        assert!(node.validate("s", &Value::from("a")).is_ok());
        assert!(node.validate("s", &Value::from("c")).is_err());
    }

    #[test]
    fn fixed_formats() {
        let uuid = FieldNode::scalar(ScalarType::Uuid4);
        assert!(uuid
            .validate("id", &Value::from("0b4ea0b4-6e5c-4e0e-9a0e-1d2c3b4a5f60"))
            .is_ok());
        assert!(uuid
            .validate("id", &Value::from("0b4ea0b4-6e5c-1e0e-9a0e-1d2c3b4a5f60"))
            .is_err());

        let date = FieldNode::scalar(ScalarType::Date);
        assert!(date.validate("d", &Value::from("2024-02-29")).is_ok());
        assert!(date.validate("d", &Value::from("2024/02/29")).is_err());

        let dt = FieldNode::scalar(ScalarType::Datetime);
        assert!(dt.validate("d", &Value::from("2024-02-29 12:00:01")).is_ok());

        let ip = FieldNode::scalar(ScalarType::Ip);
        assert!(ip.validate("ip", &Value::from("10.0.0.255")).is_ok());
        assert!(ip.validate("ip", &Value::from("10.0.0.256")).is_err());
    }

    #[test]
    fn structured_shapes() {
        let tags = FieldNode::json(NodeClass::Array);
        assert!(tags.validate("tags", &Value::from(vec!["a"])).is_ok());
        assert!(tags.validate("tags", &Value::from("a")).is_err());

        let meta = FieldNode::json(NodeClass::Hash);
        assert!(meta.validate("meta", &Value::map([("k", Value::Integer(1))])).is_ok());
        assert!(meta.is_json());
    }
}
