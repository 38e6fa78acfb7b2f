//! Value escaping: one typed value to one SQL literal.

use crate::error::{RecordError, RecordResult};
use crate::schema::{FieldNode, ScalarType};
use restoc_codec::{to_json, Value};
use restoc_exec::CommandExecutor;

const TRUTHY: [&str; 6] = ["true", "True", "TRUE", "t", "T", "1"];
const FALSY: [&str; 6] = ["false", "False", "FALSE", "f", "F", "0"];

/// Turns values into SQL literals for the fields they belong to.
///
/// Free text is escaped by the executor of the target host so the host's
/// charset rules apply.
#[derive(Clone, Copy)]
pub struct Escaper<'a> {
    exec: &'a dyn CommandExecutor,
    host: &'a str,
}

impl<'a> Escaper<'a> {
    /// Creates an escaper for statements run on `host`.
    pub fn new(exec: &'a dyn CommandExecutor, host: &'a str) -> Self {
        Self { exec, host }
    }

    /// The host escaping is done for.
    pub fn host(&self) -> &str {
        self.host
    }

    /// Escapes and single-quotes raw text.
    ///
    /// # Errors
    ///
    /// Returns an executor error if the host can't be reached.
    pub fn quote(&self, raw: &str) -> RecordResult<String> {
        Ok(format!("'{}'", self.exec.escape(self.host, raw)?))
    }

    /// Renders `value` as a literal for `field`.
    ///
    /// - `NULL` is rendered as `NULL`, literals are passed through
    /// - booleans become `1` or `0`
    /// - fixed-format strings (dates, hashes, UUIDs) are quoted unchanged
    /// - numbers are re-rendered from their parsed value
    /// - integer or all-digit timestamps become `FROM_UNIXTIME(n)`
    /// - structured values are JSON encoded, which needs the JSON flag
    /// - anything else is escaped and quoted
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnsupportedNode`] for structured fields
    /// without JSON storage and [`RecordError::InvalidValue`] for values
    /// that can't be rendered for the field's type.
    pub fn value(&self, field: &str, node: &FieldNode, value: &Value) -> RecordResult<String> {
        match value {
            Value::Literal(text) => return Ok(text.clone()),
            Value::Null => return Ok("NULL".to_string()),
            _ => {}
        }

        let kind = match node {
            FieldNode::Structured(n) => {
                if !n.sql.json {
                    return Err(RecordError::UnsupportedNode {
                        class: n.class.to_string(),
                        field: field.to_string(),
                    });
                }
                return self.quote(&to_json(value)?);
            }
            FieldNode::Scalar(n) => n.kind,
        };

        let invalid = |reason: &str| RecordError::invalid_value(field, format!("{reason}: {value}"));

        match kind {
            ScalarType::Bool => escape_bool(value).ok_or_else(|| invalid("not a boolean")),

            k if k.is_fixed_format() => match value.as_text() {
                Some(s) if !s.contains(['\'', '\\']) => Ok(format!("'{s}'")),
                Some(_) => Err(invalid("quote or backslash in fixed-format value")),
                None => Err(invalid(&format!("not a {k} string"))),
            },

            k if k.is_decimal() => {
                let n = match value {
                    Value::Float(f) => Some(*f),
                    Value::Integer(_) => value.as_float(),
                    Value::Text(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                match n {
                    Some(f) if f.is_finite() => Ok(format!("{f:?}")),
                    _ => Err(invalid("not a number")),
                }
            }

            k if k.is_integer() => {
                let n = match value {
                    Value::Integer(n) => Some(*n),
                    #[allow(clippy::cast_possible_truncation)]
                    Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
                    Value::Text(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                match n {
                    Some(n) if k == ScalarType::Uint && n < 0 => Err(invalid("negative")),
                    Some(n) => Ok(n.to_string()),
                    None => Err(invalid("not an integer")),
                }
            }

            ScalarType::Timestamp => match value {
                Value::Integer(n) => Ok(format!("FROM_UNIXTIME({n})")),
                Value::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                    Ok(format!("FROM_UNIXTIME({s})"))
                }
                _ => self.generic(value).ok_or_else(|| invalid("not a timestamp"))?,
            },

            ScalarType::Json => match value {
                Value::Text(s) => self.quote(s),
                other => self.quote(&to_json(other)?),
            },

            _ => self
                .generic(value)
                .ok_or_else(|| invalid("structured value for a scalar field"))?,
        }
    }

    fn generic(&self, value: &Value) -> Option<RecordResult<String>> {
        match value {
            Value::Text(s) => Some(self.quote(s)),
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) => {
                Some(self.quote(&value.to_string()))
            }
            _ => None,
        }
    }
}

fn escape_bool(value: &Value) -> Option<String> {
    let b = match value {
        Value::Bool(b) => *b,
        Value::Integer(0) => false,
        Value::Integer(1) => true,
        Value::Text(s) if TRUTHY.contains(&s.as_str()) => true,
        Value::Text(s) if FALSY.contains(&s.as_str()) => false,
        _ => return None,
    };
    Some(if b { "1" } else { "0" }.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeClass, ScalarNode};
    use restoc_exec::RecordingExecutor;

    fn esc(kind: ScalarType, value: Value) -> RecordResult<String> {
        let exec = RecordingExecutor::new();
        Escaper::new(&exec, "primary").value("f", &FieldNode::scalar(kind), &value)
    }

    #[test]
    fn null_and_literal() {
        assert_eq!(esc(ScalarType::Int, Value::Null).unwrap(), "NULL");
        assert_eq!(
            esc(ScalarType::Datetime, Value::literal("NOW()")).unwrap(),
            "NOW()"
        );
    }

    #[test]
    fn booleans() {
        assert_eq!(esc(ScalarType::Bool, Value::Bool(true)).unwrap(), "1");
        assert_eq!(esc(ScalarType::Bool, Value::Integer(0)).unwrap(), "0");
        assert_eq!(esc(ScalarType::Bool, Value::from("T")).unwrap(), "1");
        assert_eq!(esc(ScalarType::Bool, Value::from("FALSE")).unwrap(), "0");
        assert!(matches!(
            esc(ScalarType::Bool, Value::from("yes")),
            Err(RecordError::InvalidValue { .. })
        ));
        assert!(esc(ScalarType::Bool, Value::Integer(2)).is_err());
    }

    #[test]
    fn fixed_formats_are_quoted_as_is() {
        assert_eq!(
            esc(ScalarType::Date, Value::from("2024-01-31")).unwrap(),
            "'2024-01-31'"
        );
        assert_eq!(
            esc(ScalarType::Uuid4, Value::from("abc")).unwrap(),
            "'abc'"
        );
        assert!(esc(ScalarType::Md5, Value::from("x'; DROP")).is_err());
        assert!(esc(ScalarType::Date, Value::Integer(20240131)).is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(esc(ScalarType::Float, Value::Integer(5)).unwrap(), "5.0");
        assert_eq!(esc(ScalarType::Price, Value::from("19.99")).unwrap(), "19.99");
        assert_eq!(esc(ScalarType::Int, Value::from(" 42 ")).unwrap(), "42");
        assert_eq!(esc(ScalarType::Int, Value::Float(3.0)).unwrap(), "3");
        assert!(esc(ScalarType::Int, Value::Float(3.5)).is_err());
        assert!(esc(ScalarType::Uint, Value::Integer(-1)).is_err());
        assert!(esc(ScalarType::Decimal, Value::from("abc")).is_err());
    }

    #[test]
    fn timestamps() {
        assert_eq!(
            esc(ScalarType::Timestamp, Value::Integer(1700000000)).unwrap(),
            "FROM_UNIXTIME(1700000000)"
        );
        assert_eq!(
            esc(ScalarType::Timestamp, Value::from("1700000000")).unwrap(),
            "FROM_UNIXTIME(1700000000)"
        );
        assert_eq!(
            esc(ScalarType::Timestamp, Value::from("2024-01-01 00:00:00")).unwrap(),
            "'2024-01-01 00:00:00'"
        );
    }

    #[test]
    fn strings_go_through_the_executor() {
        assert_eq!(
            esc(ScalarType::String, Value::from("O'Brien")).unwrap(),
            "'O\\'Brien'"
        );
        assert_eq!(esc(ScalarType::String, Value::Integer(7)).unwrap(), "'7'");
        assert!(esc(ScalarType::String, Value::from(vec![1i64])).is_err());
    }

    #[test]
    fn structured_values_need_json_flag() {
        let exec = RecordingExecutor::new();
        let e = Escaper::new(&exec, "primary");
        let tags = Value::from(vec!["a", "b"]);

        let stored = FieldNode::json(NodeClass::Array);
        assert_eq!(e.value("tags", &stored, &tags).unwrap(), r#"'[\"a\",\"b\"]'"#);

        let bare = FieldNode::structured(NodeClass::Array);
        assert!(matches!(
            e.value("tags", &bare, &tags),
            Err(RecordError::UnsupportedNode { .. })
        ));
    }

    #[test]
    fn json_scalar_encodes_structures() {
        let exec = RecordingExecutor::new();
        let e = Escaper::new(&exec, "primary");
        let node = FieldNode::Scalar(ScalarNode::new(ScalarType::Json));
        assert_eq!(
            e.value("j", &node, &Value::map([("a", Value::Integer(1))])).unwrap(),
            r#"'{\"a\":1}'"#
        );
    }
}
