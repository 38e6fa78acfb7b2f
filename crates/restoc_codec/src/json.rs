//! JSON text encoding for values stored in text columns.

use crate::error::{CodecError, CodecResult};
use crate::value::{Value, ValueMap};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Number};

/// Encodes a value as compact JSON text.
///
/// Literals encode as their raw text, the same way they render in SQL.
pub fn to_json(value: &Value) -> CodecResult<String> {
    let json = to_json_value(value)?;
    serde_json::to_string(&json).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Decodes JSON text into a value.
pub fn from_json(text: &str) -> CodecResult<Value> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    Ok(Value::from(json))
}

/// Converts a value into a `serde_json::Value`.
pub fn to_json_value(value: &Value) -> CodecResult<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number(Number::from(*n)),
        Value::Float(f) => {
            serde_json::Value::Number(Number::from_f64(*f).ok_or(CodecError::NonFiniteFloat)?)
        }
        Value::Text(s) | Value::Literal(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => serde_json::Value::Array(
            items
                .iter()
                .map(to_json_value)
                .collect::<CodecResult<Vec<_>>>()?,
        ),
        Value::Map(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), to_json_value(v)?);
            }
            serde_json::Value::Object(out)
        }
    })
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<ValueMap>(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json_value(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_nested_map() {
        let value = Value::map([
            ("old", Value::Null),
            ("new", Value::from("inserted")),
        ]);
        assert_eq!(to_json(&value).unwrap(), r#"{"new":"inserted","old":null}"#);
    }

    #[test]
    fn decode_integers_and_floats() {
        assert_eq!(from_json("5").unwrap(), Value::Integer(5));
        assert_eq!(from_json("5.5").unwrap(), Value::Float(5.5));
        assert_eq!(
            from_json("[1,null]").unwrap(),
            Value::Array(vec![Value::Integer(1), Value::Null])
        );
    }

    #[test]
    fn literal_encodes_as_text() {
        assert_eq!(to_json(&Value::literal("NOW()")).unwrap(), r#""NOW()""#);
    }

    #[test]
    fn nan_is_rejected() {
        assert_eq!(
            to_json(&Value::Float(f64::NAN)),
            Err(CodecError::NonFiniteFloat)
        );
    }

    #[test]
    fn invalid_text_fails() {
        assert!(matches!(
            from_json("{not json"),
            Err(CodecError::DecodingFailed { .. })
        ));
    }

    #[test]
    fn serde_roundtrip_through_struct() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Holder {
            value: Value,
        }

        let holder: Holder = serde_json::from_str(r#"{"value":{"a":[true,"x"]}}"#).unwrap();
        assert_eq!(
            holder.value,
            Value::map([(
                "a",
                Value::Array(vec![Value::Bool(true), Value::from("x")])
            )])
        );
        let text = serde_json::to_string(&holder).unwrap();
        assert_eq!(text, r#"{"value":{"a":[true,"x"]}}"#);
    }
}
