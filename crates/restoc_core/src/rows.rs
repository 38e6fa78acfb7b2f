//! Decoding of rows read back from a host.

use crate::error::RecordResult;
use crate::schema::{Decode, Structure};
use restoc_codec::{from_json, Value};
use restoc_exec::Row;

/// Decodes boolean and JSON columns of `row` in place.
///
/// Columns missing from the row or holding `NULL` are left alone.
///
/// # Errors
///
/// Returns a codec error if a JSON column holds invalid JSON.
pub fn process_row(structure: &Structure, row: &mut Row) -> RecordResult<()> {
    for (field, decode) in structure.to_process() {
        let Some(value) = row.get_mut(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        match decode {
            Decode::Bool => *value = Value::Bool(value.is_truthy()),
            Decode::Json => {
                if let Value::Text(text) = value {
                    *value = from_json(text)?;
                }
            }
        }
    }
    Ok(())
}

/// Decodes every row in `rows`.
///
/// # Errors
///
/// Same as [`process_row`].
pub fn process_rows(structure: &Structure, rows: &mut [Row]) -> RecordResult<()> {
    if structure.to_process().is_empty() {
        return Ok(());
    }
    rows.iter_mut().try_for_each(|row| process_row(structure, row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldNode, NodeClass, ScalarType};

    fn structure() -> Structure {
        Structure::builder("primary", "app", "t")
            .field("flag", FieldNode::scalar(ScalarType::Bool))
            .field("meta", FieldNode::json(NodeClass::Hash))
            .field("raw", FieldNode::scalar(ScalarType::Json))
            .field("name", FieldNode::scalar(ScalarType::String))
            .build()
            .unwrap()
    }

    #[test]
    fn decodes_bool_and_json() {
        let mut row = Row::new();
        row.insert("flag".into(), Value::Integer(1));
        row.insert("meta".into(), Value::from(r#"{"a":1}"#));
        row.insert("raw".into(), Value::from("[1,2]"));
        row.insert("name".into(), Value::from("[not json]"));

        process_row(&structure(), &mut row).unwrap();
        assert_eq!(row["flag"], Value::Bool(true));
        assert_eq!(row["meta"], Value::map([("a", Value::Integer(1))]));
        assert_eq!(row["raw"], Value::from(vec![1i64, 2]));
        assert_eq!(row["name"], Value::from("[not json]"));
    }

    #[test]
    fn nulls_and_missing_columns_are_untouched() {
        let mut row = Row::new();
        row.insert("flag".into(), Value::Null);
        process_row(&structure(), &mut row).unwrap();
        assert_eq!(row["flag"], Value::Null);
        assert!(!row.contains_key("meta"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut rows = vec![Row::from([("meta".to_string(), Value::from("{"))])];
        assert!(process_rows(&structure(), &mut rows).is_err());
    }
}
