//! Benchmark utilities.

use restoc_codec::Value;
use restoc_core::{AutoPrimary, Filter, FieldNode, IndexDef, ScalarNode, ScalarType, Structure};

/// A users table with a spread of field types.
pub fn sample_structure() -> Structure {
    Structure::builder("primary", "bench", "users")
        .primary("_id")
        .auto_primary(AutoPrimary::AutoIncrement)
        .field("_id", FieldNode::scalar(ScalarType::Uint))
        .field(
            "email",
            FieldNode::Scalar(ScalarNode::new(ScalarType::String).with_maximum(127)),
        )
        .field(
            "name",
            FieldNode::Scalar(
                ScalarNode::new(ScalarType::String)
                    .optional()
                    .with_maximum(64),
            ),
        )
        .field("age", FieldNode::scalar(ScalarType::Uint))
        .field("score", FieldNode::scalar(ScalarType::Float))
        .field("created", FieldNode::scalar(ScalarType::Timestamp))
        .index(IndexDef::unique("ui_email", ["email"]).expect("valid index"))
        .build()
        .expect("valid bench structure")
}

/// Generate `count` ids as an IN list.
pub fn id_list(count: usize) -> Value {
    Value::from((0..count as i64).collect::<Vec<_>>())
}

/// A filter touching every condition shape.
pub fn mixed_filter() -> Filter {
    Filter::new()
        .with("email", "o'brien@example.com")
        .with("name", Value::Null)
        .with("age", Value::map([("between", Value::from(vec![18, 65]))]))
        .with("score", Value::map([("gte", Value::Float(2.5))]))
        .with("created", Value::map([("lt", Value::Integer(1_700_000_000))]))
}

/// Generate `count` rows of field values for inserts.
pub fn user_rows(count: usize) -> Vec<Vec<(&'static str, Value)>> {
    (0..count)
        .map(|i| {
            vec![
                ("email", Value::from(format!("user{i}@example.com"))),
                ("name", Value::from(format!("User {i}"))),
                ("age", Value::Integer(20 + (i % 50) as i64)),
                ("score", Value::Float(i as f64 / 3.0)),
                ("created", Value::Integer(1_700_000_000 + i as i64)),
            ]
        })
        .collect()
}
