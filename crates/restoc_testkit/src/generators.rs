//! Property-based test generators using proptest.
//!
//! Provides strategies for values and conditions that are valid for the
//! sample structures in [`crate::fixtures`].

use proptest::prelude::*;
use restoc_codec::Value;

/// Strategy for valid field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for any signed integer value.
pub fn int_value_strategy() -> impl Strategy<Value = Value> {
    any::<i64>().prop_map(Value::Integer)
}

/// Strategy for unsigned integers, as numbers or digit strings.
pub fn uint_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0..=i64::MAX).prop_map(Value::Integer),
        (0..=u32::MAX).prop_map(|n| Value::Text(n.to_string())),
    ]
}

/// Strategy for free text, including quotes, backslashes and control
/// characters.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => any::<char>(),
            1 => prop::sample::select(vec!['\'', '"', '\\', '\0', '\n', '\r', '\x1a', '%', '_']),
        ],
        0..32,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for lists of integers with some nulls mixed in.
pub fn int_list_strategy() -> impl Strategy<Value = Vec<Option<i64>>> {
    prop::collection::vec(prop::option::weighted(0.8, any::<i64>()), 1..16)
}

/// Strategy for a single operator name.
pub fn operator_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(restoc_core::OPERATORS.to_vec())
}

/// Strategy for an operator map holding `between` plus one other operator.
pub fn between_with_other_strategy() -> impl Strategy<Value = (i64, i64, Value)> {
    (
        any::<i32>(),
        any::<i32>(),
        operator_strategy().prop_filter("not between", |op| *op != "between"),
        any::<i32>(),
    )
        .prop_map(|(lo, hi, op, other)| {
            let (lo, hi) = (i64::from(lo), i64::from(hi));
            let map = Value::map([
                ("between", Value::from(vec![lo, hi])),
                (op, Value::Integer(i64::from(other))),
            ]);
            (lo, hi, map)
        })
}
