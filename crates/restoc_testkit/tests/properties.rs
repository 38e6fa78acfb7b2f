//! Property tests for value escaping and condition compilation.

use proptest::prelude::*;
use restoc_codec::Value;
use restoc_core::{process_value, where_term, Escaper, FieldNode, ScalarType, Structure};
use restoc_exec::RecordingExecutor;
use restoc_testkit::prelude::*;

fn numbers() -> Structure {
    Structure::builder("primary", "app", "numbers")
        .field("u", FieldNode::scalar(ScalarType::Uint))
        .field("i", FieldNode::scalar(ScalarType::Int))
        .field("s", FieldNode::scalar(ScalarType::String))
        .build()
        .unwrap()
}

/// Reverses MySQL string escaping.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('Z') => out.push('\x1a'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

proptest! {
    #[test]
    fn unsigned_values_render_as_digits(v in uint_value_strategy()) {
        let s = numbers();
        let exec = RecordingExecutor::new();
        let esc = Escaper::new(&exec, "primary");
        let sql = process_value(&s, &esc, "u", &v).unwrap();
        let digits = sql.strip_prefix("= ").unwrap();
        prop_assert!(!digits.is_empty());
        prop_assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn signed_values_render_as_integers(v in int_value_strategy()) {
        let s = numbers();
        let exec = RecordingExecutor::new();
        let esc = Escaper::new(&exec, "primary");
        let sql = process_value(&s, &esc, "i", &v).unwrap();
        prop_assert_eq!(sql, format!("= {}", v.as_integer().unwrap()));
    }

    #[test]
    fn lists_keep_order_and_nulls(items in int_list_strategy()) {
        let s = numbers();
        let exec = RecordingExecutor::new();
        let esc = Escaper::new(&exec, "primary");
        let expected = items
            .iter()
            .map(|i| i.map_or_else(|| "NULL".to_string(), |n| n.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        let value = Value::from(items);
        prop_assert_eq!(
            process_value(&s, &esc, "i", &value).unwrap(),
            format!("IN ({expected})")
        );
    }

    #[test]
    fn between_wins_over_other_operators((lo, hi, map) in between_with_other_strategy()) {
        let s = numbers();
        let exec = RecordingExecutor::new();
        let esc = Escaper::new(&exec, "primary");
        prop_assert_eq!(
            where_term(&s, &esc, "i", &map).unwrap(),
            format!("`i` BETWEEN {lo} AND {hi}")
        );
    }

    #[test]
    fn text_escaping_round_trips(text in text_value_strategy()) {
        let s = numbers();
        let exec = RecordingExecutor::new();
        let esc = Escaper::new(&exec, "primary");
        let sql = process_value(&s, &esc, "s", &Value::from(text.as_str())).unwrap();
        let quoted = sql.strip_prefix("= ").unwrap();
        prop_assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
        prop_assert_eq!(unescape(quoted), text);
    }

    #[test]
    fn operators_are_recognized(op in operator_strategy(), n in any::<i32>()) {
        let s = numbers();
        let exec = RecordingExecutor::new();
        let esc = Escaper::new(&exec, "primary");
        let operand = if op == "between" {
            Value::from(vec![n, n])
        } else {
            Value::from(n)
        };
        let sql = process_value(&s, &esc, "i", &Value::map([(op, operand)])).unwrap();
        prop_assert!(sql.contains(&n.to_string()));
    }
}

#[test]
fn null_and_equality() {
    let s = numbers();
    let exec = RecordingExecutor::new();
    let esc = Escaper::new(&exec, "primary");
    assert_eq!(where_term(&s, &esc, "i", &Value::Null).unwrap(), "`i` IS NULL");
    assert_eq!(
        where_term(&s, &esc, "i", &Value::map([("neq", Value::Null)])).unwrap(),
        "`i` IS NOT NULL"
    );
    assert_eq!(where_term(&s, &esc, "i", &Value::Integer(5)).unwrap(), "`i` = 5");
    assert_eq!(
        where_term(&s, &esc, "i", &Value::map([("neq", Value::from(vec![1, 2]))])).unwrap(),
        "`i` NOT IN (1,2)"
    );
}

#[test]
fn rejected_inputs() {
    let s = numbers();
    let exec = RecordingExecutor::new();
    let esc = Escaper::new(&exec, "primary");
    assert!(process_value(&s, &esc, "u", &Value::Integer(-1)).is_err());
    assert!(process_value(&s, &esc, "i", &Value::from("twelve")).is_err());
    assert!(process_value(&s, &esc, "i", &Value::from(Vec::<Value>::new())).is_err());
    assert!(process_value(&s, &esc, "i", &Value::map([("near", Value::Integer(1))])).is_err());
    assert!(process_value(&s, &esc, "missing", &Value::Integer(1)).is_err());
}
