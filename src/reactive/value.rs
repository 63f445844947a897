//! Value coercions shared by the renderer, the router and handler dispatch.
//!
//! State values are plain `serde_json::Value`s; the coercions here give them
//! the loose semantics template authors expect from script-like templates.

use serde_json::{Number, Value};

/// `false`, `0`, `NaN`, `""` and `null` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form used when a value is interpolated into markup.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                // nested nulls print as empty
                Value::Null => String::new(),
                other => to_display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn format_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            // f64 `Display` never switches to exponent notation
            if f == 0.0 {
                return "0".to_string();
            }
            return f.to_string();
        }
    }
    n.to_string()
}

/// Numeric coercion. `None` means the value has no numeric reading.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse().ok()
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Build a number value, keeping integral results as integers.
pub fn number(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Equality used by `==` and `===`. Numbers compare by value.
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(to_display(&json!(3)), "3");
        assert_eq!(to_display(&json!(2.0)), "2");
        assert_eq!(to_display(&json!(2.5)), "2.5");
        assert_eq!(to_display(&json!([1, null, "a"])), "1,,a");
        assert_eq!(to_display(&json!({"a": 1})), "[object Object]");
        assert_eq!(to_display(&json!(null)), "null");
    }

    #[test]
    fn test_number_round_trips_integers() {
        assert_eq!(number(4.0), json!(4));
        assert_eq!(number(0.5), json!(0.5));
        assert_eq!(number(f64::NAN), Value::Null);
    }

    #[test]
    fn test_integers_beyond_i64_keep_their_value() {
        assert_eq!(to_display(&json!(1e20)), "100000000000000000000");
        assert_eq!(to_display(&json!(-0.0)), "0");
        assert_eq!(to_display(&json!(i64::MAX)), "9223372036854775807");

        let big = number(1e20);
        assert_eq!(big.as_f64(), Some(1e20));
        assert_eq!(to_display(&big), "100000000000000000000");
        // 2^63 is one past i64::MAX
        assert_eq!(number(9_223_372_036_854_775_808.0).as_f64(), Some(9_223_372_036_854_775_808.0));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&json!(null)), Some(0.0));
        assert_eq!(to_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(to_number(&json!("abc")), None);
        assert_eq!(to_number(&json!([1])), None);
    }
}
