//! Value conversion shared by the engine modules.
//!
//! Postgres and MySQL answer ad-hoc SQL over their text protocols, so each
//! value arrives as text plus a column type name. The engine module maps the
//! type name to a [`ValueKind`]; [`from_text`] produces the JSON value.

use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Bool,
    Integer,
    Float,
    Json,
    Text,
}

pub(crate) fn from_text(kind: ValueKind, text: &str) -> Value {
    match kind {
        ValueKind::Bool => match text {
            "t" | "true" | "1" => Value::Bool(true),
            "f" | "false" | "0" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        ValueKind::Integer => integer(text),
        ValueKind::Float => match text.parse::<f64>() {
            Ok(f) => float(f),
            Err(_) => Value::String(text.to_string()),
        },
        ValueKind::Json => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
        ValueKind::Text => Value::String(text.to_string()),
    }
}

/// Signed first, then unsigned (BIGINT UNSIGNED), else the text itself.
pub(crate) fn integer(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(u) = text.parse::<u64>() {
        return Value::from(u);
    }
    Value::String(text.to_string())
}

/// NaN and infinities have no JSON form and become null.
pub(crate) fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

pub(crate) fn bytes(b: &[u8]) -> Value {
    Value::String(hex::encode(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integers() {
        assert_eq!(from_text(ValueKind::Integer, "1"), json!(1));
        assert_eq!(from_text(ValueKind::Integer, "-42"), json!(-42));
        assert_eq!(
            from_text(ValueKind::Integer, "18446744073709551615"),
            json!(18446744073709551615u64)
        );
        assert_eq!(from_text(ValueKind::Integer, "12abc"), json!("12abc"));
    }

    #[test]
    fn test_floats() {
        assert_eq!(from_text(ValueKind::Float, "1.5"), json!(1.5));
        assert_eq!(from_text(ValueKind::Float, "NaN"), Value::Null);
        assert_eq!(from_text(ValueKind::Float, "inf"), Value::Null);
    }

    #[test]
    fn test_bools() {
        assert_eq!(from_text(ValueKind::Bool, "t"), json!(true));
        assert_eq!(from_text(ValueKind::Bool, "0"), json!(false));
        assert_eq!(from_text(ValueKind::Bool, "maybe"), json!("maybe"));
    }

    #[test]
    fn test_json_falls_back_to_text() {
        assert_eq!(from_text(ValueKind::Json, r#"{"a":[1,2]}"#), json!({"a": [1, 2]}));
        assert_eq!(from_text(ValueKind::Json, "{broken"), json!("{broken"));
    }

    #[test]
    fn test_bytes_are_hex() {
        assert_eq!(bytes(&[0xde, 0xad, 0x01]), json!("dead01"));
    }
}
