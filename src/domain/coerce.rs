//! Lenient coercion of loosely-typed document values.
//!
//! Raw rows and persisted documents are JSON objects written by tools we don't
//! control: numbers arrive as strings, integers as floats, and so on. These
//! helpers turn a `serde_json::Value` into a number or report "missing".
//! Nothing here ever substitutes zero for an unparseable value.

use serde_json::{Map, Value};

use crate::domain::Period;

/// Coerce to a finite float. Numeric strings are accepted; booleans, nulls,
/// arrays and objects are not.
pub fn as_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Coerce to a whole number without losing information.
///
/// `2024`, `2024.0` and `"2024"` all yield `2024`; `2024.5` yields `None`.
/// Used for identity fields on the way in, where silently truncating would
/// invent a different period.
pub fn as_whole_number(value: &Value) -> Option<i64> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    let v = as_f64(value)?;
    if v.fract() != 0.0 || v.abs() > i64::MAX as f64 {
        return None;
    }
    Some(v as i64)
}

/// Coerce to an integer, truncating toward zero.
///
/// Floats are truncated (`2024.7` -> `2024`), strings must be integer literals
/// (`"2024"` is accepted, `"2024.0"` is not). This is the repair rule applied to
/// already-persisted documents.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            let v = n.as_f64()?;
            if !v.is_finite() || v.abs() > i64::MAX as f64 {
                return None;
            }
            Some(v.trunc() as i64)
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Coerced `(year, month)` integers of a persisted document, without any
/// calendar range check.
pub fn integer_key(doc: &Map<String, Value>) -> Option<(i64, i64)> {
    let year = doc.get("year").and_then(as_integer)?;
    let month = doc.get("month").and_then(as_integer)?;
    Some((year, month))
}

/// Resolve the `(year, month)` key of a persisted document, if it has a valid one.
pub fn period_key(doc: &Map<String, Value>) -> Option<Period> {
    let (year, month) = integer_key(doc)?;
    Period::new(i32::try_from(year).ok()?, u32::try_from(month).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn f64_accepts_numeric_strings() {
        assert_eq!(as_f64(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(as_f64(&json!(3)), Some(3.0));
        assert_eq!(as_f64(&json!("n/a")), None);
        assert_eq!(as_f64(&json!(null)), None);
        assert_eq!(as_f64(&json!(true)), None);
        assert_eq!(as_f64(&json!("NaN")), None);
    }

    #[test]
    fn whole_number_rejects_fractions() {
        assert_eq!(as_whole_number(&json!("2024")), Some(2024));
        assert_eq!(as_whole_number(&json!(2024.0)), Some(2024));
        assert_eq!(as_whole_number(&json!("3.0")), Some(3));
        assert_eq!(as_whole_number(&json!(2024.5)), None);
    }

    #[test]
    fn integer_truncates_floats_but_not_float_strings() {
        assert_eq!(as_integer(&json!(2024.7)), Some(2024));
        assert_eq!(as_integer(&json!("2024")), Some(2024));
        assert_eq!(as_integer(&json!("2024.0")), None);
        assert_eq!(as_integer(&json!(null)), None);
    }

    #[test]
    fn period_key_coerces_loose_types() {
        let doc = json!({"year": "2024", "month": 3.0});
        let key = period_key(doc.as_object().unwrap());
        assert_eq!(key, Period::new(2024, 3));

        let bad = json!({"year": 2024, "month": 2024.0});
        assert_eq!(period_key(bad.as_object().unwrap()), None);
        assert_eq!(integer_key(bad.as_object().unwrap()), Some((2024, 2024)));
    }
}
