//! STRICT JSON comparison: same keys, same values, same array order and length.
//!
//! Object key order is not significant. The result is a single pass/fail; callers report one
//! aggregate discrepancy per mismatching file.

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;

pub fn parse(bytes: &[u8], path: &Path) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|source| Error::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn strict_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            e.len() == a.len()
                && e.iter()
                    .all(|(k, v)| a.get(k).is_some_and(|av| strict_eq(v, av)))
        }
        (Value::Array(e), Value::Array(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(ev, av)| strict_eq(ev, av))
        }
        (Value::Number(e), Value::Number(a)) => numbers_eq(e, a),
        _ => expected == actual,
    }
}

/// `1` and `1.0` are the same JSON number.
fn numbers_eq(e: &serde_json::Number, a: &serde_json::Number) -> bool {
    if e == a {
        return true;
    }
    if e.is_f64() || a.is_f64() {
        return match (e.as_f64(), a.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
    }
    false
}
