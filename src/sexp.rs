//! Plist helpers shared by config and replay parsing.

use lexpr::Value;

/// Name of a plist key, accepting both `Keyword` and `:`-prefixed `Symbol`.
pub fn key_name(value: &Value) -> Option<&str> {
    match value {
        Value::Keyword(k) => Some(k.as_ref()),
        Value::Symbol(s) => s.strip_prefix(':'),
        _ => None,
    }
}

/// Raw value following `:key` in a plist.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    plist_pairs(value)
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Key/value pairs of a plist, in order.  Stray non-key items are skipped.
pub fn plist_pairs(value: &Value) -> Vec<(&str, &Value)> {
    let items = list_items(value);
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < items.len() {
        match key_name(items[i]) {
            Some(k) if i + 1 < items.len() => {
                pairs.push((k, items[i + 1]));
                i += 2;
            }
            _ => i += 1,
        }
    }
    pairs
}

/// Elements of a proper list (no flattening).
pub fn list_items(value: &Value) -> Vec<&Value> {
    let mut result = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        result.push(pair.car());
        current = pair.cdr();
    }
    result
}

/// Numeric value, if `value` is a number.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Truthiness in Emacs terms: `nil`, `()` and `#f` are false.
pub fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null | Value::Nil => false,
        Value::Symbol(s) => s.as_ref() != "nil",
        _ => true,
    }
}

/// Symbolic value as a bare name (`:right`, `right`, `"right"` all give `right`).
pub fn as_name(value: &Value) -> Option<&str> {
    match value {
        Value::Keyword(k) => Some(k.as_ref()),
        Value::Symbol(s) => Some(s.strip_prefix(':').unwrap_or(s.as_ref())),
        Value::String(s) => Some(s.as_ref()),
        _ => None,
    }
}

pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_value(value, key).and_then(as_f64)
}
