//! Typing of scalar text read from INI values and XML element bodies.

use crate::tree::Value;

/// Picks the most specific value for untyped text.
///
/// Empty text is null. Then, in order: `true`/`false` (any case), a signed
/// decimal integer that fits `i64`, a float written the way floats are
/// written back (`1.5`, `1e20`, `inf`, `NaN`), and finally the text itself.
pub(super) fn coerce_scalar(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    if let Some(b) = parse_bool(text) {
        return Value::Bool(b);
    }
    if is_integer_literal(text) {
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
    }
    if is_float_literal(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::String(text.to_owned())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn unsigned(text: &str) -> &str {
    text.strip_prefix(['-', '+']).unwrap_or(text)
}

fn is_integer_literal(text: &str) -> bool {
    let digits = unsigned(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_literal(text: &str) -> bool {
    let body = unsigned(text);
    if matches!(body, "inf" | "NaN") {
        return true;
    }
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.contains(['.', 'e', 'E'])
}
