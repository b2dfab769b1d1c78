//! Loose value coercion shared by the condition evaluators
//!
//! Every helper takes `Option<&Value>`: `None` is a missing key, which is kept
//! distinct from an explicit JSON `null` (it stringifies as `undefined`).

use serde_json::{Number, Value};
use std::borrow::Cow;

/// Null or missing
pub(crate) fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// The finite number a value converts to, unless it is null, missing or `""`
pub(crate) fn numeric_like(value: Option<&Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        _ => Some(to_number(value)).filter(|n| n.is_finite()),
    }
}

/// Numeric conversion; `NaN` when the value has no numeric reading
pub(crate) fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None | Some(Value::Object(_)) => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(Value::Array(_)) => parse_number(&string_form(value)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64);
        }
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // f64::from_str also accepts "inf"/"nan" spellings, which are not numbers here
    let plain = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !plain {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Display form used for string equality and list membership
pub(crate) fn string_form(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None => Cow::Borrowed("undefined"),
        Some(Value::Null) => Cow::Borrowed("null"),
        Some(Value::Bool(true)) => Cow::Borrowed("true"),
        Some(Value::Bool(false)) => Cow::Borrowed("false"),
        Some(Value::Number(n)) => Cow::Owned(format_number(n)),
        Some(Value::String(s)) => Cow::Borrowed(s),
        Some(Value::Array(items)) => Cow::Owned(
            items
                .iter()
                .map(|item| match item {
                    Value::Null => Cow::Borrowed(""),
                    other => string_form(Some(other)),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Some(Value::Object(_)) => Cow::Borrowed("[object Object]"),
    }
}

fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f == 0.0 {
        "0".to_string()
    } else if f.abs() >= 1e21 || f.abs() < 1e-6 {
        exponent_form(f)
    } else if f.fract() == 0.0 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

/// `1e-7`, `1.5e+21`: the exponent always carries its sign
fn exponent_form(f: f64) -> String {
    let text = format!("{f:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}

/// Coercive equality used by the RLS group path
pub(crate) fn loose_eq(left: Option<&Value>, right: Option<&Value>) -> bool {
    let (Some(l), Some(r)) = (left.filter(|v| !v.is_null()), right.filter(|v| !v.is_null()))
    else {
        return is_nullish(left) && is_nullish(right);
    };

    match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => false,
        (Value::Array(_) | Value::Object(_), _) => {
            let primitive = Value::String(string_form(Some(l)).into_owned());
            loose_eq(Some(&primitive), Some(r))
        }
        (_, Value::Array(_) | Value::Object(_)) => {
            let primitive = Value::String(string_form(Some(r)).into_owned());
            loose_eq(Some(l), Some(&primitive))
        }
        _ => to_number(Some(l)) == to_number(Some(r)),
    }
}

/// Membership of `member` in the comma-separated, trimmed form of `list`
pub(crate) fn in_list(list: Option<&Value>, member: Option<&Value>) -> bool {
    let member = string_form(member);
    string_form(list)
        .split(',')
        .map(str::trim)
        .any(|item| item == member)
}
