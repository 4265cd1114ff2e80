use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{EvalError, EvalResult};
use crate::types::{AttributeValue, KeyValue};

/// Parses a canonical decimal string into a [`Decimal`], the arbitrary
/// precision numeric type used for all `N` comparisons and arithmetic.
fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).ok()
}

/// Compares two `N` attribute values by numeric value, not by string form,
/// so that `"4.2"` and `"4.20"` compare equal.
pub fn compare_numeric_strings(a: &str, b: &str) -> Ordering {
    match (parse_decimal(a), parse_decimal(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Numeric equality for two `N` attribute values, independent of trailing
/// zeros or sign-of-zero textual differences.
pub fn numbers_equal(a: &str, b: &str) -> bool {
    match (parse_decimal(a), parse_decimal(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Adds two canonical decimal strings with arbitrary precision, returning
/// the canonical string form of the sum.
pub fn add_numeric_strings(a: &str, b: &str) -> Option<String> {
    let x = parse_decimal(a)?;
    let y = parse_decimal(b)?;
    Some((x + y).normalize().to_string())
}

/// Subtracts `b` from `a` with arbitrary precision, returning the canonical
/// string form of the difference.
pub fn subtract_numeric_strings(a: &str, b: &str) -> Option<String> {
    let x = parse_decimal(a)?;
    let y = parse_decimal(b)?;
    Some((x - y).normalize().to_string())
}

/// Orders two primary-key component values the same way the order-preserving
/// key codec orders their encoded bytes: lexicographic for `S`/`B`, numeric
/// for `N`.
pub fn compare_key_values(a: &KeyValue, b: &KeyValue) -> Ordering {
    match (a, b) {
        (KeyValue::S(x), KeyValue::S(y)) => x.cmp(y),
        (KeyValue::B(x), KeyValue::B(y)) => x.cmp(y),
        (KeyValue::N(x), KeyValue::N(y)) => compare_numeric_strings(x, y),
        // Mismatched kinds have no defined order; fall back to a stable,
        // arbitrary-but-total order so callers never panic on malformed input.
        (KeyValue::S(_), _) => Ordering::Less,
        (_, KeyValue::S(_)) => Ordering::Greater,
        (KeyValue::N(_), _) => Ordering::Less,
        (_, KeyValue::N(_)) => Ordering::Greater,
    }
}

/// Orders two `AttributeValue`s for the condition-expression comparison
/// operators (`<`/`<=`/`>`/`>=`/`BETWEEN`), which DynamoDB-style semantics
/// only define across matching S/N/B operands.
pub fn compare_values(a: &AttributeValue, b: &AttributeValue) -> EvalResult<Ordering> {
    match (a, b) {
        (AttributeValue::N(x), AttributeValue::N(y)) => Ok(compare_numeric_strings(x, y)),
        (AttributeValue::S(x), AttributeValue::S(y)) => Ok(x.cmp(y)),
        (AttributeValue::B(x), AttributeValue::B(y)) => Ok(x.cmp(y)),
        _ => Err(EvalError::TypeMismatch(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}
