use super::expression::{AttrType, CompareOp, Condition};
use crate::error::EvalResult;
use crate::types::{AttributeValue, Item};
use crate::utils::{compare_values, numbers_equal};

pub fn evaluate(condition: &Condition, item: &Item) -> EvalResult {
    match condition {
        Condition::Compare { path, op, value } => {
            let attr = path.resolve(item);
            match attr {
                Some(a) => eval_compare(a, op, value),
                None => Ok(matches!(op, CompareOp::Ne)),
            }
        }
        Condition::Between { path, low, high } => match path.resolve(item) {
            Some(a) => {
                let ge_low = compare_values(a, low)?.is_ge();
                let le_high = compare_values(a, high)?.is_le();
                Ok(ge_low && le_high)
            }
            None => Ok(false),
        },
        Condition::AttributeExists(path) => Ok(path.resolve(item).is_some()),
        Condition::AttributeNotExists(path) => Ok(path.resolve(item).is_none()),
        Condition::BeginsWith { path, prefix } => {
            let attr = path.resolve(item);
            match (attr, prefix) {
                (Some(AttributeValue::S(s)), AttributeValue::S(p)) => Ok(s.starts_with(p)),
                (Some(AttributeValue::B(b)), AttributeValue::B(p)) => Ok(b.starts_with(p)),
                _ => Ok(false),
            }
        }
        Condition::Contains { path, operand } => {
            let attr = path.resolve(item);
            eval_contains(attr, operand)
        }
        Condition::AttributeType {
            path,
            attribute_type,
        } => {
            let attr = path.resolve(item);
            match attr {
                Some(a) => Ok(matches_type(a, *attribute_type)),
                None => Ok(false),
            }
        }
        Condition::Size { path, op, value } => {
            let attr = path.resolve(item);
            match attr {
                Some(a) => {
                    let size = get_size(a);
                    Ok(eval_size_compare(size, op, *value))
                }
                None => Ok(false),
            }
        }
        Condition::In { path, values } => {
            let attr = path.resolve(item);
            match attr {
                Some(a) => Ok(values.iter().any(|v| values_equal(a, v))),
                None => Ok(false),
            }
        }
        Condition::And(left, right) => {
            let left_result = evaluate(left, item)?;
            if !left_result {
                return Ok(false); // short-circuit
            }
            evaluate(right, item)
        }
        Condition::Or(left, right) => {
            let left_result = evaluate(left, item)?;
            if left_result {
                return Ok(true); // short-circuit
            }
            evaluate(right, item)
        }
        Condition::Not(inner) => evaluate(inner, item).map(|r| !r),
    }
}

fn eval_compare(attr: &AttributeValue, op: &CompareOp, value: &AttributeValue) -> EvalResult {
    match op {
        CompareOp::Eq => Ok(values_equal(attr, value)),
        CompareOp::Ne => Ok(!values_equal(attr, value)),
        CompareOp::Lt => compare_values(attr, value).map(|ord| ord.is_lt()),
        CompareOp::Le => compare_values(attr, value).map(|ord| ord.is_le()),
        CompareOp::Gt => compare_values(attr, value).map(|ord| ord.is_gt()),
        CompareOp::Ge => compare_values(attr, value).map(|ord| ord.is_ge()),
    }
}

fn eval_contains(attr: Option<&AttributeValue>, operand: &AttributeValue) -> EvalResult {
    match attr {
        Some(AttributeValue::S(s)) => {
            if let AttributeValue::S(substr) = operand {
                Ok(s.contains(substr))
            } else {
                Ok(false)
            }
        }
        Some(AttributeValue::B(b)) => {
            if let AttributeValue::B(subbytes) = operand {
                Ok(contains_bytes(b, subbytes))
            } else {
                Ok(false)
            }
        }
        Some(AttributeValue::L(l)) => Ok(l.iter().any(|v| values_equal(v, operand))),
        Some(AttributeValue::Ss(set)) => {
            if let AttributeValue::S(s) = operand {
                Ok(set.contains(s))
            } else {
                Ok(false)
            }
        }
        Some(AttributeValue::Ns(set)) => {
            if let AttributeValue::N(n) = operand {
                Ok(set.iter().any(|v| numbers_equal(v, n)))
            } else {
                Ok(false)
            }
        }
        Some(AttributeValue::Bs(set)) => {
            if let AttributeValue::B(b) = operand {
                Ok(set.contains(b))
            } else {
                Ok(false)
            }
        }
        _ => Ok(false),
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

fn matches_type(attr: &AttributeValue, expected: AttrType) -> bool {
    matches!(
        (attr, expected),
        (AttributeValue::S(_), AttrType::String)
            | (AttributeValue::N(_), AttrType::Number)
            | (AttributeValue::B(_), AttrType::Binary)
            | (AttributeValue::Bool(_), AttrType::Boolean)
            | (AttributeValue::Null, AttrType::Null)
            | (AttributeValue::M(_), AttrType::Map)
            | (AttributeValue::L(_), AttrType::List)
            | (AttributeValue::Ss(_), AttrType::StringSet)
            | (AttributeValue::Ns(_), AttrType::NumberSet)
            | (AttributeValue::Bs(_), AttrType::BinarySet)
    )
}

fn get_size(attr: &AttributeValue) -> usize {
    match attr {
        AttributeValue::S(s) => s.len(),
        AttributeValue::N(n) => n.len(),
        AttributeValue::B(b) => b.len(),
        AttributeValue::Bool(_) => 1,
        AttributeValue::Null => 0,
        AttributeValue::M(map) => map.len(),
        AttributeValue::L(list) => list.len(),
        AttributeValue::Ss(set) => set.len(),
        AttributeValue::Ns(set) => set.len(),
        AttributeValue::Bs(set) => set.len(),
    }
}

fn eval_size_compare(size: usize, op: &CompareOp, value: usize) -> bool {
    match op {
        CompareOp::Eq => size == value,
        CompareOp::Ne => size != value,
        CompareOp::Lt => size < value,
        CompareOp::Le => size <= value,
        CompareOp::Gt => size > value,
        CompareOp::Ge => size >= value,
    }
}

fn values_equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a, b) {
        (AttributeValue::S(a), AttributeValue::S(b)) => a == b,
        (AttributeValue::N(a), AttributeValue::N(b)) => numbers_equal(a, b),
        (AttributeValue::B(a), AttributeValue::B(b)) => a == b,
        (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a == b,
        (AttributeValue::Null, AttributeValue::Null) => true,
        (AttributeValue::L(a), AttributeValue::L(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (AttributeValue::M(a), AttributeValue::M(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).map(|bv| values_equal(v, bv)).unwrap_or(false))
        }
        (AttributeValue::Ss(a), AttributeValue::Ss(b)) => a == b,
        (AttributeValue::Ns(a), AttributeValue::Ns(b)) => a == b,
        (AttributeValue::Bs(a), AttributeValue::Bs(b)) => a == b,
        _ => false,
    }
}
