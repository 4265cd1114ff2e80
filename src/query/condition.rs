use crate::types::KeyValue;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKeyOp {
    Eq(KeyValue),
    Lt(KeyValue),
    Le(KeyValue),
    Gt(KeyValue),
    Ge(KeyValue),
    Between { low: KeyValue, high: KeyValue },
    BeginsWith(KeyValue),
}

impl SortKeyOp {
    pub fn eq(value: impl Into<KeyValue>) -> Self {
        Self::Eq(value.into())
    }
    pub fn lt(value: impl Into<KeyValue>) -> Self {
        Self::Lt(value.into())
    }
    pub fn le(value: impl Into<KeyValue>) -> Self {
        Self::Le(value.into())
    }
    pub fn gt(value: impl Into<KeyValue>) -> Self {
        Self::Gt(value.into())
    }
    pub fn ge(value: impl Into<KeyValue>) -> Self {
        Self::Ge(value.into())
    }
    pub fn between(low: impl Into<KeyValue>, high: impl Into<KeyValue>) -> Self {
        Self::Between {
            low: low.into(),
            high: high.into(),
        }
    }
    pub fn begins_with(prefix: impl Into<KeyValue>) -> Self {
        Self::BeginsWith(prefix.into())
    }

    pub fn matches(&self, value: &KeyValue) -> bool {
        match self {
            SortKeyOp::Eq(target) => compare_keys(value, target) == Ordering::Equal,
            SortKeyOp::Lt(target) => compare_keys(value, target) == Ordering::Less,
            SortKeyOp::Le(target) => compare_keys(value, target) != Ordering::Greater,
            SortKeyOp::Gt(target) => compare_keys(value, target) == Ordering::Greater,
            SortKeyOp::Ge(target) => compare_keys(value, target) != Ordering::Less,
            SortKeyOp::Between { low, high } => {
                compare_keys(value, low) != Ordering::Less
                    && compare_keys(value, high) != Ordering::Greater
            }
            SortKeyOp::BeginsWith(prefix) => key_begins_with(value, prefix),
        }
    }
}

fn compare_keys(a: &KeyValue, b: &KeyValue) -> Ordering {
    match (a, b) {
        (KeyValue::S(a), KeyValue::S(b)) => a.cmp(b),
        (KeyValue::N(a), KeyValue::N(b)) => compare_numeric_strings(a, b),
        (KeyValue::B(a), KeyValue::B(b)) => a.cmp(b),
        // compare by type name
        _ => a.type_name().cmp(b.type_name()),
    }
}

fn compare_numeric_strings(a: &str, b: &str) -> Ordering {
    // TODO: arbitrary precision
    let x: f64 = a.parse().unwrap_or(f64::NAN);
    let y: f64 = b.parse().unwrap_or(f64::NAN);
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}

fn key_begins_with(value: &KeyValue, prefix: &KeyValue) -> bool {
    match (value, prefix) {
        (KeyValue::S(v), KeyValue::S(p)) => v.starts_with(p),
        (KeyValue::B(v), KeyValue::B(p)) => v.starts_with(p),
        // no prefix matching for numeric values
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct KeyCondition {
    pub partition_key: KeyValue,
    pub sort_key: Option<SortKeyOp>,
}

impl KeyCondition {
    pub fn pk(pk: impl Into<KeyValue>) -> Self {
        Self {
            partition_key: pk.into(),
            sort_key: None,
        }
    }

    pub fn pk_sk(pk: impl Into<KeyValue>, sk_op: SortKeyOp) -> Self {
        Self {
            partition_key: pk.into(),
            sort_key: Some(sk_op),
        }
    }

    pub fn sk_eq(mut self, value: impl Into<KeyValue>) -> Self {
        self.sort_key = Some(SortKeyOp::eq(value));
        self
    }
    pub fn sk_lt(mut self, value: impl Into<KeyValue>) -> Self {
        self.sort_key = Some(SortKeyOp::lt(value));
        self
    }
    pub fn sk_le(mut self, value: impl Into<KeyValue>) -> Self {
        self.sort_key = Some(SortKeyOp::le(value));
        self
    }
    pub fn sk_gt(mut self, value: impl Into<KeyValue>) -> Self {
        self.sort_key = Some(SortKeyOp::gt(value));
        self
    }
    pub fn sk_ge(mut self, value: impl Into<KeyValue>) -> Self {
        self.sort_key = Some(SortKeyOp::ge(value));
        self
    }
    pub fn sk_between(mut self, low: impl Into<KeyValue>, high: impl Into<KeyValue>) -> Self {
        self.sort_key = Some(SortKeyOp::between(low, high));
        self
    }
    pub fn sk_begins_with(mut self, prefix: impl Into<KeyValue>) -> Self {
        self.sort_key = Some(SortKeyOp::begins_with(prefix));
        self
    }
}
