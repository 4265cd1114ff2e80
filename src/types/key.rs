use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AttributeValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyValue {
    S(String),
    N(String),
    B(Vec<u8>),
}

impl KeyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            KeyValue::S(_) => "S",
            KeyValue::N(_) => "N",
            KeyValue::B(_) => "B",
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            KeyValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            KeyValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_b(&self) -> Option<&[u8]> {
        match self {
            KeyValue::B(b) => Some(b),
            _ => None,
        }
    }

    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Self::S(s) => AttributeValue::S(s.clone()),
            Self::N(n) => AttributeValue::N(n.clone()),
            Self::B(b) => AttributeValue::B(b.clone()),
        }
    }

    pub fn from_attribute_value(av: &AttributeValue) -> Option<Self> {
        match av {
            AttributeValue::S(s) => Some(Self::S(s.clone())),
            AttributeValue::N(n) => Some(Self::N(n.clone())),
            AttributeValue::B(b) => Some(Self::B(b.clone())),
            _ => None,
        }
    }

    pub fn from_attribute_with_type(attr: &AttributeValue, expected: KeyType) -> Option<Self> {
        match (attr, expected) {
            (AttributeValue::S(s), KeyType::S) => Some(Self::S(s.clone())),
            (AttributeValue::N(n), KeyType::N) => Some(Self::N(n.clone())),
            (AttributeValue::B(b), KeyType::B) => Some(Self::B(b.clone())),
            _ => None,
        }
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}
impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_string())
    }
}
impl From<Vec<u8>> for KeyValue {
    fn from(b: Vec<u8>) -> Self {
        Self::B(b)
    }
}
impl From<&[u8]> for KeyValue {
    fn from(b: &[u8]) -> Self {
        Self::B(b.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub pk: KeyValue,
    pub sk: Option<KeyValue>,
}

impl PrimaryKey {
    pub fn simple(pk: impl Into<KeyValue>) -> Self {
        Self {
            pk: pk.into(),
            sk: None,
        }
    }

    pub fn composite(pk: impl Into<KeyValue>, sk: impl Into<KeyValue>) -> Self {
        Self {
            pk: pk.into(),
            sk: Some(sk.into()),
        }
    }

    pub fn has_sort_key(&self) -> bool {
        self.sk.is_some()
    }

    /// Order-preserving byte encoding of this primary key, suitable as the
    /// key of a [`BTreeMap`](std::collections::BTreeMap)-backed partition
    /// store: for a fixed partition, ascending byte order of this encoding
    /// equals ascending semantic order of the sort key.
    pub fn to_storage_key(&self) -> Vec<u8> {
        encode_key(&self.pk, self.sk.as_ref())
    }

    /// Byte encoding of just the partition segment, used to compute the
    /// partition-restricted scan range (every key sharing this prefix
    /// belongs to the same partition).
    pub fn partition_prefix(&self) -> Vec<u8> {
        encode_partition_segment(&self.pk)
    }
}

/// Reserved delimiter separating the partition segment from the sort
/// segment. The partition segment is length-prefixed so this byte can never
/// be mistaken for part of it.
const DELIMITER: u8 = 0x00;

fn encode_partition_segment(pk: &KeyValue) -> Vec<u8> {
    let tag: u8 = match pk {
        KeyValue::S(_) => b'S',
        KeyValue::N(_) => b'N',
        KeyValue::B(_) => b'B',
    };
    let raw: Vec<u8> = match pk {
        KeyValue::S(s) => s.as_bytes().to_vec(),
        KeyValue::N(n) => n.as_bytes().to_vec(),
        KeyValue::B(b) => b.clone(),
    };
    let len = (raw.len() as u32).to_be_bytes();
    let mut out = Vec::with_capacity(1 + 4 + raw.len());
    out.push(tag);
    out.extend_from_slice(&len);
    out.extend_from_slice(&raw);
    out
}

/// Encodes a sort-key (or partition-only) value such that lexicographic
/// byte order matches semantic order. `S`/`B` sort raw since byte/UTF-8
/// ordering already matches; `N` uses a sign-bit + normalized-exponent +
/// mantissa scheme so that `-100 < -10 < 0 < 10 < 100` holds byte-for-byte.
fn encode_sort_segment(key: &KeyValue) -> Vec<u8> {
    match key {
        KeyValue::S(s) => s.as_bytes().to_vec(),
        KeyValue::B(b) => b.clone(),
        KeyValue::N(n) => encode_sortable_number(n).unwrap_or_default(),
    }
}

/// Encodes a canonical decimal string into a byte sequence that sorts
/// correctly alongside any other encoded number, regardless of magnitude or
/// sign. Layout: 1 sign byte (`0x00` negative, `0x01` zero, `0x02`
/// positive), 4-byte big-endian biased exponent, then the mantissa digits
/// (ASCII, zero-padded to a fixed width) — negative numbers have every
/// mantissa/exponent byte bitwise-complemented so that larger magnitudes
/// sort *before* smaller ones, which inverts correctly relative to the
/// negative sign ordering before zero.
fn encode_sortable_number(text: &str) -> Option<Vec<u8>> {
    let value = Decimal::from_str(text).ok()?;
    if value.is_zero() {
        return Some(vec![0x01]);
    }

    let negative = value.is_sign_negative();
    let magnitude = value.abs();

    // Normalize the decimal's string representation into `digits` (no dot,
    // no leading zeros) and `exponent` (power of ten the last digit
    // represents) using only the plain `Display` form, which is stable
    // across `rust_decimal` versions.
    let plain = magnitude.normalize().to_string();
    let (digits, exponent) = split_decimal(&plain);

    const EXPONENT_BIAS: i64 = 1 << 20;
    const MANTISSA_WIDTH: usize = 40;

    let biased = (exponent as i64 + EXPONENT_BIAS) as u64;
    let mut exponent_bytes = biased.to_be_bytes()[3..].to_vec(); // 5 bytes, plenty of range

    let mut mantissa_bytes = digits.into_bytes();
    mantissa_bytes.resize(MANTISSA_WIDTH, b'0');

    let sign_byte: u8 = if negative { 0x00 } else { 0x02 };
    let mut out = Vec::with_capacity(1 + exponent_bytes.len() + mantissa_bytes.len());
    out.push(sign_byte);
    out.append(&mut exponent_bytes);
    out.append(&mut mantissa_bytes);

    if negative {
        // Larger magnitude must sort *before* smaller magnitude once both
        // are negative, so invert every byte after the sign.
        for b in out.iter_mut().skip(1) {
            *b = !*b;
        }
    }

    Some(out)
}

/// Splits a normalized, non-negative decimal's plain-string form (e.g.
/// `"123.45"`, `"1000"`, `"0.0003"`) into scientific-notation form: a
/// significant digit string `d` with no leading zeros (read as a fraction
/// `0.d`) and an exponent `e` such that `value == 0.d * 10^e`. Unlike a
/// plain digit dump, this exponent reflects the value's true order of
/// magnitude, so comparing `(exponent, digits)` lexicographically orders
/// same-sign magnitudes correctly regardless of how many digits either
/// operand was written with.
fn split_decimal(plain: &str) -> (String, i32) {
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, f),
        None => (plain, ""),
    };

    let mut digits = String::with_capacity(int_part.len() + frac_part.len());
    digits.push_str(int_part);
    digits.push_str(frac_part);

    let trimmed = digits.trim_start_matches('0');
    let digits = if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    };

    let exponent = digits.len() as i32 - frac_part.len() as i32;

    (digits, exponent)
}

/// Encodes a complete primary key (`pk`, optional `sk`) to an
/// order-preserving byte string: an encoded, length-prefixed partition
/// segment, a reserved delimiter, then the encoded sort segment (empty when
/// there is no sort key).
pub fn encode_key(pk: &KeyValue, sk: Option<&KeyValue>) -> Vec<u8> {
    let mut out = encode_partition_segment(pk);
    out.push(DELIMITER);
    if let Some(sk) = sk {
        out.extend_from_slice(&encode_sort_segment(sk));
    }
    out
}

/// Inverse of [`encode_key`]. Requires `sk_type` so that a raw `N`
/// byte-encoding can be told apart from a raw `S`/`B` one, since the
/// encoded form carries no internal type tag for the sort segment (the key
/// schema the decoder is called with always supplies it).
pub fn decode_key(bytes: &[u8], sk_type: Option<KeyType>) -> Option<(KeyValue, Option<KeyValue>)> {
    if bytes.len() < 5 {
        return None;
    }
    let tag = bytes[0];
    let len = u32::from_be_bytes(bytes[1..5].try_into().ok()?) as usize;
    let raw_start = 5;
    let raw_end = raw_start.checked_add(len)?;
    let raw = bytes.get(raw_start..raw_end)?;

    let pk = match tag {
        b'S' => KeyValue::S(String::from_utf8(raw.to_vec()).ok()?),
        b'N' => KeyValue::N(String::from_utf8(raw.to_vec()).ok()?),
        b'B' => KeyValue::B(raw.to_vec()),
        _ => return None,
    };

    let delimiter_idx = raw_end;
    if bytes.get(delimiter_idx).copied()? != DELIMITER {
        return None;
    }
    let sk_bytes = &bytes[delimiter_idx + 1..];

    let sk = match sk_type {
        None => None,
        Some(KeyType::S) => Some(KeyValue::S(String::from_utf8(sk_bytes.to_vec()).ok()?)),
        Some(KeyType::B) => Some(KeyValue::B(sk_bytes.to_vec())),
        Some(KeyType::N) => Some(KeyValue::N(decode_sortable_number(sk_bytes)?)),
    };

    Some((pk, sk))
}

fn decode_sortable_number(bytes: &[u8]) -> Option<String> {
    if bytes.len() == 1 && bytes[0] == 0x01 {
        return Some("0".to_string());
    }
    if bytes.is_empty() {
        return None;
    }

    let negative = bytes[0] == 0x00;
    let mut body = bytes[1..].to_vec();
    if negative {
        for b in body.iter_mut() {
            *b = !*b;
        }
    }

    const EXPONENT_BIAS: i64 = 1 << 20;
    if body.len() < 5 {
        return None;
    }
    let mut exp_bytes = [0u8; 8];
    exp_bytes[3..8].copy_from_slice(&body[0..5]);
    let biased = u64::from_be_bytes(exp_bytes);
    let exponent = biased as i64 - EXPONENT_BIAS;

    let mantissa_bytes = &body[5..];
    let mantissa = String::from_utf8(mantissa_bytes.to_vec()).ok()?;
    // Trailing zeros are insignificant in the fraction `0.digits` the
    // mantissa represents, so trimming them back off is always safe.
    let digits = mantissa.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    // `value == int(digits) * 10^pow` where `pow = exponent - digits.len()`,
    // since `0.digits * 10^exponent == int(digits) * 10^(exponent - len)`.
    let pow = exponent as i64 - digits.len() as i64;

    let value = if pow >= 0 {
        format!("{}{}", digits, "0".repeat(pow as usize))
    } else {
        let point = pow.unsigned_abs() as usize;
        if point >= digits.len() {
            format!("0.{}{}", "0".repeat(point - digits.len()), digits)
        } else {
            let split = digits.len() - point;
            format!("{}.{}", &digits[..split], &digits[split..])
        }
    };

    let sign = if negative { "-" } else { "" };
    Some(format!("{sign}{value}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    S,
    N,
    B,
}

#[derive(Debug, Clone)]
pub struct KeyAttribute {
    pub name: String,
    pub key_type: KeyType,
}

#[derive(Debug, Clone)]
pub struct KeySchema {
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::S)
    }
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::N)
    }
    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::B)
    }
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::S => "S",
            KeyType::N => "N",
            KeyType::B => "B",
        }
    }

    pub fn matches(&self, value: &KeyValue) -> bool {
        matches!(
            (self, value),
            (KeyType::S, KeyValue::S(_))
                | (KeyType::N, KeyValue::N(_))
                | (KeyType::B, KeyValue::B(_))
        )
    }

    pub fn matches_attribute(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (KeyType::S, AttributeValue::S(_))
                | (KeyType::N, AttributeValue::N(_))
                | (KeyType::B, AttributeValue::B(_))
        )
    }
}

impl KeySchema {
    pub fn simple(pk_name: impl Into<String>, pk_type: KeyType) -> Self {
        Self {
            partition_key: KeyAttribute::new(pk_name, pk_type),
            sort_key: None,
        }
    }
    pub fn composite(
        pk_name: impl Into<String>,
        pk_type: KeyType,
        sk_name: impl Into<String>,
        sk_type: KeyType,
    ) -> Self {
        Self {
            partition_key: KeyAttribute::new(pk_name, pk_type),
            sort_key: Some(KeyAttribute::new(sk_name, sk_type)),
        }
    }

    pub fn has_sort_key(&self) -> bool {
        self.sort_key.is_some()
    }
    pub fn pk_name(&self) -> &str {
        &self.partition_key.name
    }
    pub fn sk_name(&self) -> Option<&str> {
        self.sort_key.as_ref().map(|sk| sk.name.as_str())
    }
    pub fn sk_type(&self) -> Option<KeyType> {
        self.sort_key.as_ref().map(|sk| sk.key_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_type_maching() {
        assert!(KeyType::S.matches(&KeyValue::S("hello".into())));
        assert!(!KeyType::S.matches(&KeyValue::N("123".into())));
        assert!(KeyType::N.matches(&KeyValue::N("123".into())));
        assert!(KeyType::B.matches(&KeyValue::B(vec![1, 2, 3].into())));
    }

    #[test]
    fn key_value_from_attribute() {
        assert_eq!(
            KeyValue::from_attribute_value(&AttributeValue::S("foo".into())),
            Some(KeyValue::S("foo".into()))
        );
        assert_eq!(
            KeyValue::from_attribute_value(&AttributeValue::N("123".into())),
            Some(KeyValue::N("123".into()))
        );

        assert_eq!(KeyValue::from_attribute_value(&AttributeValue::Null), None);
        assert_eq!(
            KeyValue::from_attribute_value(&AttributeValue::Bool(true)),
            None
        );
        assert_eq!(
            KeyValue::from_attribute_value(&AttributeValue::L(vec![])),
            None
        );
    }

    mod storage_key {
        use super::*;

        #[test]
        fn shares_partition_prefix() {
            let a = PrimaryKey::composite("user123", "order1");
            let b = PrimaryKey::composite("user123", "order2");
            assert_eq!(a.partition_prefix(), b.partition_prefix());
        }

        #[test]
        fn different_partitions_differ() {
            let a = PrimaryKey::simple("user123");
            let b = PrimaryKey::simple("user456");
            assert_ne!(a.partition_prefix(), b.partition_prefix());
        }

        #[test]
        fn binary_roundtrips() {
            let pk = PrimaryKey::simple(KeyValue::B(vec![0x00, 0x01, 0x02]));
            let encoded = pk.to_storage_key();
            let (decoded_pk, decoded_sk) = decode_key(&encoded, None).unwrap();
            assert_eq!(decoded_pk, KeyValue::B(vec![0x00, 0x01, 0x02]));
            assert!(decoded_sk.is_none());
        }

        #[test]
        fn string_sort_key_roundtrips() {
            let pk = PrimaryKey::composite("user123", "order456");
            let encoded = pk.to_storage_key();
            let (decoded_pk, decoded_sk) = decode_key(&encoded, Some(KeyType::S)).unwrap();
            assert_eq!(decoded_pk, KeyValue::S("user123".into()));
            assert_eq!(decoded_sk, Some(KeyValue::S("order456".into())));
        }
    }

    mod numeric_ordering {
        use super::*;

        fn encoded(n: &str) -> Vec<u8> {
            encode_sort_segment(&KeyValue::N(n.to_string()))
        }

        #[test]
        fn negatives_sort_before_positives() {
            let values = ["-100", "-10", "-1", "0", "1", "10", "100", "1000"];
            let mut encoded_pairs: Vec<(Vec<u8>, &str)> =
                values.iter().map(|v| (encoded(v), *v)).collect();
            let expected = encoded_pairs.clone();
            encoded_pairs.sort_by(|a, b| a.0.cmp(&b.0));
            assert_eq!(
                encoded_pairs.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
                expected.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            );
        }

        #[test]
        fn decimals_order_correctly() {
            assert!(encoded("1.5") < encoded("2.5"));
            assert!(encoded("-2.5") < encoded("-1.5"));
            assert!(encoded("0.001") < encoded("0.01"));
        }

        #[test]
        fn roundtrips_through_decode() {
            for n in ["-100", "-1.5", "0", "3.14159", "1000000"] {
                let bytes = encoded(n);
                let decoded = decode_sortable_number(&bytes).unwrap();
                assert_eq!(
                    Decimal::from_str(&decoded).unwrap(),
                    Decimal::from_str(n).unwrap()
                );
            }
        }
    }
}
