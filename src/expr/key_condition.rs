use crate::error::ParseError;
use crate::query::{KeyCondition, SortKeyOp};
use crate::types::{KeySchema, KeyValue};

use super::lexer::{Token, tokenize};
use super::names::{ExpressionNames, ExpressionValues, is_keyword, resolve_name, resolve_value};

const RESERVED: &[&str] = &["and", "or", "between", "begins_with"];

struct Conjunct {
    name: String,
    op: SortKeyOp,
}

/// Parses a `KeyConditionExpression`: one partition-key equality conjunct
/// and an optional sort-key conjunct, joined by `AND` in either order.
/// Parentheses are never meaningful in this grammar and are rejected
/// outright rather than silently accepted.
pub fn parse_key_condition(
    expr: &str,
    names: &ExpressionNames,
    values: &ExpressionValues,
    schema: &KeySchema,
) -> Result<KeyCondition, ParseError> {
    let tokens = tokenize(expr)?;
    if tokens.iter().any(|t| matches!(t, Token::LParen | Token::RParen)) {
        return Err(ParseError::RedundantParens);
    }

    let mut pos = 0;
    let first = parse_conjunct(&tokens, &mut pos, names, values)?;

    let conjuncts = if matches!(tokens.get(pos), Some(Token::Ident(w)) if is_keyword(w, "AND")) {
        pos += 1;
        let second = parse_conjunct(&tokens, &mut pos, names, values)?;
        vec![first, second]
    } else {
        vec![first]
    };

    if pos != tokens.len() {
        return Err(ParseError::UnexpectedToken(format!("{:?}", tokens[pos])));
    }

    build_key_condition(conjuncts, schema)
}

fn parse_conjunct(
    tokens: &[Token],
    pos: &mut usize,
    names: &ExpressionNames,
    values: &ExpressionValues,
) -> Result<Conjunct, ParseError> {
    if let Some(Token::Ident(word)) = tokens.get(*pos) {
        if word.eq_ignore_ascii_case("begins_with") {
            // no LParen ever reaches here (rejected up-front as redundant-parens
            // candidates would be), so begins_with is unreachable in a
            // parenthesis-free grammar and is rejected explicitly instead.
            return Err(ParseError::Other(
                "begins_with() is not permitted on the partition key and requires parentheses unsupported in this grammar".to_string(),
            ));
        }
    }

    let name_token = tokens.get(*pos).ok_or(ParseError::UnexpectedEof)?;
    let name = resolve_name(names, name_token)?;
    if RESERVED.contains(&name.to_ascii_lowercase().as_str()) {
        return Err(ParseError::ReservedWord(name));
    }
    *pos += 1;

    let op = parse_sort_key_op(tokens, pos, values)?;
    Ok(Conjunct { name, op })
}

fn parse_sort_key_op(
    tokens: &[Token],
    pos: &mut usize,
    values: &ExpressionValues,
) -> Result<SortKeyOp, ParseError> {
    match tokens.get(*pos) {
        Some(Token::Eq) => {
            *pos += 1;
            Ok(SortKeyOp::eq(expect_key_value(tokens, pos, values)?))
        }
        Some(Token::Lt) => {
            *pos += 1;
            Ok(SortKeyOp::lt(expect_key_value(tokens, pos, values)?))
        }
        Some(Token::Le) => {
            *pos += 1;
            Ok(SortKeyOp::le(expect_key_value(tokens, pos, values)?))
        }
        Some(Token::Gt) => {
            *pos += 1;
            Ok(SortKeyOp::gt(expect_key_value(tokens, pos, values)?))
        }
        Some(Token::Ge) => {
            *pos += 1;
            Ok(SortKeyOp::ge(expect_key_value(tokens, pos, values)?))
        }
        Some(Token::Ident(word)) if is_keyword(word, "BETWEEN") => {
            *pos += 1;
            let low = expect_key_value(tokens, pos, values)?;
            match tokens.get(*pos) {
                Some(Token::Ident(w)) if is_keyword(w, "AND") => *pos += 1,
                other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
            }
            let high = expect_key_value(tokens, pos, values)?;
            Ok(SortKeyOp::between(low, high))
        }
        other => Err(ParseError::UnexpectedToken(format!("{other:?}"))),
    }
}

fn expect_key_value(
    tokens: &[Token],
    pos: &mut usize,
    values: &ExpressionValues,
) -> Result<KeyValue, ParseError> {
    match tokens.get(*pos) {
        Some(Token::ValueAlias(alias)) => {
            *pos += 1;
            let value = resolve_value(values, alias)?;
            KeyValue::from_attribute_value(&value)
                .ok_or_else(|| ParseError::Other(format!("{alias} is not a valid key value type")))
        }
        other => Err(ParseError::UnexpectedToken(format!("{other:?}"))),
    }
}

fn build_key_condition(
    mut conjuncts: Vec<Conjunct>,
    schema: &KeySchema,
) -> Result<KeyCondition, ParseError> {
    let pk_name = schema.pk_name().to_string();
    let sk_name = schema.sk_name().map(str::to_string);

    for c in &conjuncts {
        if c.name != pk_name && Some(c.name.as_str()) != sk_name.as_deref() {
            return Err(ParseError::Other(format!(
                "{} is not a key attribute of this table",
                c.name
            )));
        }
    }

    if conjuncts.len() > 2 {
        return Err(ParseError::Other(
            "key condition expressions support at most two conjuncts".to_string(),
        ));
    }

    let pk_idx = conjuncts
        .iter()
        .position(|c| c.name == pk_name)
        .ok_or_else(|| ParseError::Other("key condition must reference the partition key".to_string()))?;
    let pk_conjunct = conjuncts.remove(pk_idx);
    let SortKeyOp::Eq(pk_value) = pk_conjunct.op else {
        return Err(ParseError::Other(
            "the partition key conjunct must use =".to_string(),
        ));
    };

    let mut cond = KeyCondition::pk(pk_value);
    if let Some(sk_conjunct) = conjuncts.into_iter().next() {
        cond.sort_key = Some(sk_conjunct.op);
    }
    Ok(cond)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyType;
    use std::collections::HashMap;

    fn schema() -> KeySchema {
        KeySchema::composite("user_id", KeyType::S, "order_id", KeyType::S)
    }

    fn values(pairs: &[(&str, KeyValue)]) -> ExpressionValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone().to_attribute_value()))
            .collect()
    }

    #[test]
    fn pk_only() {
        let names = HashMap::new();
        let vals = values(&[("pk", KeyValue::S("u1".into()))]);
        let cond = parse_key_condition("user_id = :pk", &names, &vals, &schema()).unwrap();
        assert_eq!(cond.partition_key, KeyValue::S("u1".into()));
        assert!(cond.sort_key.is_none());
    }

    #[test]
    fn pk_and_sk_order_independent() {
        let names = HashMap::new();
        let vals = values(&[
            ("pk", KeyValue::S("u1".into())),
            ("sk", KeyValue::S("o1".into())),
        ]);
        let a = parse_key_condition("user_id = :pk AND order_id = :sk", &names, &vals, &schema()).unwrap();
        let b = parse_key_condition("order_id = :sk AND user_id = :pk", &names, &vals, &schema()).unwrap();
        assert_eq!(a.partition_key, b.partition_key);
        assert!(matches!(a.sort_key, Some(SortKeyOp::Eq(_))));
        assert!(matches!(b.sort_key, Some(SortKeyOp::Eq(_))));
    }

    #[test]
    fn sk_between() {
        let names = HashMap::new();
        let vals = values(&[
            ("pk", KeyValue::S("u1".into())),
            ("lo", KeyValue::S("a".into())),
            ("hi", KeyValue::S("z".into())),
        ]);
        let cond = parse_key_condition(
            "user_id = :pk AND order_id BETWEEN :lo AND :hi",
            &names,
            &vals,
            &schema(),
        )
        .unwrap();
        assert!(matches!(cond.sort_key, Some(SortKeyOp::Between { .. })));
    }

    #[test]
    fn missing_pk_conjunct_rejected() {
        let names = HashMap::new();
        let vals = values(&[("sk", KeyValue::S("o1".into()))]);
        assert!(parse_key_condition("order_id = :sk", &names, &vals, &schema()).is_err());
    }

    #[test]
    fn non_eq_on_pk_rejected() {
        let names = HashMap::new();
        let vals = values(&[("pk", KeyValue::S("u1".into()))]);
        assert!(parse_key_condition("user_id > :pk", &names, &vals, &schema()).is_err());
    }

    #[test]
    fn non_key_attribute_rejected() {
        let names = HashMap::new();
        let vals = values(&[("v", KeyValue::S("x".into()))]);
        assert!(parse_key_condition("status = :v", &names, &vals, &schema()).is_err());
    }

    #[test]
    fn parens_rejected() {
        let names = HashMap::new();
        let vals = values(&[("pk", KeyValue::S("u1".into()))]);
        assert!(parse_key_condition("(user_id = :pk)", &names, &vals, &schema()).is_err());
    }
}
