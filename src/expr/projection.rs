use std::collections::BTreeMap;

use crate::condition::{AttributePath, PathSegment};
use crate::error::ParseError;
use crate::types::{AttributeValue, Item};

use super::lexer::{Token, tokenize};
use super::names::{ExpressionNames, parse_path};

/// Parses a `ProjectionExpression`: comma-separated attribute paths.
pub fn parse_projection(
    expr: &str,
    names: &ExpressionNames,
) -> Result<Vec<AttributePath>, ParseError> {
    let tokens = tokenize(expr)?;
    let mut pos = 0;
    let mut paths = Vec::new();

    loop {
        let path = parse_path(&tokens, &mut pos, names)?;
        paths.push(path);
        match tokens.get(pos) {
            Some(Token::Comma) => {
                pos += 1;
            }
            None => break,
            other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    Ok(paths)
}

/// Retains only the attributes named by `paths`, preserving nested map/list
/// structure along the way down. A path with no matching value in `item` is
/// silently dropped; a projection that matches nothing yields an empty item.
pub fn apply_projection(item: &Item, paths: &[AttributePath]) -> Item {
    let mut result = Item::new();
    for path in paths {
        let Some(value) = path.resolve(item) else {
            continue;
        };
        splice_in(&mut result, path.segments(), value.clone());
    }
    result
}

fn splice_in(result: &mut Item, segments: &[PathSegment], value: AttributeValue) {
    let PathSegment::Key(root) = &segments[0] else {
        return;
    };
    if segments.len() == 1 {
        result.set(root.clone(), value);
        return;
    }

    let existing = result.remove(root).unwrap_or(AttributeValue::M(BTreeMap::new()));
    let merged = splice_nested(existing, &segments[1..], value);
    result.set(root.clone(), merged);
}

fn splice_nested(existing: AttributeValue, rest: &[PathSegment], value: AttributeValue) -> AttributeValue {
    if rest.is_empty() {
        return value;
    }

    match &rest[0] {
        PathSegment::Key(k) => {
            let mut map = match existing {
                AttributeValue::M(m) => m,
                _ => BTreeMap::new(),
            };
            let child = map.remove(k).unwrap_or(AttributeValue::M(BTreeMap::new()));
            map.insert(k.clone(), splice_nested(child, &rest[1..], value));
            AttributeValue::M(map)
        }
        PathSegment::Index(i) => {
            let mut list = match existing {
                AttributeValue::L(l) => l,
                _ => Vec::new(),
            };
            if list.len() <= *i {
                list.resize(*i + 1, AttributeValue::Null);
            }
            let child = std::mem::replace(&mut list[*i], AttributeValue::Null);
            list[*i] = splice_nested(child, &rest[1..], value);
            AttributeValue::L(list)
        }
    }
}
