use std::collections::HashMap;

use crate::condition::AttributePath;
use crate::error::ParseError;
use crate::types::AttributeValue;

use super::lexer::Token;

/// `ExpressionAttributeNames` — maps `#alias` tokens to real attribute names,
/// letting callers reference reserved words or names containing characters
/// the grammar doesn't allow unescaped (e.g. a literal `status` column when
/// `status` collides with a future reserved word).
pub type ExpressionNames = HashMap<String, String>;

/// `ExpressionAttributeValues` — maps `:alias` tokens to literal values.
pub type ExpressionValues = HashMap<String, AttributeValue>;

pub(super) fn resolve_value(values: &ExpressionValues, alias: &str) -> Result<AttributeValue, ParseError> {
    values
        .get(alias)
        .cloned()
        .ok_or_else(|| ParseError::UnresolvedAlias(format!(":{alias}")))
}

/// One path segment's name token: either a bare identifier or a `#alias`
/// resolved through `names`.
pub(super) fn resolve_name(names: &ExpressionNames, token: &Token) -> Result<String, ParseError> {
    match token {
        Token::Ident(word) => Ok(word.clone()),
        Token::NameAlias(alias) => names
            .get(alias)
            .cloned()
            .ok_or_else(|| ParseError::UnresolvedAlias(format!("#{alias}"))),
        other => Err(ParseError::UnexpectedToken(format!("{other:?}"))),
    }
}

/// Parses a dotted/bracketed path starting at `tokens[*pos]`, advancing
/// `*pos` past it. `Name ('.' Name | '[' Int ']')*`.
pub(super) fn parse_path(
    tokens: &[Token],
    pos: &mut usize,
    names: &ExpressionNames,
) -> Result<AttributePath, ParseError> {
    let first = tokens.get(*pos).ok_or(ParseError::UnexpectedEof)?;
    let root = resolve_name(names, first)?;
    *pos += 1;
    let mut path = AttributePath::new(root);

    loop {
        match tokens.get(*pos) {
            Some(Token::Dot) => {
                *pos += 1;
                let next = tokens.get(*pos).ok_or(ParseError::UnexpectedEof)?;
                let name = resolve_name(names, next)?;
                *pos += 1;
                path = path.key(name);
            }
            Some(Token::LBracket) => {
                *pos += 1;
                match tokens.get(*pos) {
                    Some(Token::Int(n)) if *n >= 0 => {
                        *pos += 1;
                        path = path.index(*n as usize);
                    }
                    other => {
                        return Err(ParseError::UnexpectedToken(format!("{other:?}")));
                    }
                }
                match tokens.get(*pos) {
                    Some(Token::RBracket) => *pos += 1,
                    other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
                }
            }
            _ => break,
        }
    }

    Ok(path)
}

pub(super) fn is_keyword(word: &str, expected: &str) -> bool {
    word.eq_ignore_ascii_case(expected)
}
