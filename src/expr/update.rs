use crate::error::ParseError;
use crate::update::{Operand, SetValue, UpdateExpression};

use super::lexer::{Token, tokenize};
use super::names::{ExpressionNames, ExpressionValues, is_keyword, parse_path, resolve_value};

const RESERVED: &[&str] = &[
    "set", "remove", "add", "delete", "and", "if_not_exists", "list_append",
];

/// Parses an `UpdateExpression`: `[SET ...] [REMOVE ...] [ADD ...] [DELETE ...]`,
/// each clause appearing at most once, in any order.
pub fn parse_update(
    expr: &str,
    names: &ExpressionNames,
    values: &ExpressionValues,
) -> Result<UpdateExpression, ParseError> {
    let tokens = tokenize(expr)?;
    let mut pos = 0;
    let mut update = UpdateExpression::new();
    let mut seen = Vec::new();

    while pos < tokens.len() {
        let clause = match tokens.get(pos) {
            Some(Token::Ident(w)) if is_keyword(w, "SET") => "SET",
            Some(Token::Ident(w)) if is_keyword(w, "REMOVE") => "REMOVE",
            Some(Token::Ident(w)) if is_keyword(w, "ADD") => "ADD",
            Some(Token::Ident(w)) if is_keyword(w, "DELETE") => "DELETE",
            other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
        };
        if seen.contains(&clause) {
            return Err(ParseError::Other(format!("{clause} clause repeated")));
        }
        seen.push(clause);
        pos += 1;

        update = match clause {
            "SET" => parse_set_clause(&tokens, &mut pos, names, values, update)?,
            "REMOVE" => parse_remove_clause(&tokens, &mut pos, names, update)?,
            "ADD" => parse_add_or_delete_clause(&tokens, &mut pos, names, values, update, true)?,
            "DELETE" => parse_add_or_delete_clause(&tokens, &mut pos, names, values, update, false)?,
            _ => unreachable!(),
        };
    }

    if update.is_empty() {
        return Err(ParseError::Other("update expression has no actions".to_string()));
    }

    update
        .validate_no_cross_clause_overlap()
        .map_err(ParseError::PathOverlap)?;

    Ok(update)
}

fn check_reserved_root(tokens: &[Token], pos: usize) -> Result<(), ParseError> {
    if let Some(Token::Ident(word)) = tokens.get(pos) {
        if RESERVED.contains(&word.to_ascii_lowercase().as_str()) {
            return Err(ParseError::ReservedWord(word.clone()));
        }
    }
    Ok(())
}

fn at_next_clause_or_end(tokens: &[Token], pos: usize) -> bool {
    match tokens.get(pos) {
        None => true,
        Some(Token::Ident(w)) => {
            is_keyword(w, "SET") || is_keyword(w, "REMOVE") || is_keyword(w, "ADD") || is_keyword(w, "DELETE")
        }
        _ => false,
    }
}

fn parse_set_clause(
    tokens: &[Token],
    pos: &mut usize,
    names: &ExpressionNames,
    values: &ExpressionValues,
    mut update: UpdateExpression,
) -> Result<UpdateExpression, ParseError> {
    loop {
        check_reserved_root(tokens, *pos)?;
        let path = parse_path(tokens, pos, names)?;
        match tokens.get(*pos) {
            Some(Token::Eq) => *pos += 1,
            other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
        }
        let value = parse_set_value(tokens, pos, names, values)?;
        update = update.set(path, value);

        match tokens.get(*pos) {
            Some(Token::Comma) => {
                *pos += 1;
            }
            _ if at_next_clause_or_end(tokens, *pos) => break,
            other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
        }
    }
    Ok(update)
}

fn parse_set_value(
    tokens: &[Token],
    pos: &mut usize,
    names: &ExpressionNames,
    values: &ExpressionValues,
) -> Result<SetValue, ParseError> {
    if let Some(Token::Ident(word)) = tokens.get(*pos) {
        let lower = word.to_ascii_lowercase();
        if lower == "if_not_exists" && matches!(tokens.get(*pos + 1), Some(Token::LParen)) {
            *pos += 2;
            let path = parse_path(tokens, pos, names)?;
            expect(tokens, pos, &Token::Comma)?;
            let fallback = parse_operand(tokens, pos, names, values)?;
            expect(tokens, pos, &Token::RParen)?;
            return Ok(SetValue::IfNotExists(path, fallback));
        }
        if lower == "list_append" && matches!(tokens.get(*pos + 1), Some(Token::LParen)) {
            *pos += 2;
            let a = parse_operand(tokens, pos, names, values)?;
            expect(tokens, pos, &Token::Comma)?;
            let b = parse_operand(tokens, pos, names, values)?;
            expect(tokens, pos, &Token::RParen)?;
            return Ok(SetValue::ListAppend(a, b));
        }
    }

    let left = parse_operand(tokens, pos, names, values)?;
    match tokens.get(*pos) {
        Some(Token::Plus) => {
            *pos += 1;
            let right = parse_operand(tokens, pos, names, values)?;
            Ok(SetValue::Add(left, right))
        }
        Some(Token::Minus) => {
            *pos += 1;
            let right = parse_operand(tokens, pos, names, values)?;
            Ok(SetValue::Subtract(left, right))
        }
        _ => Ok(SetValue::Operand(left)),
    }
}

fn parse_operand(
    tokens: &[Token],
    pos: &mut usize,
    names: &ExpressionNames,
    values: &ExpressionValues,
) -> Result<Operand, ParseError> {
    match tokens.get(*pos) {
        Some(Token::ValueAlias(alias)) => {
            *pos += 1;
            Ok(Operand::Value(resolve_value(values, alias)?))
        }
        Some(Token::Ident(word)) if RESERVED.contains(&word.to_ascii_lowercase().as_str()) => {
            Err(ParseError::ReservedWord(word.clone()))
        }
        Some(Token::Ident(_)) | Some(Token::NameAlias(_)) => {
            Ok(Operand::Path(parse_path(tokens, pos, names)?))
        }
        other => Err(ParseError::UnexpectedToken(format!("{other:?}"))),
    }
}

fn parse_remove_clause(
    tokens: &[Token],
    pos: &mut usize,
    names: &ExpressionNames,
    mut update: UpdateExpression,
) -> Result<UpdateExpression, ParseError> {
    loop {
        check_reserved_root(tokens, *pos)?;
        let path = parse_path(tokens, pos, names)?;
        update = update.remove(path);
        match tokens.get(*pos) {
            Some(Token::Comma) => {
                *pos += 1;
            }
            _ if at_next_clause_or_end(tokens, *pos) => break,
            other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
        }
    }
    Ok(update)
}

fn parse_add_or_delete_clause(
    tokens: &[Token],
    pos: &mut usize,
    names: &ExpressionNames,
    values: &ExpressionValues,
    mut update: UpdateExpression,
    is_add: bool,
) -> Result<UpdateExpression, ParseError> {
    loop {
        check_reserved_root(tokens, *pos)?;
        let path = parse_path(tokens, pos, names)?;
        let value = match tokens.get(*pos) {
            Some(Token::ValueAlias(alias)) => {
                *pos += 1;
                resolve_value(values, alias)?
            }
            other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
        };
        update = if is_add {
            update.add(path, value)
        } else {
            update.delete(path, value)
        };
        match tokens.get(*pos) {
            Some(Token::Comma) => {
                *pos += 1;
            }
            _ if at_next_clause_or_end(tokens, *pos) => break,
            other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
        }
    }
    Ok(update)
}

fn expect(tokens: &[Token], pos: &mut usize, tok: &Token) -> Result<(), ParseError> {
    match tokens.get(*pos) {
        Some(t) if t == tok => {
            *pos += 1;
            Ok(())
        }
        other => Err(ParseError::UnexpectedToken(format!("{other:?}"))),
    }
}
