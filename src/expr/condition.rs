use crate::condition::{AttrType, CompareOp, Condition};
use crate::error::ParseError;
use crate::types::AttributeValue;

use super::lexer::{Token, tokenize};
use super::names::{ExpressionNames, ExpressionValues, is_keyword, parse_path, resolve_value};

const RESERVED: &[&str] = &[
    "and", "or", "not", "between", "in", "set", "remove", "add", "delete",
];

enum Operand {
    Path(crate::condition::AttributePath),
    Value(AttributeValue),
    Size(crate::condition::AttributePath),
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    names: &'a ExpressionNames,
    values: &'a ExpressionValues,
}

/// Parses a full condition/filter expression (the grammar shared by
/// ConditionExpression and FilterExpression).
pub fn parse_condition(
    expr: &str,
    names: &ExpressionNames,
    values: &ExpressionValues,
) -> Result<Condition, ParseError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        names,
        values,
    };
    let cond = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::UnexpectedToken(format!(
            "{:?}",
            parser.tokens[parser.pos]
        )));
    }
    Ok(cond)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, tok: &Token) -> Result<(), ParseError> {
        match self.bump() {
            Some(t) if &t == tok => Ok(()),
            Some(t) => Err(ParseError::UnexpectedToken(format!("{t:?}"))),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn peek_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if is_keyword(w, word))
    }

    fn parse_or(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("OR") {
            self.bump();
            let right = self.parse_and()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_not()?;
        while self.peek_keyword("AND") {
            self.bump();
            let right = self.parse_not()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Condition, ParseError> {
        if self.peek_keyword("NOT") {
            self.bump();
            let inner = self.parse_not()?;
            return Ok(inner.not());
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Condition, ParseError> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.bump();
            if matches!(self.peek(), Some(Token::RParen)) {
                return Err(ParseError::RedundantParens);
            }
            let inner = self.parse_or()?;
            self.expect(&Token::RParen)?;
            if matches!(self.peek(), Some(Token::LParen)) {
                // a bare second group immediately following is never valid here
            }
            return Ok(inner);
        }

        if let Some(Token::Ident(word)) = self.peek().cloned() {
            let lower = word.to_ascii_lowercase();
            if matches!(
                lower.as_str(),
                "attribute_exists" | "attribute_not_exists" | "attribute_type" | "begins_with" | "contains"
            ) && matches!(self.tokens.get(self.pos + 1), Some(Token::LParen))
            {
                return self.parse_function_condition(&lower);
            }
        }

        self.parse_comparison()
    }

    fn parse_function_condition(&mut self, name: &str) -> Result<Condition, ParseError> {
        self.bump(); // function name
        self.expect(&Token::LParen)?;
        match name {
            "attribute_exists" => {
                let path = parse_path(&self.tokens, &mut self.pos, self.names)?;
                self.expect(&Token::RParen)?;
                Ok(Condition::attr_exists(path))
            }
            "attribute_not_exists" => {
                let path = parse_path(&self.tokens, &mut self.pos, self.names)?;
                self.expect(&Token::RParen)?;
                Ok(Condition::attr_not_exists(path))
            }
            "attribute_type" => {
                let path = parse_path(&self.tokens, &mut self.pos, self.names)?;
                self.expect(&Token::Comma)?;
                let operand = self.parse_operand()?;
                self.expect(&Token::RParen)?;
                let type_value = match operand {
                    Operand::Value(v) => v,
                    _ => return Err(ParseError::Other("attribute_type expects a literal type tag".to_string())),
                };
                let tag = type_value
                    .as_s()
                    .ok_or_else(|| ParseError::Other("attribute_type tag must be a string".to_string()))?;
                Ok(Condition::attr_type(path, attr_type_from_tag(tag)?))
            }
            "begins_with" => {
                let path = parse_path(&self.tokens, &mut self.pos, self.names)?;
                self.expect(&Token::Comma)?;
                let operand = self.parse_operand()?;
                self.expect(&Token::RParen)?;
                match operand {
                    Operand::Value(v) => Ok(Condition::begins_with(path, v)),
                    _ => Err(ParseError::Other("begins_with expects a literal operand".to_string())),
                }
            }
            "contains" => {
                let path = parse_path(&self.tokens, &mut self.pos, self.names)?;
                self.expect(&Token::Comma)?;
                let operand = self.parse_operand()?;
                self.expect(&Token::RParen)?;
                match operand {
                    Operand::Value(v) => Ok(Condition::contains(path, v)),
                    _ => Err(ParseError::Other("contains expects a literal operand".to_string())),
                }
            }
            _ => unreachable!(),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        match self.peek().cloned() {
            Some(Token::ValueAlias(alias)) => {
                self.bump();
                Ok(Operand::Value(resolve_value(self.values, &alias)?))
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("size") && matches!(self.tokens.get(self.pos + 1), Some(Token::LParen)) => {
                self.bump();
                self.bump();
                let path = parse_path(&self.tokens, &mut self.pos, self.names)?;
                self.expect(&Token::RParen)?;
                Ok(Operand::Size(path))
            }
            Some(Token::Ident(word)) if RESERVED.contains(&word.to_ascii_lowercase().as_str()) => {
                Err(ParseError::ReservedWord(word))
            }
            Some(Token::Ident(_)) | Some(Token::NameAlias(_)) => {
                let path = parse_path(&self.tokens, &mut self.pos, self.names)?;
                Ok(Operand::Path(path))
            }
            Some(other) => Err(ParseError::UnexpectedToken(format!("{other:?}"))),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_op(&mut self) -> Result<CompareOp, ParseError> {
        match self.bump() {
            Some(Token::Eq) => Ok(CompareOp::Eq),
            Some(Token::Ne) => Ok(CompareOp::Ne),
            Some(Token::Lt) => Ok(CompareOp::Lt),
            Some(Token::Le) => Ok(CompareOp::Le),
            Some(Token::Gt) => Ok(CompareOp::Gt),
            Some(Token::Ge) => Ok(CompareOp::Ge),
            Some(t) => Err(ParseError::UnexpectedToken(format!("{t:?}"))),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_comparison(&mut self) -> Result<Condition, ParseError> {
        let left = self.parse_operand()?;

        if self.peek_keyword("BETWEEN") {
            self.bump();
            let low = self.expect_value_operand()?;
            if !self.peek_keyword("AND") {
                return Err(ParseError::Other("BETWEEN requires AND".to_string()));
            }
            self.bump();
            let high = self.expect_value_operand()?;
            let path = match left {
                Operand::Path(p) => p,
                _ => return Err(ParseError::Other("BETWEEN's left side must be a path".to_string())),
            };
            return Ok(Condition::between(path, low, high));
        }

        if self.peek_keyword("IN") {
            self.bump();
            self.expect(&Token::LParen)?;
            let path = match left {
                Operand::Path(p) => p,
                _ => return Err(ParseError::Other("IN's left side must be a path".to_string())),
            };
            let mut values = Vec::new();
            loop {
                values.push(self.expect_value_operand()?);
                match self.peek() {
                    Some(Token::Comma) => {
                        self.bump();
                    }
                    Some(Token::RParen) => {
                        self.bump();
                        break;
                    }
                    other => return Err(ParseError::UnexpectedToken(format!("{other:?}"))),
                }
            }
            return Ok(Condition::in_values(path, values));
        }

        let op = self.parse_op()?;
        let right = self.parse_operand()?;

        match (left, right) {
            (Operand::Size(path), Operand::Value(v)) => {
                let size = v
                    .as_n()
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| ParseError::Other("size() comparisons require a numeric operand".to_string()))?;
                Ok(Condition::Size { path, op, value: size })
            }
            (Operand::Path(path), Operand::Value(v)) => Ok(Condition::Compare { path, op, value: v }),
            _ => Err(ParseError::Other(
                "comparisons require a path (or size(path)) on the left and a literal value on the right".to_string(),
            )),
        }
    }

    fn expect_value_operand(&mut self) -> Result<AttributeValue, ParseError> {
        match self.parse_operand()? {
            Operand::Value(v) => Ok(v),
            _ => Err(ParseError::Other("expected a literal value".to_string())),
        }
    }
}

fn attr_type_from_tag(tag: &str) -> Result<AttrType, ParseError> {
    Ok(match tag {
        "S" => AttrType::String,
        "N" => AttrType::Number,
        "B" => AttrType::Binary,
        "BOOL" => AttrType::Boolean,
        "NULL" => AttrType::Null,
        "M" => AttrType::Map,
        "L" => AttrType::List,
        "SS" => AttrType::StringSet,
        "NS" => AttrType::NumberSet,
        "BS" => AttrType::BinarySet,
        other => return Err(ParseError::Other(format!("unknown type tag: {other}"))),
    })
}
