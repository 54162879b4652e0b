// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition expression language for step gates.
//!
//! Grammar (precedence low to high):
//!
//! ```text
//! expr  := and ( "||" and )*
//! and   := cmp ( "&&" cmp )*
//! cmp   := "(" expr ")" | operand ("==" | "!=") operand
//! operand := path | string | integer
//! path  := ident ("." ident)*
//! ```
//!
//! Paths resolve against `step.<id>.result`, `step.<id>.duration_ms`,
//! `step.<id>.assignee`, and `trigger.context[...]`. Unresolvable paths
//! evaluate to null: `null == x` is false, `null != x` is true.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from parsing or evaluating a condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("unexpected character '{0}' in condition")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected end of condition")]
    UnexpectedEnd,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("expected '==' or '!=' after operand")]
    ExpectedComparison,

    #[error("unmatched '('")]
    UnmatchedParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(i64),
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    LParen,
    RParen,
}

/// A comparison operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Dotted reference like `step.build.result`.
    Path(Vec<String>),
    Str(String),
    Num(i64),
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Cmp {
        lhs: Operand,
        op: CmpOp,
        rhs: Operand,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// All dotted paths referenced by this expression.
    ///
    /// The parser uses this to check that `step.<id>` references name known
    /// steps.
    pub fn paths(&self) -> Vec<&[String]> {
        fn walk<'a>(expr: &'a Expr, out: &mut Vec<&'a [String]>) {
            match expr {
                Expr::Cmp { lhs, rhs, .. } => {
                    for operand in [lhs, rhs] {
                        if let Operand::Path(path) = operand {
                            out.push(path);
                        }
                    }
                }
                Expr::And(a, b) | Expr::Or(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::EqEq),
                    _ => return Err(ConditionError::UnexpectedChar('=')),
                }
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::NotEq),
                    _ => return Err(ConditionError::UnexpectedChar('!')),
                }
            }
            '&' => {
                chars.next();
                match chars.next() {
                    Some('&') => tokens.push(Token::AndAnd),
                    _ => return Err(ConditionError::UnexpectedChar('&')),
                }
            }
            '|' => {
                chars.next();
                match chars.next() {
                    Some('|') => tokens.push(Token::OrOr),
                    _ => return Err(ConditionError::UnexpectedChar('|')),
                }
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => value.push(ch),
                        None => return Err(ConditionError::UnterminatedString),
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() {
                        num.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = num
                    .parse::<i64>()
                    .map_err(|_| ConditionError::UnexpectedToken(num.clone()))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(ConditionError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::OrOr)) {
            self.next();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_cmp()?;
        while matches!(self.peek(), Some(Token::AndAnd)) {
            self.next();
            let rhs = self.parse_cmp()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, ConditionError> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.next();
            let inner = self.parse_expr()?;
            match self.next() {
                Some(Token::RParen) => return Ok(inner),
                _ => return Err(ConditionError::UnmatchedParen),
            }
        }

        let lhs = self.parse_operand()?;
        let op = match self.next() {
            Some(Token::EqEq) => CmpOp::Eq,
            Some(Token::NotEq) => CmpOp::Ne,
            Some(token) => return Err(ConditionError::UnexpectedToken(format!("{:?}", token))),
            None => return Err(ConditionError::ExpectedComparison),
        };
        let rhs = self.parse_operand()?;
        Ok(Expr::Cmp { lhs, op, rhs })
    }

    fn parse_operand(&mut self) -> Result<Operand, ConditionError> {
        match self.next() {
            Some(Token::Ident(ident)) => Ok(Operand::Path(
                ident.split('.').map(|s| s.to_string()).collect(),
            )),
            Some(Token::Str(s)) => Ok(Operand::Str(s)),
            Some(Token::Num(n)) => Ok(Operand::Num(n)),
            Some(token) => Err(ConditionError::UnexpectedToken(format!("{:?}", token))),
            None => Err(ConditionError::UnexpectedEnd),
        }
    }
}

/// Parse a condition expression.
pub fn parse(input: &str) -> Result<Expr, ConditionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ConditionError::UnexpectedEnd);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if let Some(extra) = parser.peek() {
        return Err(ConditionError::UnexpectedToken(format!("{:?}", extra)));
    }
    Ok(expr)
}

/// Facts about a completed step, visible to downstream conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepFacts {
    pub result: Option<String>,
    pub duration_ms: Option<u64>,
    pub assignee: Option<String>,
}

/// Evaluation context: step facts by id plus the trigger context.
#[derive(Debug)]
pub struct EvalContext<'a> {
    pub steps: &'a HashMap<String, StepFacts>,
    pub trigger_context: &'a Value,
}

#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Str(String),
    Num(i64),
    Null,
}

fn resolve(operand: &Operand, ctx: &EvalContext<'_>) -> Resolved {
    match operand {
        Operand::Str(s) => Resolved::Str(s.clone()),
        Operand::Num(n) => Resolved::Num(*n),
        Operand::Path(path) => resolve_path(path, ctx),
    }
}

fn resolve_path(path: &[String], ctx: &EvalContext<'_>) -> Resolved {
    match path.first().map(String::as_str) {
        Some("step") => {
            let (Some(step_id), Some(field)) = (path.get(1), path.get(2)) else {
                return Resolved::Null;
            };
            let Some(facts) = ctx.steps.get(step_id.as_str()) else {
                return Resolved::Null;
            };
            match field.as_str() {
                "result" => facts
                    .result
                    .clone()
                    .map(Resolved::Str)
                    .unwrap_or(Resolved::Null),
                "duration_ms" => facts
                    .duration_ms
                    .map(|ms| Resolved::Num(ms as i64))
                    .unwrap_or(Resolved::Null),
                "assignee" => facts
                    .assignee
                    .clone()
                    .map(Resolved::Str)
                    .unwrap_or(Resolved::Null),
                _ => Resolved::Null,
            }
        }
        Some("trigger") if path.get(1).map(String::as_str) == Some("context") => {
            let mut value = ctx.trigger_context;
            for key in &path[2..] {
                match value.get(key.as_str()) {
                    Some(v) => value = v,
                    None => return Resolved::Null,
                }
            }
            json_to_resolved(value)
        }
        _ => Resolved::Null,
    }
}

fn json_to_resolved(value: &Value) -> Resolved {
    match value {
        Value::String(s) => Resolved::Str(s.clone()),
        Value::Number(n) => n.as_i64().map(Resolved::Num).unwrap_or(Resolved::Null),
        Value::Bool(b) => Resolved::Str(b.to_string()),
        _ => Resolved::Null,
    }
}

/// Evaluate a parsed expression against a context.
pub fn eval(expr: &Expr, ctx: &EvalContext<'_>) -> bool {
    match expr {
        Expr::And(a, b) => eval(a, ctx) && eval(b, ctx),
        Expr::Or(a, b) => eval(a, ctx) || eval(b, ctx),
        Expr::Cmp { lhs, op, rhs } => {
            let left = resolve(lhs, ctx);
            let right = resolve(rhs, ctx);
            let equal = match (&left, &right) {
                (Resolved::Null, _) | (_, Resolved::Null) => false,
                (a, b) => a == b,
            };
            match op {
                CmpOp::Eq => equal,
                // null != x holds: an unresolved fact is not any value
                CmpOp::Ne => match (&left, &right) {
                    (Resolved::Null, _) | (_, Resolved::Null) => true,
                    (a, b) => a != b,
                },
            }
        }
    }
}

/// Parse and evaluate in one call.
pub fn check(input: &str, ctx: &EvalContext<'_>) -> Result<bool, ConditionError> {
    let expr = parse(input)?;
    Ok(eval(&expr, ctx))
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
