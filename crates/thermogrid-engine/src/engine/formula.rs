//! Formula compilation and evaluation.
//!
//! Computed columns are described by a small arithmetic language:
//!
//! - field references: `{quantity}`, `{Reading 1}`, or a bare key like `price`
//! - numeric literals: `10`, `2.5`, `.5`, `1e3`
//! - operators: `+ - * /`, unary minus, parentheses
//! - functions: `ABS(x)`, `MIN(a, ...)`, `MAX(a, ...)`, `ROUND(x[, digits])`
//!
//! Formulas are compiled once when the column is defined. Anything outside the
//! grammar is rejected at that point with a position, so evaluation itself can
//! only fail on arithmetic (division by zero, overflow to infinity).

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{DerivationError, EngineError, Result};
use crate::value::Record;

use super::deps::extract_dependencies;

/// Deepest nesting of parentheses, unary signs and calls accepted.
const MAX_DEPTH: usize = 256;
/// Longest formula accepted, in tokens. Bounds the depth of operator chains.
const MAX_TOKENS: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Abs,
    Min,
    Max,
    Round,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ABS" => Some(Function::Abs),
            "MIN" => Some(Function::Min),
            "MAX" => Some(Function::Max),
            "ROUND" => Some(Function::Round),
            _ => None,
        }
    }

    fn arity_ok(self, n: usize) -> bool {
        match self {
            Function::Abs => n == 1,
            Function::Min | Function::Max => n >= 1,
            Function::Round => n == 1 || n == 2,
        }
    }
}

/// Parsed formula expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Field(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

/// A compiled formula, ready to evaluate against records.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
    references: Vec<String>,
}

impl Formula {
    /// Compile formula text. An optional leading `=` is accepted.
    pub fn compile(source: &str) -> Result<Formula> {
        let trimmed = source.trim();
        let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
        let tokens = tokenize(body).map_err(|e| e.into_engine_error(trimmed))?;
        if let Some((at, _)) = tokens.get(MAX_TOKENS) {
            return Err(SyntaxError::new(*at, "formula too long").into_engine_error(trimmed));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse().map_err(|e| e.into_engine_error(trimmed))?;
        let references = extract_dependencies(&expr);

        Ok(Formula {
            source: body.trim().to_string(),
            expr,
            references,
        })
    }

    /// Source text as entered (without a leading `=`).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Distinct field keys referenced by this formula, in order of first use.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Evaluate against a record. Missing or non-numeric fields read as zero.
    pub fn evaluate(&self, record: &Record) -> std::result::Result<f64, DerivationError> {
        let n = eval_expr(&self.expr, record)?;
        if n.is_finite() {
            Ok(n)
        } else {
            Err(DerivationError::NonFinite)
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval_expr(expr: &Expr, record: &Record) -> std::result::Result<f64, DerivationError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Field(name) => Ok(record.number(name)),
        Expr::Neg(inner) => Ok(-eval_expr(inner, record)?),
        Expr::Binary(op, lhs, rhs) => {
            let a = eval_expr(lhs, record)?;
            let b = eval_expr(rhs, record)?;
            match op {
                BinaryOp::Add => Ok(a + b),
                BinaryOp::Sub => Ok(a - b),
                BinaryOp::Mul => Ok(a * b),
                BinaryOp::Div => {
                    if b == 0.0 {
                        Err(DerivationError::DivisionByZero)
                    } else {
                        Ok(a / b)
                    }
                }
            }
        }
        Expr::Call(func, args) => {
            let values = args
                .iter()
                .map(|a| eval_expr(a, record))
                .collect::<std::result::Result<Vec<f64>, _>>()?;
            match func {
                Function::Abs => Ok(values[0].abs()),
                Function::Min => Ok(values.iter().copied().fold(f64::INFINITY, f64::min)),
                Function::Max => Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
                Function::Round => {
                    let digits = values.get(1).copied().unwrap_or(0.0).trunc() as i32;
                    let factor = 10f64.powi(digits);
                    Ok((values[0] * factor).round() / factor)
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Field(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

struct SyntaxError {
    position: usize,
    message: String,
}

impl SyntaxError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            position,
            message: message.into(),
        }
    }

    fn into_engine_error(self, formula: &str) -> EngineError {
        EngineError::FormulaSyntax {
            formula: formula.to_string(),
            position: self.position,
            message: self.message,
        }
    }
}

fn number_re() -> &'static Regex {
    static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    NUMBER_RE.get_or_init(|| {
        Regex::new(r"^(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
            .expect("number literal regex must compile")
    })
}

fn tokenize(src: &str) -> std::result::Result<Vec<(usize, Token)>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < src.len() {
        let rest = &src[pos..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        if ch.is_whitespace() {
            pos += ch.len_utf8();
            continue;
        }

        let single = match ch {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(tok) = single {
            tokens.push((pos, tok));
            pos += 1;
            continue;
        }

        if ch == '{' {
            let Some(close) = rest.find('}') else {
                return Err(SyntaxError::new(pos, "unclosed '{'"));
            };
            let name = rest[1..close].trim();
            if name.is_empty() || name.contains('{') {
                return Err(SyntaxError::new(pos, "empty or malformed field reference"));
            }
            tokens.push((pos, Token::Field(name.to_string())));
            pos += close + 1;
            continue;
        }

        if ch.is_ascii_digit() || ch == '.' {
            let Some(m) = number_re().find(rest) else {
                return Err(SyntaxError::new(pos, "malformed number"));
            };
            let n = m
                .as_str()
                .parse::<f64>()
                .map_err(|e| SyntaxError::new(pos, e.to_string()))?;
            tokens.push((pos, Token::Number(n)));
            pos += m.end();
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            tokens.push((pos, Token::Ident(rest[..len].to_string())));
            pos += len;
            continue;
        }

        return Err(SyntaxError::new(pos, format!("unexpected character '{}'", ch)));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn parse(&mut self) -> std::result::Result<Expr, SyntaxError> {
        if self.tokens.is_empty() {
            return Err(SyntaxError::new(0, "empty formula"));
        }
        let expr = self.parse_sum()?;
        if let Some((at, tok)) = self.tokens.get(self.pos) {
            return Err(SyntaxError::new(*at, format!("unexpected {:?}", tok)));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(p, _)| *p)
            .or_else(|| self.tokens.last().map(|(p, _)| p + 1))
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Token, what: &str) -> std::result::Result<(), SyntaxError> {
        let at = self.position();
        match self.advance() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(SyntaxError::new(at, format!("expected {}, found {:?}", what, tok))),
            None => Err(SyntaxError::new(at, format!("expected {}", what))),
        }
    }

    fn parse_sum(&mut self) -> std::result::Result<Expr, SyntaxError> {
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_product()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_product(&mut self) -> std::result::Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> std::result::Result<Expr, SyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(SyntaxError::new(self.position(), "formula nested too deeply"));
        }
        self.depth += 1;
        let expr = self.parse_signed();
        self.depth -= 1;
        expr
    }

    fn parse_signed(&mut self) -> std::result::Result<Expr, SyntaxError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> std::result::Result<Expr, SyntaxError> {
        let at = self.position();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Field(name)) => Ok(Expr::Field(name)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.parse_call(at, &name)
                } else {
                    Ok(Expr::Field(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_sum()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(tok) => Err(SyntaxError::new(at, format!("unexpected {:?}", tok))),
            None => Err(SyntaxError::new(at, "unexpected end of formula")),
        }
    }

    fn parse_call(&mut self, at: usize, name: &str) -> std::result::Result<Expr, SyntaxError> {
        let func = Function::from_name(name)
            .ok_or_else(|| SyntaxError::new(at, format!("unknown function '{}'", name)))?;

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_sum()?);
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;

        if !func.arity_ok(args.len()) {
            return Err(SyntaxError::new(
                at,
                format!("wrong number of arguments to {}", name.to_ascii_uppercase()),
            ));
        }
        Ok(Expr::Call(func, args))
    }
}
