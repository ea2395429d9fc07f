//! Single-variable arithmetic expressions used by custom device mappings.
//!
//! Supported grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := ('-' | '+') factor | primary
//! primary := number | 'x' | '(' expr ')'
//! ```
//!
//! [`evaluate`] never fails: a malformed formula or a non-finite result
//! yields the input unchanged.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Why a formula could not be parsed or evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Num(f64),
    Var,
    Neg(Box<Expr>),
    Bin(Op, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// A parsed formula, reusable across evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    /// Parse an expression in `x`.
    ///
    /// # Errors
    ///
    /// Returns a [`FormulaError`] describing the first syntax problem.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let mut parser = Parser {
            chars: source.chars().peekable(),
        };
        parser.skip_ws();
        if parser.chars.peek().is_none() {
            return Err(FormulaError::Empty);
        }
        let root = parser.expr()?;
        parser.skip_ws();
        if let Some(c) = parser.chars.next() {
            return Err(FormulaError::UnexpectedChar(c));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Evaluate with `x` bound to the given input.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::DivisionByZero`] or [`FormulaError::NotFinite`].
    pub fn eval(&self, x: f64) -> Result<f64, FormulaError> {
        let value = eval(&self.root, x)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NotFinite)
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate in one step, returning `x` on any failure.
#[must_use]
pub fn evaluate(source: &str, x: f64) -> f64 {
    Formula::parse(source)
        .and_then(|formula| formula.eval(x))
        .unwrap_or(x)
}

fn eval(expr: &Expr, x: f64) -> Result<f64, FormulaError> {
    Ok(match expr {
        Expr::Num(n) => *n,
        Expr::Var => x,
        Expr::Neg(inner) => -eval(inner, x)?,
        Expr::Bin(op, lhs, rhs) => {
            let (a, b) = (eval(lhs, x)?, eval(rhs, x)?);
            match op {
                Op::Add => a + b,
                Op::Sub => a - b,
                Op::Mul => a * b,
                Op::Div if b == 0.0 => return Err(FormulaError::DivisionByZero),
                Op::Div => a / b,
            }
        }
    })
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn peek_op(&mut self, ops: &[(char, Op)]) -> Option<Op> {
        self.skip_ws();
        let c = *self.chars.peek()?;
        let op = ops.iter().find(|(sym, _)| *sym == c).map(|(_, op)| *op)?;
        self.chars.next();
        Some(op)
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek_op(&[('+', Op::Add), ('-', Op::Sub)]) {
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(self.term()?));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.factor()?;
        while let Some(op) = self.peek_op(&[('*', Op::Mul), ('/', Op::Div)]) {
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(self.factor()?));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, FormulaError> {
        self.skip_ws();
        match self.chars.peek() {
            Some('-') => {
                self.chars.next();
                Ok(Expr::Neg(Box::new(self.factor()?)))
            }
            Some('+') => {
                self.chars.next();
                self.factor()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        self.skip_ws();
        match self.chars.peek().copied() {
            None => Err(FormulaError::UnexpectedEnd),
            Some('x' | 'X') => {
                self.chars.next();
                Ok(Expr::Var)
            }
            Some('(') => {
                self.chars.next();
                let inner = self.expr()?;
                self.skip_ws();
                match self.chars.next() {
                    Some(')') => Ok(inner),
                    Some(c) => Err(FormulaError::UnexpectedChar(c)),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(FormulaError::UnexpectedChar(c)),
        }
    }

    fn number(&mut self) -> Result<Expr, FormulaError> {
        let mut text = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            text.push(c);
        }
        text.parse()
            .map(Expr::Num)
            .map_err(|_| FormulaError::InvalidNumber(text))
    }
}
