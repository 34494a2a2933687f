//! # Formula Language
//!
//! The arithmetic language tax rules compute with. Two dialects share one
//! grammar:
//!
//! - **Transaction formulas** bind exactly the symbols `base` and `rate`
//!   and may not call functions (e.g. `base * rate`).
//! - **Aggregate formulas** bind bucket names and may call `SUM`, `MAX`,
//!   `MIN`, `ABS`, `ROUND` (e.g.
//!   `SUM(VAT_OUTPUT_12, VAT_OUTPUT_ZERO) - SUM(VAT_INPUT_12)`).
//!
//! The dialect restriction is the caller's load-time check (via
//! [`Formula::refs`] and [`Formula::has_calls`]); the grammar itself is
//! shared. Parsing happens once when a pack is loaded — a formula that
//! parses cannot fail at evaluation time except for division by zero,
//! which is reported as data, not a panic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors from parsing or evaluating a formula.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// A character outside the grammar.
    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar {
        /// Byte offset in the source.
        pos: usize,
        /// The offending character.
        ch: char,
    },

    /// A numeric literal that does not parse as a decimal.
    #[error("invalid number {text:?} at offset {pos}")]
    InvalidNumber {
        /// Byte offset in the source.
        pos: usize,
        /// The offending literal text.
        text: String,
    },

    /// A token where the grammar expected something else.
    #[error("unexpected token at offset {pos}: expected {expected}")]
    UnexpectedToken {
        /// Byte offset in the source.
        pos: usize,
        /// What the parser was expecting.
        expected: &'static str,
    },

    /// Source ended mid-expression.
    #[error("unexpected end of formula: expected {expected}")]
    UnexpectedEnd {
        /// What the parser was expecting.
        expected: &'static str,
    },

    /// A call to a function outside the closed set.
    #[error("unknown function {0:?}; supported: SUM, MAX, MIN, ABS, ROUND")]
    UnknownFunction(String),

    /// A function called with the wrong number of arguments.
    #[error("{function} expects {expected} argument(s), got {got}")]
    BadArity {
        /// Function name.
        function: &'static str,
        /// Expected argument description.
        expected: &'static str,
        /// Actual argument count.
        got: usize,
    },

    /// Division by zero during evaluation.
    #[error("division by zero")]
    DivisionByZero,

    /// `ROUND` places argument outside 0..=28.
    #[error("ROUND places must be an integer in 0..=28, got {0}")]
    InvalidRoundPlaces(Decimal),
}

/// The closed set of aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    /// Sum of all arguments.
    Sum,
    /// Maximum of all arguments.
    Max,
    /// Minimum of all arguments.
    Min,
    /// Absolute value of one argument.
    Abs,
    /// Round first argument to the places given by the second.
    Round,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "SUM" => Some(Self::Sum),
            "MAX" => Some(Self::Max),
            "MIN" => Some(Self::Min),
            "ABS" => Some(Self::Abs),
            "ROUND" => Some(Self::Round),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Abs => "ABS",
            Self::Round => "ROUND",
        }
    }

    /// Arity check at parse time.
    fn check_arity(&self, got: usize) -> Result<(), FormulaError> {
        let ok = match self {
            Self::Sum | Self::Max | Self::Min => got >= 1,
            Self::Abs => got == 1,
            Self::Round => got == 2,
        };
        if ok {
            Ok(())
        } else {
            let expected = match self {
                Self::Sum | Self::Max | Self::Min => "at least 1",
                Self::Abs => "exactly 1",
                Self::Round => "exactly 2",
            };
            Err(FormulaError::BadArity {
                function: self.name(),
                expected,
                got,
            })
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed formula expression tree.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Ref(String),
    Call(Func, Vec<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// A compiled formula: source text plus its parsed expression tree.
///
/// Serializes as the source string, so pack files carry formulas in their
/// written form and recompile them on load.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

/// Resolves named references during formula evaluation.
///
/// Returning `None` reads as zero: aggregate formulas treat a bucket that
/// no rule has written yet as an empty accumulator.
pub trait SymbolTable {
    /// Resolve a reference by name.
    fn resolve(&self, name: &str) -> Option<Decimal>;
}

/// Symbol table for transaction formulas: exactly `base` and `rate`.
#[derive(Debug, Clone, Copy)]
pub struct ScalarBindings {
    /// The resolved base amount.
    pub base: Decimal,
    /// The resolved tax rate.
    pub rate: Decimal,
}

impl SymbolTable for ScalarBindings {
    fn resolve(&self, name: &str) -> Option<Decimal> {
        match name {
            "base" => Some(self.base),
            "rate" => Some(self.rate),
            _ => None,
        }
    }
}

impl Formula {
    /// Parse a formula from source text.
    ///
    /// All grammar, function-name, and arity errors surface here — a
    /// returned `Formula` cannot fail to evaluate except by dividing by
    /// zero.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;
        if let Some((pos, _)) = parser.peek() {
            return Err(FormulaError::UnexpectedToken {
                pos,
                expected: "end of formula",
            });
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The original source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every reference name the formula reads.
    pub fn refs(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        collect_refs(&self.expr, &mut out);
        out
    }

    /// Whether the formula calls any aggregate function.
    pub fn has_calls(&self) -> bool {
        has_calls(&self.expr)
    }

    /// Evaluate against a symbol table. Unresolved references read as zero.
    pub fn evaluate(&self, symbols: &dyn SymbolTable) -> Result<Decimal, FormulaError> {
        eval(&self.expr, symbols)
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Formula {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

fn collect_refs<'a>(expr: &'a Expr, out: &mut BTreeSet<&'a str>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ref(name) => {
            out.insert(name);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_refs(arg, out);
            }
        }
        Expr::Neg(inner) => collect_refs(inner, out),
        Expr::Binary(_, lhs, rhs) => {
            collect_refs(lhs, out);
            collect_refs(rhs, out);
        }
    }
}

fn has_calls(expr: &Expr) -> bool {
    match expr {
        Expr::Number(_) | Expr::Ref(_) => false,
        Expr::Call(..) => true,
        Expr::Neg(inner) => has_calls(inner),
        Expr::Binary(_, lhs, rhs) => has_calls(lhs) || has_calls(rhs),
    }
}

fn eval(expr: &Expr, symbols: &dyn SymbolTable) -> Result<Decimal, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(name) => Ok(symbols.resolve(name).unwrap_or(Decimal::ZERO)),
        Expr::Neg(inner) => Ok(-eval(inner, symbols)?),
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, symbols)?;
            let r = eval(rhs, symbols)?;
            match op {
                BinOp::Add => Ok(l + r),
                BinOp::Sub => Ok(l - r),
                BinOp::Mul => Ok(l * r),
                BinOp::Div => {
                    if r.is_zero() {
                        Err(FormulaError::DivisionByZero)
                    } else {
                        Ok(l / r)
                    }
                }
            }
        }
        Expr::Call(func, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, symbols)?);
            }
            match func {
                Func::Sum => Ok(values.into_iter().sum()),
                Func::Max => Ok(values
                    .into_iter()
                    .reduce(Decimal::max)
                    .unwrap_or(Decimal::ZERO)),
                Func::Min => Ok(values
                    .into_iter()
                    .reduce(Decimal::min)
                    .unwrap_or(Decimal::ZERO)),
                Func::Abs => Ok(values[0].abs()),
                Func::Round => {
                    use rust_decimal::prelude::ToPrimitive;
                    let places = values[1];
                    let dp = match places.to_u32() {
                        Some(dp) if places.fract().is_zero() && dp <= 28 => dp,
                        _ => return Err(FormulaError::InvalidRoundPlaces(places)),
                    };
                    Ok(values[0].round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
                }
            }
        }
    }
}

// ─── Tokenizer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i] as char;
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            ',' => {
                tokens.push((i, Token::Comma));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let text = &source[start..i];
                let number = text.parse::<Decimal>().map_err(|_| {
                    FormulaError::InvalidNumber {
                        pos: start,
                        text: text.to_string(),
                    }
                })?;
                tokens.push((start, Token::Number(number)));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i] as char, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
                {
                    i += 1;
                }
                tokens.push((start, Token::Ident(source[start..i].to_string())));
            }
            other => {
                return Err(FormulaError::UnexpectedChar { pos: i, ch: other });
            }
        }
    }

    Ok(tokens)
}

// ─── Parser ──────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, &Token)> {
        self.tokens.get(self.pos).map(|(p, t)| (*p, t))
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), FormulaError> {
        match self.advance() {
            Some((_, t)) if t == token => Ok(()),
            Some((pos, _)) => Err(FormulaError::UnexpectedToken { pos, expected }),
            None => Err(FormulaError::UnexpectedEnd { expected }),
        }
    }

    /// expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some((_, token)) = self.peek() {
            let op = match token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    /// term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.factor()?;
        while let Some((_, token)) = self.peek() {
            let op = match token {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.factor()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    /// factor := '-' factor | number | ident | ident '(' args ')' | '(' expression ')'
    fn factor(&mut self) -> Result<Expr, FormulaError> {
        match self.advance() {
            Some((_, Token::Minus)) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some((_, Token::Number(n))) => Ok(Expr::Number(n)),
            Some((_, Token::Ident(name))) => {
                if matches!(self.peek(), Some((_, Token::LParen))) {
                    self.advance();
                    let func = Func::from_name(&name)
                        .ok_or(FormulaError::UnknownFunction(name))?;
                    let args = self.arguments()?;
                    func.check_arity(args.len())?;
                    Ok(Expr::Call(func, args))
                } else {
                    Ok(Expr::Ref(name))
                }
            }
            Some((_, Token::LParen)) => {
                let inner = self.expression()?;
                self.expect(Token::RParen, "closing parenthesis")?;
                Ok(inner)
            }
            Some((pos, _)) => Err(FormulaError::UnexpectedToken {
                pos,
                expected: "number, reference, or parenthesized expression",
            }),
            None => Err(FormulaError::UnexpectedEnd {
                expected: "number, reference, or parenthesized expression",
            }),
        }
    }

    /// args := expression (',' expression)* ')'
    fn arguments(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some((_, Token::RParen))) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance() {
                Some((_, Token::Comma)) => continue,
                Some((_, Token::RParen)) => break,
                Some((pos, _)) => {
                    return Err(FormulaError::UnexpectedToken {
                        pos,
                        expected: "comma or closing parenthesis",
                    });
                }
                None => {
                    return Err(FormulaError::UnexpectedEnd {
                        expected: "comma or closing parenthesis",
                    });
                }
            }
        }
        Ok(args)
    }
}
