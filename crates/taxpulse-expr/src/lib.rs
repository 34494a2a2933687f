//! # taxpulse-expr — Conditions and Formulas as Data
//!
//! Tax rules carry their logic as data, never as code. This crate defines
//! the two restricted languages that logic is written in:
//!
//! - [`Condition`] — a tagged boolean/comparison AST evaluated against a
//!   [`FieldContext`](taxpulse_core::FieldContext). The evaluator is a
//!   closed, total function: it terminates, performs no side effects, and
//!   never errors on a well-formed AST. Malformed input (unknown
//!   operator, wrong arity) fails deserialization, so a bad condition
//!   can never reach evaluation.
//!
//! - [`Formula`] — an arithmetic expression language over `+ - * /`,
//!   numeric literals, named references, and the aggregate functions
//!   `SUM`, `MAX`, `MIN`, `ABS`, `ROUND`. Parsed by a recursive-descent
//!   parser at rule-load time; parse and arity errors are configuration
//!   errors, not runtime ones.
//!
//! Neither language can call out, loop, or reference anything beyond the
//! field/symbol namespace its caller binds — there is deliberately no
//! escape hatch into general-purpose scripting.

pub mod condition;
pub mod formula;

pub use condition::{Condition, LiteralValue};
pub use formula::{Formula, FormulaError, Func, ScalarBindings, SymbolTable};
