//! WHERE-clause condition parsing and evaluation.
//!
//! The pipeline is:
//!
//! 1. **Lexing**: Tokenize the condition string (shared with the statement parser).
//! 2. **Parsing**: Build a [`Predicate`] with recursive descent.
//! 3. **Evaluation**: Walk the predicate against an item for client-side filters.

pub mod ast;
pub mod evaluator;
pub(crate) mod lexer;
pub mod parser;

pub use ast::{CompareOp, Literal, LogicalOp, Predicate};
pub use evaluator::{compare_values, matches, values_equal};
pub use parser::{ParseError, parse_condition};
