//! Recursive-descent parser for WHERE-clause conditions.
//!
//! Grammar (AND binds tighter than OR, both left-associative):
//!
//! ```text
//! condition  := and_expr ( OR and_expr )*
//! and_expr   := comparison ( AND comparison )*
//! comparison := identifier op literal
//! op         := = | <> | < | <= | > | >=
//! literal    := 'string' | "string" | number | TRUE | FALSE
//! ```

use super::ast::{CompareOp, Literal, Predicate};
use super::lexer::{Keyword, Lexer, Spanned, Token};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while tokenizing or parsing a condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The condition is empty or whitespace only.
    #[error("Empty condition")]
    Empty,
    /// An unexpected token was encountered.
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },
    /// The condition ended prematurely.
    #[error("Unexpected end of condition: expected {expected}")]
    UnexpectedEnd {
        /// What was expected.
        expected: String,
    },
    /// A comparison used an operator outside `=, <>, <, <=, >, >=`.
    #[error("Unknown operator: {operator}")]
    UnknownOperator {
        /// The operator as written.
        operator: String,
    },
    /// A bare word appeared where a typed literal was expected.
    #[error("Untyped literal: {literal} (quote strings, e.g. '{literal}')")]
    UntypedLiteral {
        /// The bare word.
        literal: String,
    },
    /// A number literal could not be read.
    #[error("Invalid literal: {literal}")]
    InvalidLiteral {
        /// The literal as written.
        literal: String,
    },
    /// A quoted string or identifier was not closed.
    #[error("Unterminated quoted string")]
    UnterminatedString,
    /// A character that starts no token.
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// Byte offset in the input.
        position: usize,
    },
    /// Syntax that is recognized but not part of the supported subset.
    #[error("Unsupported syntax: {feature}")]
    Unsupported {
        /// The construct that was rejected.
        feature: String,
    },
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Token cursor for condition parsing.
struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |s| &s.token)
    }

    fn advance(&mut self) -> Token {
        let tok = self
            .tokens
            .get(self.pos)
            .map_or(Token::Eof, |s| s.token.clone());
        self.pos += 1;
        tok
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    /// Parse a full condition (OR is lowest precedence).
    fn parse_or_expr(&mut self) -> Result<Predicate, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.peek().is_keyword(Keyword::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = left.or(right);
        }
        Ok(left)
    }

    /// Parse AND chains.
    fn parse_and_expr(&mut self) -> Result<Predicate, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.peek().is_keyword(Keyword::And) {
            self.advance();
            let right = self.parse_comparison()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Predicate, ParseError> {
        let attribute = match self.advance() {
            Token::Identifier(name) => name,
            Token::LParen => {
                return Err(ParseError::Unsupported {
                    feature: "parenthesized sub-expression".to_owned(),
                });
            }
            Token::Keyword(Keyword::Not) => {
                return Err(ParseError::Unsupported {
                    feature: "NOT".to_owned(),
                });
            }
            Token::Eof => {
                return Err(ParseError::UnexpectedEnd {
                    expected: "attribute name".to_owned(),
                });
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "attribute name".to_owned(),
                    found: other.to_string(),
                });
            }
        };

        if matches!(self.peek(), Token::LParen) {
            return Err(ParseError::Unsupported {
                feature: format!("function call {attribute}()"),
            });
        }

        let op = self.parse_compare_op()?;
        let value = self.parse_literal()?;
        Ok(Predicate::Compare {
            attribute,
            op,
            value,
        })
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, ParseError> {
        match self.advance() {
            Token::Eq => Ok(CompareOp::Eq),
            Token::Ne => Ok(CompareOp::Ne),
            Token::Lt => Ok(CompareOp::Lt),
            Token::Le => Ok(CompareOp::Le),
            Token::Gt => Ok(CompareOp::Gt),
            Token::Ge => Ok(CompareOp::Ge),
            Token::Keyword(
                kw @ (Keyword::Like | Keyword::In | Keyword::Between | Keyword::Is | Keyword::Not),
            ) => Err(ParseError::UnknownOperator {
                operator: kw.as_str().to_owned(),
            }),
            Token::Eof => Err(ParseError::UnexpectedEnd {
                expected: "comparison operator".to_owned(),
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: "comparison operator".to_owned(),
                found: other.to_string(),
            }),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        match self.advance() {
            Token::Str(s) => Ok(Literal::String(s)),
            Token::Number(n) => Ok(Literal::Number(n)),
            Token::Keyword(Keyword::True) => Ok(Literal::Bool(true)),
            Token::Keyword(Keyword::False) => Ok(Literal::Bool(false)),
            Token::Identifier(word) => Err(ParseError::UntypedLiteral { literal: word }),
            Token::Keyword(Keyword::Null) => Err(ParseError::Unsupported {
                feature: "NULL comparison".to_owned(),
            }),
            Token::LParen => Err(ParseError::Unsupported {
                feature: "subquery or parenthesized value".to_owned(),
            }),
            Token::Eof => Err(ParseError::UnexpectedEnd {
                expected: "literal".to_owned(),
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: "literal".to_owned(),
                found: other.to_string(),
            }),
        }
    }
}

/// Parse a WHERE-clause condition into a [`Predicate`].
///
/// # Errors
///
/// Returns `ParseError` if the condition is empty, uses an operator outside
/// the supported set, contains an untyped literal, or is otherwise
/// syntactically invalid.
pub fn parse_condition(input: &str) -> Result<Predicate, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    if parser.at_end() {
        return Err(ParseError::Empty);
    }
    let predicate = parser.parse_or_expr()?;
    if !parser.at_end() {
        let found = parser.peek();
        if let Token::Keyword(
            kw @ (Keyword::Like | Keyword::In | Keyword::Between | Keyword::Is | Keyword::Not),
        ) = found
        {
            return Err(ParseError::UnknownOperator {
                operator: kw.as_str().to_owned(),
            });
        }
        return Err(ParseError::UnexpectedToken {
            expected: "AND, OR or end of condition".to_owned(),
            found: found.to_string(),
        });
    }
    Ok(predicate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
