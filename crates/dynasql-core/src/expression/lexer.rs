//! Tokenizer shared by the condition and statement parsers.
//!
//! Keywords are matched case-insensitively. Every token carries its byte
//! span in the source so callers can slice clause text back out of a
//! statement (the statement parser hands WHERE fragments to the condition
//! parser this way).

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use super::parser::ParseError;

/// Reserved words of the SQL subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Join,
    Inner,
    On,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    And,
    Or,
    True,
    False,
    Null,
    // Recognized only to reject them with a precise message.
    Not,
    Like,
    In,
    Between,
    Is,
    Group,
    Having,
    Left,
    Right,
    Outer,
    Union,
}

impl Keyword {
    pub(crate) fn lookup(word: &str) -> Option<Self> {
        let kw = match word.to_ascii_uppercase().as_str() {
            "SELECT" => Self::Select,
            "FROM" => Self::From,
            "WHERE" => Self::Where,
            "INSERT" => Self::Insert,
            "INTO" => Self::Into,
            "VALUES" => Self::Values,
            "UPDATE" => Self::Update,
            "SET" => Self::Set,
            "DELETE" => Self::Delete,
            "JOIN" => Self::Join,
            "INNER" => Self::Inner,
            "ON" => Self::On,
            "ORDER" => Self::Order,
            "BY" => Self::By,
            "ASC" => Self::Asc,
            "DESC" => Self::Desc,
            "LIMIT" => Self::Limit,
            "AND" => Self::And,
            "OR" => Self::Or,
            "TRUE" => Self::True,
            "FALSE" => Self::False,
            "NULL" => Self::Null,
            "NOT" => Self::Not,
            "LIKE" => Self::Like,
            "IN" => Self::In,
            "BETWEEN" => Self::Between,
            "IS" => Self::Is,
            "GROUP" => Self::Group,
            "HAVING" => Self::Having,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "OUTER" => Self::Outer,
            "UNION" => Self::Union,
            _ => return None,
        };
        Some(kw)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::On => "ON",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Limit => "LIMIT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Null => "NULL",
            Self::Not => "NOT",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Is => "IS",
            Self::Group => "GROUP",
            Self::Having => "HAVING",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Outer => "OUTER",
            Self::Union => "UNION",
        }
    }
}

/// Lexer token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Attribute or table name (possibly dotted, e.g. `users.id`).
    Identifier(String),
    /// Quoted string literal, quotes removed and escapes resolved.
    Str(String),
    /// Number literal in its source spelling.
    Number(String),
    /// Reserved word.
    Keyword(Keyword),
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `*`
    Star,
    /// `;`
    Semicolon,
    /// End of input.
    Eof,
}

impl Token {
    pub(crate) fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, Self::Keyword(k) if *k == kw)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "identifier '{s}'"),
            Self::Str(s) => write!(f, "string '{s}'"),
            Self::Number(n) => write!(f, "number {n}"),
            Self::Keyword(kw) => write!(f, "{}", kw.as_str()),
            Self::Eq => write!(f, "'='"),
            Self::Ne => write!(f, "'<>'"),
            Self::Lt => write!(f, "'<'"),
            Self::Le => write!(f, "'<='"),
            Self::Gt => write!(f, "'>'"),
            Self::Ge => write!(f, "'>='"),
            Self::Comma => write!(f, "','"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Star => write!(f, "'*'"),
            Self::Semicolon => write!(f, "';'"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// Tokenizer over a statement or clause string.
pub(crate) struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenize the entire input. The result always ends with `Token::Eof`.
    pub(crate) fn tokenize(self) -> Result<Vec<Spanned>, ParseError> {
        match self.tokenize_partial() {
            (tokens, None) => Ok(tokens),
            (_, Some(e)) => Err(e),
        }
    }

    /// Tokenize until the end of input or the first error. On error the
    /// tokens read before it are returned alongside.
    pub(crate) fn tokenize_partial(mut self) -> (Vec<Spanned>, Option<ParseError>) {
        let mut tokens = Vec::new();
        loop {
            let spanned = match self.next_token() {
                Ok(spanned) => spanned,
                Err(e) => return (tokens, Some(e)),
            };
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return (tokens, None);
            }
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_whitespace();
        let start = self.offset();

        let Some(&(_, ch)) = self.chars.peek() else {
            return Ok(Spanned {
                token: Token::Eof,
                start,
                end: start,
            });
        };

        let token = match ch {
            '\'' | '"' => self.read_string(ch)?,
            '`' => self.read_quoted_identifier()?,
            '<' | '>' | '=' | '!' => self.read_operator()?,
            ',' => self.single(Token::Comma),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '*' => self.single(Token::Star),
            ';' => self.single(Token::Semicolon),
            c if c.is_ascii_digit() => self.read_number()?,
            '-' | '+' | '.' if self.sign_starts_number() => self.read_number()?,
            c if is_ident_start(c) => self.read_identifier_or_keyword(),
            _ => {
                return Err(ParseError::UnexpectedCharacter {
                    ch,
                    position: start,
                });
            }
        };

        let end = self.offset();
        Ok(Spanned { token, start, end })
    }

    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    /// A sign or leading dot only starts a number when a digit follows.
    fn sign_starts_number(&self) -> bool {
        let mut ahead = self.chars.clone();
        let Some((_, first)) = ahead.next() else {
            return false;
        };
        match ahead.next() {
            Some((_, c)) if c.is_ascii_digit() => true,
            Some((_, '.')) if first != '.' => ahead.next().is_some_and(|(_, c)| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, ParseError> {
        self.chars.next(); // consume opening quote
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => {
                    // A doubled quote is an escaped quote character.
                    if self.chars.peek().is_some_and(|&(_, n)| n == quote) {
                        self.chars.next();
                        s.push(quote);
                    } else {
                        return Ok(Token::Str(s));
                    }
                }
                Some((_, c)) => s.push(c),
                None => return Err(ParseError::UnterminatedString),
            }
        }
    }

    /// A backtick-quoted name, optionally qualified: `` `a-b`.col `` or
    /// `` `a-b`.`c d` ``.
    fn read_quoted_identifier(&mut self) -> Result<Token, ParseError> {
        let mut s = self.read_quoted_part()?;
        while self.chars.peek().is_some_and(|&(_, c)| c == '.') {
            self.chars.next();
            s.push('.');
            if self.chars.peek().is_some_and(|&(_, c)| c == '`') {
                s.push_str(&self.read_quoted_part()?);
                continue;
            }
            let before = s.len();
            while let Some(&(_, c)) = self.chars.peek() {
                if !is_ident_continue(c) || c == '.' {
                    break;
                }
                s.push(c);
                self.chars.next();
            }
            if s.len() == before {
                return Err(ParseError::UnexpectedToken {
                    expected: "identifier".to_owned(),
                    found: format!("'{s}'"),
                });
            }
        }
        Ok(Token::Identifier(s))
    }

    fn read_quoted_part(&mut self) -> Result<String, ParseError> {
        self.chars.next(); // consume '`'
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some((_, '`')) => break,
                Some((_, c)) => s.push(c),
                None => return Err(ParseError::UnterminatedString),
            }
        }
        if s.is_empty() {
            return Err(ParseError::UnexpectedToken {
                expected: "identifier".to_owned(),
                found: "empty quoted identifier".to_owned(),
            });
        }
        Ok(s)
    }

    fn read_operator(&mut self) -> Result<Token, ParseError> {
        let mut op = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if matches!(c, '<' | '>' | '=' | '!') {
                op.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match op.as_str() {
            "=" => Ok(Token::Eq),
            "<>" => Ok(Token::Ne),
            "<" => Ok(Token::Lt),
            "<=" => Ok(Token::Le),
            ">" => Ok(Token::Gt),
            ">=" => Ok(Token::Ge),
            _ => Err(ParseError::UnknownOperator { operator: op }),
        }
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let mut s = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            let continues = c.is_ascii_alphanumeric()
                || c == '.'
                || c == '_'
                || (matches!(c, '+' | '-')
                    && (s.is_empty() || s.ends_with(['e', 'E'])));
            if !continues {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        if !is_number_literal(&s) {
            return Err(ParseError::InvalidLiteral { literal: s });
        }
        Ok(Token::Number(s))
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if is_ident_continue(c) {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match Keyword::lookup(&ident) {
            Some(kw) => Token::Keyword(kw),
            None => Token::Identifier(ident),
        }
    }
}

/// Returns `true` if `s` is a plain decimal number: optional sign, digits
/// with an optional fraction, optional exponent.
fn is_number_literal(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or_default();
    let frac_part = parts.next();
    let digits_ok = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    let mantissa_ok = digits_ok(int_part)
        && frac_part.is_none_or(digits_ok)
        && (!int_part.is_empty() || frac_part.is_some_and(|f| !f.is_empty()));
    let exponent_ok = exponent.is_none_or(|e| {
        let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
        !digits.is_empty() && digits_ok(digits)
    });
    mantissa_ok && exponent_ok
}

/// Returns `true` if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Returns `true` if `c` can continue an identifier. Dots allow qualified
/// names such as `orders.customer_id`.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}
