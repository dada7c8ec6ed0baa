//! AST types for WHERE-clause predicates.
//!
//! A [`Predicate`] is a binary tree: leaves compare one attribute against a
//! typed literal, inner nodes combine two predicates with AND or OR. Trees
//! are built by the parser (or the builder helpers below), never mutated,
//! and dropped once the statement has run.
//!
//! `Display` renders a predicate back into WHERE-clause syntax. Since the
//! grammar has no parentheses, rendering is meaning-preserving for any tree
//! in which no OR node sits below an AND node, which includes every tree the
//! parser produces.

use std::fmt;

use dynasql_model::AttributeValue;

/// Predicate AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Comparison leaf: `attribute op value`.
    Compare {
        /// Attribute name on the left-hand side.
        attribute: String,
        /// Comparison operator.
        op: CompareOp,
        /// Literal on the right-hand side.
        value: Literal,
    },
    /// Logical combination: `left AND right` or `left OR right`.
    Logical {
        /// Logical operator.
        op: LogicalOp,
        /// Left-hand predicate.
        left: Box<Predicate>,
        /// Right-hand predicate.
        right: Box<Predicate>,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl CompareOp {
    /// Returns `true` for operators usable in a sort-key range condition.
    #[must_use]
    pub fn is_key_range(self) -> bool {
        !matches!(self, Self::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// A literal typed at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted string.
    String(String),
    /// Bare number, kept in its source spelling.
    Number(String),
    /// `TRUE` or `FALSE`.
    Bool(bool),
}

impl Literal {
    /// Converts the literal into the attribute value it compares against.
    #[must_use]
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Self::String(s) => AttributeValue::S(s.clone()),
            Self::Number(n) => AttributeValue::N(n.clone()),
            Self::Bool(b) => AttributeValue::Bool(*b),
        }
    }
}

impl From<Literal> for AttributeValue {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::String(s) => Self::S(s),
            Literal::Number(n) => Self::N(n),
            Literal::Bool(b) => Self::Bool(b),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(true) => write!(f, "TRUE"),
            Self::Bool(false) => write!(f, "FALSE"),
        }
    }
}

impl Predicate {
    /// Builds a comparison leaf.
    #[must_use]
    pub fn compare(attribute: impl Into<String>, op: CompareOp, value: Literal) -> Self {
        Self::Compare {
            attribute: attribute.into(),
            op,
            value,
        }
    }

    /// Combines `self AND other`.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Self::Logical {
            op: LogicalOp::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Combines `self OR other`.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        Self::Logical {
            op: LogicalOp::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Returns `true` if the root node is an OR.
    #[must_use]
    pub fn is_disjunction(&self) -> bool {
        matches!(
            self,
            Self::Logical {
                op: LogicalOp::Or,
                ..
            }
        )
    }

    /// Flattens the AND spine into its conjuncts, in source order.
    ///
    /// OR nodes are not descended into; a predicate rooted at OR yields
    /// itself as the single conjunct.
    #[must_use]
    pub fn conjuncts(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        collect_conjuncts(self, &mut out);
        out
    }

    /// Rebuilds a left-deep AND chain from conjuncts. Returns `None` for an
    /// empty input.
    #[must_use]
    pub fn conjoin<I>(conjuncts: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = Predicate>,
    {
        conjuncts.into_iter().reduce(Predicate::and)
    }

    /// Attribute names referenced anywhere in the tree, in source order.
    #[must_use]
    pub fn attributes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_attributes(self, &mut out);
        out
    }
}

fn collect_conjuncts<'a>(predicate: &'a Predicate, out: &mut Vec<&'a Predicate>) {
    match predicate {
        Predicate::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => {
            collect_conjuncts(left, out);
            collect_conjuncts(right, out);
        }
        other => out.push(other),
    }
}

fn collect_attributes<'a>(predicate: &'a Predicate, out: &mut Vec<&'a str>) {
    match predicate {
        Predicate::Compare { attribute, .. } => out.push(attribute),
        Predicate::Logical { left, right, .. } => {
            collect_attributes(left, out);
            collect_attributes(right, out);
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare {
                attribute,
                op,
                value,
            } => write!(f, "{attribute} {op} {value}"),
            Self::Logical { op, left, right } => write!(f, "{left} {op} {right}"),
        }
    }
}
