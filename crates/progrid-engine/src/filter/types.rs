use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{format_value, Value};

/// Byte range of a token or error inside a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (at {}..{})",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A filter expression failed to compile for one column.
///
/// Scoped to that column only: other columns in the same batch compile (or
/// fail) independently, and the column's previously installed filter stays
/// active.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot use filter expression for field {column}: {error}")]
pub struct FilterCompileError {
    /// The offending column's display label (falls back to the column key
    /// when no label is known).
    pub column: String,
    #[source]
    pub error: ParseError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    /// The operator with its operands swapped (`5 < $VAL` == `$VAL > 5`).
    pub(crate) fn mirrored(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
        }
    }
}

/// Right-hand side of a comparison.
///
/// Whether a text operand was normalized (trimmed/lowercased) is decided at
/// parse time: placeholder-form literals are normalized to match the
/// normalized value, comparator-form operands are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
}

/// The compiled predicate AST, interpreted directly against the normalized
/// value.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Comparator and placeholder comparisons: `format(VAL) <op> operand`.
    Compare { op: CompareOp, operand: Operand },
    /// Placeholder membership: `needle in $VAL`.
    Contains { needle: String },
    /// `$VAL.startswith(prefix)`.
    StartsWith { prefix: String },
    /// `$VAL.endswith(suffix)`.
    EndsWith { suffix: String },
    /// Literal form: case-insensitive, whitespace-trimmed equality.
    Equals { text: String },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// A compiled row filter: the predicate plus the expression text it was
/// compiled from, kept for round-trip display and settings export.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub(crate) predicate: Predicate,
    pub(crate) source: String,
}

impl RowFilter {
    pub(crate) fn new(predicate: Predicate, source: impl Into<String>) -> Self {
        Self {
            predicate,
            source: source.into(),
        }
    }

    /// A substring filter over the normalized value, as generated for
    /// grid-wide searches.
    pub fn contains(needle: &str) -> Self {
        Self::new(
            Predicate::Contains {
                needle: crate::value::format_text(needle),
            },
            needle.trim(),
        )
    }

    /// Evaluate against a cell value (normalized internally).
    pub fn matches(&self, value: &Value) -> bool {
        self.matches_formatted(&format_value(value))
    }

    /// Evaluate against an already-normalized value.
    pub fn matches_formatted(&self, formatted: &str) -> bool {
        super::eval::matches(&self.predicate, formatted)
    }

    /// The expression this filter was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}
