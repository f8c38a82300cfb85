use std::ops::Range;

use ariadne::{self, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::expr::Operator;

/// Byte range into the query text.
pub type Span = Range<usize>;

/// The single error a failed `parse` or `render` call reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Unterminated quote or regex, dangling escape.
    #[error("{message}")]
    Lex { message: String, span: Span },

    /// A token that is illegal at the current grammar position.
    #[error("{message}")]
    Syntax { message: String, span: Span },

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl QueryError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        QueryError::Lex { message: message.into(), span }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        QueryError::Syntax { message: message.into(), span }
    }

    /// Location of the error in the source, when the stage that raised it knows one.
    pub fn span(&self) -> Option<Span> {
        match self {
            QueryError::Lex { span, .. } | QueryError::Syntax { span, .. } => Some(span.clone()),
            QueryError::Structure(_) | QueryError::Render(_) => None,
        }
    }
}

/// Violations of the tree invariants, raised by the validator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructureError {
    #[error("{operator} {message}")]
    Incomplete { operator: Operator, message: &'static str },

    #[error("{outer} cannot be repeated with itself or {inner}")]
    NestedModifier { outer: Operator, inner: Operator },

    #[error("unterminated paren: {depth} group(s) left open")]
    UnbalancedGroup { depth: usize },

    #[error("empty group")]
    EmptyGroup,
}

/// Failures of a dialect while turning a valid tree into filter text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("unable to render operator [{0}]")]
    UnsupportedOperator(Operator),

    #[error("{0} is missing an operand")]
    MissingOperand(Operator),

    #[error("literal contains null byte: {0:?}")]
    NullByte(String),

    #[error("the BETWEEN operator needs a two item list in the right hand side, have {0}")]
    MalformedRange(String),

    #[error("range on field {0} must have at least one bound")]
    UnboundedRange(String),

    #[error("comparison on field {field} requires a numeric value, have {value}")]
    NonNumericComparison { field: String, value: String },

    #[error("IN list on field {0} is empty")]
    EmptyList(String),

    #[error("unable to use {value} as the value of field {field}")]
    UnsupportedValue { field: String, value: String },

    #[error("field {field} matches the whole row and cannot be used with {operator}")]
    SourceField { field: String, operator: Operator },
}

/// Prints `error` to stderr as an annotated report over `source`.
pub fn print_error(source: &str, error: &QueryError) -> std::io::Result<()> {
    let source_name = "CLI";
    let span = error
        .span()
        .unwrap_or(0..source.len());

    Report::build(ReportKind::Error, (source_name, span.clone()))
        .with_message(stage_name(error))
        .with_label(Label::new((source_name, span)).with_message(error.to_string()))
        .finish()
        .eprint((source_name, Source::from(source)))
}

fn stage_name(error: &QueryError) -> &'static str {
    match error {
        QueryError::Lex { .. } => "Lexing error",
        QueryError::Syntax { .. } => "Parsing error",
        QueryError::Structure(_) => "Invalid query structure",
        QueryError::Render(_) => "Rendering error",
    }
}
