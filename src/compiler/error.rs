//! Compile errors with source positions.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A position in template source. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("{span}: unexpected character '{found}'")]
    UnexpectedChar { found: char, span: Span },

    #[error("{span}: unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("{span}: expected {expected}, found {found}")]
    Expected {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("{span}: component `{component}` has no view block")]
    MissingView { component: String, span: Span },

    #[error("{span}: component `{component}` declares more than one view block")]
    DuplicateView { component: String, span: Span },

    #[error("{span}: the view block must be the last member of component `{component}`")]
    MemberAfterView { component: String, span: Span },

    #[error("{span}: component `{component}` declares more than one route")]
    DuplicateRoute { component: String, span: Span },

    #[error("{span}: `{{if}}` takes a single state key, found `{condition}`")]
    UnsupportedCondition { condition: String, span: Span },

    #[error("{span}: unterminated `{block}` block")]
    Unterminated { block: &'static str, span: Span },

    #[error("{span}: `{tag}` without a matching opening block")]
    UnmatchedEnd { tag: &'static str, span: Span },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::UnexpectedChar { span, .. }
            | CompileError::UnterminatedString { span }
            | CompileError::Expected { span, .. }
            | CompileError::MissingView { span, .. }
            | CompileError::DuplicateView { span, .. }
            | CompileError::MemberAfterView { span, .. }
            | CompileError::DuplicateRoute { span, .. }
            | CompileError::UnsupportedCondition { span, .. }
            | CompileError::Unterminated { span, .. }
            | CompileError::UnmatchedEnd { span, .. } => *span,
        }
    }

    pub(crate) fn expected(expected: impl Into<String>, found: impl fmt::Display, span: Span) -> Self {
        CompileError::Expected {
            expected: expected.into(),
            found: found.to_string(),
            span,
        }
    }
}
