//! Parse failures, located by token index and, once known, by source line.

use std::fmt;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input ended inside a block; some `{` was never closed.
    UnclosedBlock,
    /// A value was expected but `found` was not one.
    ExpectedValue { found: String },
    /// A block or statement started with an operator.
    OperatorWithoutKey { operator: String },
    /// An operator had nothing usable on its right.
    MissingValue { operator: String },
    /// A `}` closed more blocks than were opened.
    StrayCloseBrace,
    /// No tokens at all.
    EmptyInput,
}

/// A parse failure at a token.
///
/// `line` is filled in by the file and string entry points, which know where each
/// token came from; [`crate::Vic3Txt::parse`] on a bare token list leaves it `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    /// Index into the token stream.
    pub position: usize,
    /// 1-based source line.
    pub line: Option<usize>,
}

impl ParseError {
    pub(crate) fn at(position: usize, kind: ErrorKind) -> Self {
        Self {
            kind,
            position,
            line: None,
        }
    }

    /// Resolves `position` to a line using the line of every token.
    /// Positions past the end take the last token's line.
    pub(crate) fn locate(mut self, token_lines: &[usize]) -> Self {
        self.line = token_lines
            .get(self.position)
            .or_else(|| token_lines.last())
            .copied();
        self
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnclosedBlock => write!(f, "unclosed `{{` at end of input"),
            ErrorKind::ExpectedValue { found } => write!(f, "expected a value, found `{}`", found),
            ErrorKind::OperatorWithoutKey { operator } => {
                write!(f, "`{}` has no key on its left", operator)
            }
            ErrorKind::MissingValue { operator } => {
                write!(f, "`{}` has no value on its right", operator)
            }
            ErrorKind::StrayCloseBrace => write!(f, "unmatched `}}`"),
            ErrorKind::EmptyInput => write!(f, "nothing to parse"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "token {}: {}", self.position, self.kind),
        }
    }
}

impl std::error::Error for ParseError {}
