//! # Template Errors
//!
//! Every failure carries the kind, the source position of the directive that
//! failed, and a blame marker. Blame decides the HTTP class downstream: a
//! failure rooted in caller-supplied data is the caller's fault, anything else
//! is a defect in a fixed template.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Line/column position in a template source (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column in characters, starting at 1.
    pub column: u32,
    /// Byte offset into the source.
    pub offset: usize,
}

impl Position {
    /// Position of the first character.
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Who caused an evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Blame {
    /// The failing value was derived from caller input (`input.*` or staged from it).
    Caller,
    /// The template itself is defective.
    Template,
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed directive; raised at parse time.
    Syntax(String),
    /// A strict reference did not resolve.
    UnresolvedReference {
        /// The dotted path that was referenced.
        path: String,
    },
    /// `$util.parseJson` received text that is not valid JSON.
    MalformedPayload {
        /// Parser message.
        detail: String,
    },
    /// A directive received a value of the wrong shape.
    TypeMismatch {
        /// What was expected and what was found.
        detail: String,
    },
    /// The rendered output could not be read back as JSON.
    MalformedOutput {
        /// Parser message.
        detail: String,
    },
}

impl ErrorKind {
    /// Stable machine-readable name of the kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "TEMPLATE_SYNTAX",
            Self::UnresolvedReference { .. } => "UNRESOLVED_REFERENCE",
            Self::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::MalformedOutput { .. } => "MALFORMED_OUTPUT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(msg) => write!(f, "syntax error: {msg}"),
            Self::UnresolvedReference { path } => write!(f, "unresolved reference ${path}"),
            Self::MalformedPayload { detail } => write!(f, "malformed payload: {detail}"),
            Self::TypeMismatch { detail } => write!(f, "type mismatch: {detail}"),
            Self::MalformedOutput { detail } => {
                write!(f, "rendered output is not valid JSON: {detail}")
            }
        }
    }
}

/// A template parse or evaluation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {position}")]
pub struct TemplateError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where the failing directive starts.
    pub position: Position,
    /// Whether caller input or the template is at fault.
    pub blame: Blame,
}

impl TemplateError {
    pub(crate) fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self {
            kind: ErrorKind::Syntax(message.into()),
            position,
            blame: Blame::Template,
        }
    }

    /// Whether the failure is attributable to caller input.
    pub fn is_caller_fault(&self) -> bool {
        self.blame == Blame::Caller
    }
}
