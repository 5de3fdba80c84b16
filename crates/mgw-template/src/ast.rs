//! # Template AST
//!
//! A parsed template is a flat list of nodes evaluated strictly in order.
//! There is no nesting beyond expressions: no loops, no conditionals.

use std::fmt;

use serde_json::Value;

use crate::error::Position;

/// A dotted path into the evaluation context, e.g. `context.requestId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Vec<String>);

impl Path {
    /// Build a path from its segments. Returns `None` for an empty path.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    /// Parse `a.b.c`. Returns `None` if any segment is empty.
    pub fn parse(dotted: &str) -> Option<Self> {
        if dotted.split('.').any(str::is_empty) {
            return None;
        }
        Self::from_segments(dotted.split('.'))
    }

    /// The path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The top-level slot name.
    pub fn root(&self) -> &str {
        &self.0[0]
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A variable reference. `quiet` references (`$!x`) render empty when unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub path: Path,
    pub quiet: bool,
    pub position: Position,
}

/// Right-hand side of `#set`, or a directive in text position.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `$path`, `${path}`, `$!path`, `$!{path}`.
    Reference(Reference),
    /// `$util.parseJson(expr)`.
    ParseJson {
        argument: Box<Expr>,
        position: Position,
    },
    /// String, number, or boolean literal (only inside `#set` or call arguments).
    Literal(Value),
}

/// `#set($target = value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDirective {
    pub target: Path,
    pub value: Expr,
    pub position: Position,
}

/// One element of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Directive-free text, copied verbatim.
    Text(String),
    /// A reference or call whose value is rendered in place.
    Expr(Expr),
    /// A context override.
    Set(SetDirective),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotted_path() {
        let path = Path::parse("context.requestOverride.path.body").unwrap();
        assert_eq!(path.root(), "context");
        assert_eq!(path.segments().len(), 4);
        assert_eq!(path.to_string(), "context.requestOverride.path.body");
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(Path::parse("").is_none());
        assert!(Path::parse("a..b").is_none());
        assert!(Path::parse(".a").is_none());
    }
}
