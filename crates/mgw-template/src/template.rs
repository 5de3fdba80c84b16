//! # Mapping Templates
//!
//! A [`MappingTemplate`] is parsed once at configuration time and is
//! immutable afterwards. The output mode is fixed by the media type the
//! template produces.

use crate::ast::Node;
use crate::error::TemplateError;
use crate::parser;

/// How substituted values are written into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Values substituted inside a JSON string literal are JSON-escaped.
    Json,
    /// Values are written raw.
    Text,
}

impl OutputMode {
    /// Pick the mode for a media type such as `application/json; charset=utf-8`.
    pub fn for_content_type(content_type: &str) -> Self {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if media_type.contains("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// A parsed mapping template.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTemplate {
    source: String,
    nodes: Vec<Node>,
    mode: OutputMode,
}

impl MappingTemplate {
    /// Parse `source`, failing with the position of the first malformed directive.
    pub fn parse(source: impl Into<String>, mode: OutputMode) -> Result<Self, TemplateError> {
        let source = source.into();
        let nodes = parser::parse(&source)?;
        Ok(Self {
            source,
            nodes,
            mode,
        })
    }

    /// Parse a template producing JSON.
    pub fn json(source: impl Into<String>) -> Result<Self, TemplateError> {
        Self::parse(source, OutputMode::Json)
    }

    /// Parse a template producing plain text.
    pub fn text(source: impl Into<String>) -> Result<Self, TemplateError> {
        Self::parse(source, OutputMode::Text)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }
}
