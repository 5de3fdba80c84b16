//! # Template Parser
//!
//! Single pass over the source, producing a flat node list.
//!
//! ## Grammar
//!
//! ```text
//! template  := (text | reference | call | set)*
//! reference := '$' '!'? ident ('.' ident)*
//!            | '$' '!'? '{' ident ('.' ident)* '}'
//! call      := '$util.parseJson(' expr ')'
//! set       := '#set' ws* '(' ws* target ws* '=' expr ws* ')'
//! target    := '$' ident ('.' ident)* | '${' ident ('.' ident)* '}'
//! expr      := reference | call | string | number | 'true' | 'false'
//! ident     := [A-Za-z] [A-Za-z0-9_]*
//! ```
//!
//! A `$` or `#` that does not start one of these forms is literal text.
//! `${`, `#set(`, and `$util` always start a directive, so malformed forms
//! fail loudly instead of degrading to text. Double-quoted strings are not
//! interpolated.

use serde_json::{Number, Value};

use crate::ast::{Expr, Node, Path, Reference, SetDirective};
use crate::error::{Position, TemplateError};

const UTIL_ROOT: &str = "util";
const PARSE_JSON: &str = "parseJson";

/// Parse a template source into nodes.
pub fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        cursor: Cursor::new(source),
        nodes: Vec::new(),
        text: String::new(),
    };
    parser.run()?;
    Ok(parser.nodes)
}

#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    src: &'a str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    nodes: Vec<Node>,
    text: String,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<(), TemplateError> {
        while let Some(c) = self.cursor.peek() {
            match c {
                '#' if self.at_set() => {
                    let directive = self.set_directive()?;
                    self.flush_text();
                    self.nodes.push(Node::Set(directive));
                }
                '$' => {
                    let saved = self.cursor;
                    match self.dollar()? {
                        Some(expr) => {
                            self.flush_text();
                            self.nodes.push(Node::Expr(expr));
                        }
                        None => {
                            self.cursor = saved;
                            self.cursor.bump();
                            self.text.push('$');
                        }
                    }
                }
                _ => {
                    self.cursor.bump();
                    self.text.push(c);
                }
            }
        }
        self.flush_text();
        Ok(())
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.nodes.push(Node::Text(std::mem::take(&mut self.text)));
        }
    }

    fn at_set(&self) -> bool {
        if !self.cursor.rest().starts_with("#set") {
            return false;
        }
        let mut probe = self.cursor;
        for _ in 0..4 {
            probe.bump();
        }
        probe.skip_whitespace();
        probe.peek() == Some('(')
    }

    /// Parse a `$...` form at the cursor. `Ok(None)` means the `$` is literal.
    fn dollar(&mut self) -> Result<Option<Expr>, TemplateError> {
        let position = self.cursor.position();
        self.cursor.bump();
        let quiet = self.cursor.eat('!');

        if self.cursor.eat('{') {
            let path = self.path(position)?;
            if !self.cursor.eat('}') {
                return Err(TemplateError::syntax(
                    "unterminated ${...} reference",
                    position,
                ));
            }
            if path.root() == UTIL_ROOT {
                return Err(TemplateError::syntax(
                    "$util is reserved and cannot be referenced in braces",
                    position,
                ));
            }
            return Ok(Some(Expr::Reference(Reference {
                path,
                quiet,
                position,
            })));
        }

        if !matches!(self.cursor.peek(), Some(c) if c.is_ascii_alphabetic()) {
            return Ok(None);
        }

        let path = self.path(position)?;
        if path.root() == UTIL_ROOT {
            if quiet {
                return Err(TemplateError::syntax(
                    "$util calls cannot be quiet",
                    position,
                ));
            }
            return self.util_call(path, position).map(Some);
        }
        if self.cursor.peek() == Some('(') {
            return Err(TemplateError::syntax(
                format!("method calls are not supported on ${path}"),
                position,
            ));
        }
        Ok(Some(Expr::Reference(Reference {
            path,
            quiet,
            position,
        })))
    }

    fn path(&mut self, position: Position) -> Result<Path, TemplateError> {
        let mut segments = vec![self.ident(position)?];
        while self.cursor.peek() == Some('.')
            && matches!(self.cursor.peek_nth(1), Some(c) if c.is_ascii_alphabetic())
        {
            self.cursor.bump();
            segments.push(self.ident(position)?);
        }
        Path::from_segments(segments)
            .ok_or_else(|| TemplateError::syntax("expected identifier", position))
    }

    fn ident(&mut self, position: Position) -> Result<String, TemplateError> {
        let mut ident = String::new();
        match self.cursor.peek() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return Err(TemplateError::syntax("expected identifier", position)),
        }
        while let Some(c) = self.cursor.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.cursor.bump();
            } else {
                break;
            }
        }
        Ok(ident)
    }

    fn util_call(&mut self, path: Path, position: Position) -> Result<Expr, TemplateError> {
        match path.segments() {
            [_, function] if function == PARSE_JSON => {}
            [_] => {
                return Err(TemplateError::syntax(
                    "$util is reserved; expected $util.parseJson(...)",
                    position,
                ))
            }
            _ => {
                return Err(TemplateError::syntax(
                    format!("unknown function ${path}"),
                    position,
                ))
            }
        }
        if !self.cursor.eat('(') {
            return Err(TemplateError::syntax(
                "expected '(' after $util.parseJson",
                position,
            ));
        }
        let argument = self.expr()?;
        self.cursor.skip_whitespace();
        if !self.cursor.eat(')') {
            return Err(TemplateError::syntax(
                "expected ')' to close $util.parseJson(",
                self.cursor.position(),
            ));
        }
        Ok(Expr::ParseJson {
            argument: Box::new(argument),
            position,
        })
    }

    fn expr(&mut self) -> Result<Expr, TemplateError> {
        self.cursor.skip_whitespace();
        let position = self.cursor.position();
        match self.cursor.peek() {
            Some('$') => self.dollar()?.ok_or_else(|| {
                TemplateError::syntax("expected a reference after '$'", position)
            }),
            Some(quote @ ('"' | '\'')) => self.string(quote, position),
            Some(c) if c.is_ascii_digit() || c == '-' => self.number(position),
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.ident(position)?;
                match word.as_str() {
                    "true" => Ok(Expr::Literal(Value::Bool(true))),
                    "false" => Ok(Expr::Literal(Value::Bool(false))),
                    other => Err(TemplateError::syntax(
                        format!("unexpected identifier {other:?}; references start with '$'"),
                        position,
                    )),
                }
            }
            Some(c) => Err(TemplateError::syntax(
                format!("expected an expression, found {c:?}"),
                position,
            )),
            None => Err(TemplateError::syntax(
                "unexpected end of template, expected an expression",
                position,
            )),
        }
    }

    fn string(&mut self, quote: char, position: Position) -> Result<Expr, TemplateError> {
        self.cursor.bump();
        let mut value = String::new();
        loop {
            match self.cursor.bump() {
                None => {
                    return Err(TemplateError::syntax(
                        "unterminated string literal",
                        position,
                    ))
                }
                Some(c) if c == quote => break,
                Some('\\') if quote == '"' => {
                    let escaped = match self.cursor.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some(c @ ('\\' | '"' | '\'')) => c,
                        Some(other) => {
                            return Err(TemplateError::syntax(
                                format!("unknown escape \\{other}"),
                                position,
                            ))
                        }
                        None => {
                            return Err(TemplateError::syntax(
                                "unterminated string literal",
                                position,
                            ))
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
        Ok(Expr::Literal(Value::String(value)))
    }

    fn number(&mut self, position: Position) -> Result<Expr, TemplateError> {
        let mut digits = String::new();
        if self.cursor.eat('-') {
            digits.push('-');
        }
        let mut fractional = false;
        while let Some(c) = self.cursor.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if c == '.'
                && !fractional
                && matches!(self.cursor.peek_nth(1), Some(d) if d.is_ascii_digit())
            {
                fractional = true;
                digits.push(c);
            } else {
                break;
            }
            self.cursor.bump();
        }

        let invalid = || TemplateError::syntax(format!("invalid number {digits:?}"), position);
        let number = if fractional {
            digits
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(invalid)?
        } else {
            Number::from(digits.parse::<i64>().map_err(|_| invalid())?)
        };
        Ok(Expr::Literal(Value::Number(number)))
    }

    fn set_directive(&mut self) -> Result<SetDirective, TemplateError> {
        let position = self.cursor.position();
        for _ in 0..4 {
            self.cursor.bump();
        }
        self.cursor.skip_whitespace();
        if !self.cursor.eat('(') {
            return Err(TemplateError::syntax("expected '(' after #set", position));
        }
        self.cursor.skip_whitespace();

        if !self.cursor.eat('$') {
            return Err(TemplateError::syntax(
                "expected a $reference as the #set target",
                position,
            ));
        }
        if self.cursor.peek() == Some('!') {
            return Err(TemplateError::syntax(
                "#set target cannot be a quiet reference",
                position,
            ));
        }
        let braced = self.cursor.eat('{');
        let target = self.path(position)?;
        if braced && !self.cursor.eat('}') {
            return Err(TemplateError::syntax(
                "unterminated ${...} in #set target",
                position,
            ));
        }
        if target.root() == UTIL_ROOT {
            return Err(TemplateError::syntax("cannot assign to $util", position));
        }

        self.cursor.skip_whitespace();
        if !self.cursor.eat('=') {
            return Err(TemplateError::syntax("expected '=' in #set", position));
        }
        let value = self.expr()?;
        self.cursor.skip_whitespace();
        if !self.cursor.eat(')') {
            return Err(TemplateError::syntax(
                "expected ')' to close #set",
                self.cursor.position(),
            ));
        }

        Ok(SetDirective {
            target,
            value,
            position,
        })
    }
}
