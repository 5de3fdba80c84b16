//! # Evaluation
//!
//! [`Interpreter`] walks the node list once, left to right. `#set` writes into
//! the context it owns, so a later reference in the same template sees the
//! write and an earlier one never does.
//!
//! ## Guarded references
//!
//! A quiet reference that does not resolve renders as the empty string. Used
//! as a `#set` value it leaves the target untouched, and passed to
//! `$util.parseJson` it makes the call a quiet miss as well.

use serde_json::Value;

use crate::ast::{Expr, Node, Reference, SetDirective};
use crate::context::{EvaluationContext, Provenance};
use crate::error::{Blame, ErrorKind, Position, TemplateError};
use crate::render::Renderer;
use crate::template::MappingTemplate;

/// Evaluates a template against an owned context.
///
/// The synthesizer is generic over this trait so tests can observe whether
/// evaluation happened at all.
pub trait TemplateEngine: Send + Sync {
    fn evaluate(
        &self,
        template: &MappingTemplate,
        context: EvaluationContext,
    ) -> Result<EvaluatedValue, TemplateError>;
}

/// Result of one evaluation: the rendered text and the final context.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedValue {
    pub rendered: String,
    pub context: EvaluationContext,
    caller_unquoted: bool,
}

impl EvaluatedValue {
    /// Read the rendered text back as JSON.
    ///
    /// Blamed on the caller when caller-derived text was written outside a
    /// JSON string literal, on the template otherwise.
    pub fn parse_json(&self) -> Result<Value, TemplateError> {
        serde_json::from_str(&self.rendered).map_err(|e| TemplateError {
            kind: ErrorKind::MalformedOutput {
                detail: e.to_string(),
            },
            position: Position {
                line: u32::try_from(e.line()).unwrap_or(u32::MAX),
                column: u32::try_from(e.column()).unwrap_or(u32::MAX),
                offset: 0,
            },
            blame: if self.caller_unquoted {
                Blame::Caller
            } else {
                Blame::Template
            },
        })
    }
}

/// The directive interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl TemplateEngine for Interpreter {
    fn evaluate(
        &self,
        template: &MappingTemplate,
        mut context: EvaluationContext,
    ) -> Result<EvaluatedValue, TemplateError> {
        let mut renderer = Renderer::new(template.mode());

        for node in template.nodes() {
            match node {
                Node::Text(text) => renderer.push_text(text),
                Node::Expr(expr) => {
                    if let Some((value, provenance)) = eval_expr(&context, expr)? {
                        renderer.push_value(&value, is_caller(&provenance));
                    }
                }
                Node::Set(directive) => apply_set(&mut context, directive)?,
            }
        }

        let caller_unquoted = renderer.caller_unquoted();
        Ok(EvaluatedValue {
            rendered: renderer.finish(),
            context,
            caller_unquoted,
        })
    }
}

fn is_caller(provenance: &Provenance) -> bool {
    provenance.whole || !provenance.nested.is_empty()
}

fn blame_of(provenance: &Provenance) -> Blame {
    if provenance.whole {
        Blame::Caller
    } else {
        Blame::Template
    }
}

/// `Ok(None)` is a quiet miss.
fn eval_expr(
    context: &EvaluationContext,
    expr: &Expr,
) -> Result<Option<(Value, Provenance)>, TemplateError> {
    match expr {
        Expr::Literal(value) => Ok(Some((value.clone(), Provenance::template()))),
        Expr::Reference(reference) => resolve(context, reference),
        Expr::ParseJson { argument, position } => {
            let Some((argument, provenance)) = eval_expr(context, argument)? else {
                return Ok(None);
            };
            let blame = blame_of(&provenance);
            let text = match argument {
                Value::String(text) => text,
                other => {
                    return Err(TemplateError {
                        kind: ErrorKind::TypeMismatch {
                            detail: format!(
                                "$util.parseJson expects a string, found {}",
                                type_name(&other)
                            ),
                        },
                        position: *position,
                        blame,
                    })
                }
            };
            let parsed: Value = serde_json::from_str(&text).map_err(|e| TemplateError {
                kind: ErrorKind::MalformedPayload {
                    detail: e.to_string(),
                },
                position: *position,
                blame,
            })?;
            Ok(Some((
                parsed,
                Provenance {
                    whole: provenance.whole,
                    nested: Vec::new(),
                },
            )))
        }
    }
}

fn resolve(
    context: &EvaluationContext,
    reference: &Reference,
) -> Result<Option<(Value, Provenance)>, TemplateError> {
    match context.lookup(&reference.path) {
        Ok((value, provenance)) => Ok(Some((value.clone(), provenance))),
        Err(_) if reference.quiet => Ok(None),
        Err(unresolved) => {
            tracing::trace!(path = %reference.path, "unresolved strict reference");
            Err(TemplateError {
                kind: ErrorKind::UnresolvedReference {
                    path: reference.path.to_string(),
                },
                position: reference.position,
                blame: unresolved.blame,
            })
        }
    }
}

fn apply_set(
    context: &mut EvaluationContext,
    directive: &SetDirective,
) -> Result<(), TemplateError> {
    let Some((value, provenance)) = eval_expr(context, &directive.value)? else {
        return Ok(());
    };
    context
        .assign(&directive.target, value, provenance)
        .map_err(|e| TemplateError {
            kind: ErrorKind::TypeMismatch {
                detail: format!(
                    "cannot set ${}: ${} is not an object",
                    directive.target, e.blocked_at
                ),
            },
            position: directive.position,
            blame: Blame::Template,
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
