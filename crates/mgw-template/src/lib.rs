//! # mgw-template: Mapping-Template Evaluator
//!
//! Mapping templates shape a request into a synthetic response. The
//! language is a small, closed directive set:
//!
//! | Form                        | Meaning                                         |
//! |-----------------------------|-------------------------------------------------|
//! | `$a.b` / `${a.b}`           | strict reference, fails if absent or null       |
//! | `$!a.b` / `$!{a.b}`         | guarded reference, renders empty if absent      |
//! | `$util.parseJson(expr)`     | parse a string into a structured value          |
//! | `#set($a.b = expr)`         | write into the current evaluation context       |
//!
//! Everything else is literal text and passes through unchanged.
//!
//! ## Evaluation
//!
//! Templates are parsed once ([`MappingTemplate::parse`]) and evaluated many
//! times ([`TemplateEngine::evaluate`]). Evaluation is a single left-to-right
//! pass over an owned [`EvaluationContext`]; identifiers and timestamps come
//! from the context, never from the evaluator.
//!
//! ## Crate Policy
//!
//! - Depends only on `serde_json` for values; no I/O, no clock, no global state.
//! - Every failure is a [`TemplateError`] with a position and a [`Blame`].

pub mod ast;
pub mod context;
pub mod error;
pub mod eval;
mod parser;
mod render;
pub mod template;

pub use context::{EvaluationContext, Provenance};
pub use error::{Blame, ErrorKind, Position, TemplateError};
pub use eval::{EvaluatedValue, Interpreter, TemplateEngine};
pub use template::{MappingTemplate, OutputMode};
