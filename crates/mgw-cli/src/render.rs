//! # Render Subcommand
//!
//! Evaluates one template the way the synthesizer would. The context file is
//! a JSON object whose top-level keys become slots; `input` is treated as
//! caller data, so blame in errors matches what a live call would report.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use mgw_template::{EvaluationContext, Interpreter, MappingTemplate, OutputMode, TemplateEngine};
use serde_json::Value;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template source file.
    #[arg(long)]
    pub template: PathBuf,

    /// JSON object providing the evaluation slots.
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Content type of the output; JSON types render JSON-aware.
    #[arg(long, default_value = "application/json")]
    pub content_type: String,
}

pub fn run_render(args: &RenderArgs, out: &mut dyn Write) -> Result<u8> {
    let source = std::fs::read_to_string(&args.template)
        .with_context(|| format!("reading {}", args.template.display()))?;
    let context = match &args.context {
        Some(path) => load_context(path)?,
        None => EvaluationContext::new(),
    };

    let mode = OutputMode::for_content_type(&args.content_type);
    let outcome = MappingTemplate::parse(source, mode).and_then(|template| {
        let evaluated = Interpreter.evaluate(&template, context)?;
        if mode == OutputMode::Json {
            evaluated.parse_json()?;
        }
        Ok(evaluated.rendered)
    });

    match outcome {
        Ok(rendered) => {
            writeln!(out, "{rendered}")?;
            Ok(0)
        }
        Err(e) => {
            let blame = if e.is_caller_fault() { "caller" } else { "template" };
            writeln!(out, "FAIL ({blame}): {e}")?;
            Ok(1)
        }
    }
}

fn load_context(path: &Path) -> Result<EvaluationContext> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let Value::Object(mut slots) = value else {
        bail!("{} must contain a JSON object", path.display());
    };

    let input = slots.remove("input");
    let mut context = EvaluationContext::from_map(slots);
    if let Some(input) = input {
        context.insert_caller("input", input);
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(template: &str, context: &str, content_type: &str) -> (u8, String) {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("t.vtl");
        let context_path = dir.path().join("ctx.json");
        std::fs::write(&template_path, template).unwrap();
        std::fs::write(&context_path, context).unwrap();
        let args = RenderArgs {
            template: template_path,
            context: Some(context_path),
            content_type: content_type.to_string(),
        };
        let mut out = Vec::new();
        let code = run_render(&args, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn renders_with_context() {
        let (code, out) = render(
            r#"{"id": "$context.requestId", "name": "$input.body"}"#,
            r#"{"context": {"requestId": "r-1"}, "input": {"body": "say \"hi\""}}"#,
            "application/json",
        );
        assert_eq!(code, 0);
        assert_eq!(out.trim_end(), r#"{"id": "r-1", "name": "say \"hi\""}"#);
    }

    #[test]
    fn text_mode_renders_raw() {
        let (code, out) = render("hello $input.body", r#"{"input": {"body": "\"x\""}}"#, "text/plain");
        assert_eq!(code, 0);
        assert_eq!(out.trim_end(), "hello \"x\"");
    }

    #[test]
    fn reports_blame() {
        let (code, out) = render(
            "$util.parseJson($input.body)",
            r#"{"input": {"body": "{nope"}}"#,
            "application/json",
        );
        assert_eq!(code, 1);
        assert!(out.starts_with("FAIL (caller)"));

        let (code, out) = render("$context.missing", r#"{"context": {}}"#, "application/json");
        assert_eq!(code, 1);
        assert!(out.starts_with("FAIL (template)"));
    }
}
