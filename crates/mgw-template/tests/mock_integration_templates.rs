//! Request/response template pairs as they are configured on a mock
//! integration, evaluated back to back.

use mgw_template::{
    Blame, ErrorKind, EvaluationContext, Interpreter, MappingTemplate, TemplateEngine,
};
use proptest::prelude::*;
use serde_json::{json, Value};

const REQUEST_TEMPLATE: &str =
    "#set($context.requestOverride.path.body = $input.body)\n{\"statusCode\": 201}";

const RESPONSE_TEMPLATE: &str = r#"#set($body = $context.requestOverride.path.body)
#set($parsedBody = $util.parseJson($body))
{
  "id": "$context.requestId",
  "name": "$parsedBody.name",
  "type": "$parsedBody.type",
  "createdAt": $context.requestTimeEpoch,
  "updatedAt": $context.requestTimeEpoch
}"#;

fn request_context(body: &str) -> EvaluationContext {
    let mut ctx = EvaluationContext::new();
    ctx.insert_caller("input", json!({ "body": body, "headers": {}, "querystring": {} }));
    ctx.insert(
        "context",
        json!({ "requestId": "c6af9ac6-7b61", "requestTimeEpoch": 1428582896000_i64 }),
    );
    ctx
}

fn run_pair(body: &str) -> Result<(Value, Value), mgw_template::TemplateError> {
    let request = MappingTemplate::json(REQUEST_TEMPLATE).unwrap();
    let response = MappingTemplate::json(RESPONSE_TEMPLATE).unwrap();

    let staged = Interpreter.evaluate(&request, request_context(body))?;
    let directive = staged.parse_json()?;
    let mut next = staged.context;
    next.remove("input");
    let rendered = Interpreter.evaluate(&response, next)?;
    Ok((directive, rendered.parse_json()?))
}

#[test]
fn pet_body_round_trips() {
    let (directive, body) = run_pair(r#"{"name":"A dog","type":"dog"}"#).unwrap();
    assert_eq!(directive["statusCode"], 201);
    assert_eq!(
        body,
        json!({
            "id": "c6af9ac6-7b61",
            "name": "A dog",
            "type": "dog",
            "createdAt": 1428582896000_i64,
            "updatedAt": 1428582896000_i64,
        })
    );
}

#[test]
fn echoed_strings_with_quotes_survive() {
    let (_, body) = run_pair(r#"{"name":"Rex \"the\" dog\\","type":"dög\n"}"#).unwrap();
    assert_eq!(body["name"], "Rex \"the\" dog\\");
    assert_eq!(body["type"], "dög\n");
}

#[test]
fn malformed_body_fails_in_response_stage_as_caller_fault() {
    let err = run_pair("{\"name\": ").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedPayload { .. }));
    assert_eq!(err.blame, Blame::Caller);
}

#[test]
fn response_stage_cannot_see_input() {
    let response = MappingTemplate::json("$input.body").unwrap();
    let mut ctx = request_context("{}");
    ctx.remove("input");
    let err = Interpreter.evaluate(&response, ctx).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnresolvedReference { .. }));
    assert_eq!(err.blame, Blame::Template);
}

#[test]
fn evaluations_do_not_share_context() {
    let template = MappingTemplate::json("#set($shared = $input.body)$shared").unwrap();
    let first = Interpreter.evaluate(&template, request_context("one")).unwrap();
    let second = Interpreter.evaluate(&template, request_context("two")).unwrap();
    assert_eq!(first.rendered, "one");
    assert_eq!(second.rendered, "two");
}

proptest! {
    #[test]
    fn directive_free_text_passes_through(text in "[^$#]*") {
        let template = MappingTemplate::text(text.clone()).unwrap();
        let out = Interpreter.evaluate(&template, EvaluationContext::new()).unwrap();
        prop_assert_eq!(out.rendered, text);
    }

    #[test]
    fn any_name_and_type_are_echoed(name in ".*", kind in ".*") {
        let body = json!({ "name": name, "type": kind }).to_string();
        let (_, out) = run_pair(&body).unwrap();
        prop_assert_eq!(&out["name"], &json!(name));
        prop_assert_eq!(&out["type"], &json!(kind));
        prop_assert_eq!(&out["createdAt"], &out["updatedAt"]);
    }
}
