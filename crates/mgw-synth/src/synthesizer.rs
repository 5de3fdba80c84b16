//! # Response Synthesizer
//!
//! Runs one call end to end:
//!
//! 1. Authorize the bearer credential against the operation's required scopes.
//!    A denial stops here: no template is evaluated.
//! 2. Evaluate the request template for the body's media type.
//! 3. Read the designated status from its output (`statusCode`, default 200).
//! 4. Evaluate that status's integration-response template against the staged
//!    context.
//! 5. Attach the entry's fixed headers.
//!
//! Failures at any step become an error response carrying only the fixed
//! error headers. Nothing from a partially synthesized response is returned.

use mgw_auth::{AuthorizationGate, CredentialFault, Denied};
use mgw_core::HeaderSet;
use mgw_template::{EvaluatedValue, Interpreter, OutputMode, TemplateEngine};
use serde_json::{json, Value};

use crate::error::SynthesisError;
use crate::operation::{OperationSpec, RequestMapping};
use crate::request::RequestContext;
use crate::response::{ErrorBody, SynthesizedResponse};

/// Gate plus template engine, shared read-only across calls.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer<E = Interpreter> {
    engine: E,
    gate: AuthorizationGate,
    error_headers: HeaderSet,
}

impl ResponseSynthesizer<Interpreter> {
    pub fn new(gate: AuthorizationGate, error_headers: HeaderSet) -> Self {
        Self::with_engine(Interpreter, gate, error_headers)
    }
}

impl<E: TemplateEngine> ResponseSynthesizer<E> {
    pub fn with_engine(engine: E, gate: AuthorizationGate, error_headers: HeaderSet) -> Self {
        Self {
            engine,
            gate,
            error_headers,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Headers attached to every error outcome.
    pub fn error_headers(&self) -> &HeaderSet {
        &self.error_headers
    }

    /// Synthesize a response. Never fails: errors become error responses.
    pub fn synthesize(
        &self,
        op: &OperationSpec,
        ctx: &RequestContext,
        credential: Option<&str>,
    ) -> SynthesizedResponse {
        let response = match self.try_synthesize(op, ctx, credential) {
            Ok(response) => {
                tracing::debug!(
                    operation = %op.name,
                    request_id = %ctx.request_id,
                    status = response.status,
                    "response synthesized"
                );
                response
            }
            Err(err) => self.error_response(op, ctx, &err),
        };
        metrics::counter!(
            "mgw_requests_total",
            "operation" => op.name.clone(),
            "status" => response.status.to_string()
        )
        .increment(1);
        response
    }

    /// Synthesize a response, surfacing the failure instead of shaping it.
    pub fn try_synthesize(
        &self,
        op: &OperationSpec,
        ctx: &RequestContext,
        credential: Option<&str>,
    ) -> Result<SynthesizedResponse, SynthesisError> {
        let token = credential.ok_or_else(|| {
            tracing::warn!(reason = CredentialFault::Missing.label(), "credential rejected");
            Denied::InvalidCredential(CredentialFault::Missing)
        })?;
        let authorized = self.gate.authorize(token, &op.required_scopes)?;
        let credential = &authorized.credential;

        let content_type = ctx.content_type();
        let mapping = op
            .request_mapping(&content_type)
            .ok_or(SynthesisError::UnsupportedMediaType { content_type })?;

        let request_ctx = ctx.request_stage(op, credential);
        let (status, staged) = match mapping {
            RequestMapping::Template(template) => {
                let evaluated = self
                    .engine
                    .evaluate(template, request_ctx)
                    .map_err(SynthesisError::RequestMapping)?;
                (designated_status(&evaluated)?, evaluated.context)
            }
            RequestMapping::Passthrough => (200, request_ctx),
        };

        let entry = op
            .integration_response(status)
            .ok_or(SynthesisError::NoIntegrationResponse { status })?;
        let response_ctx = ctx.response_stage(op, credential, staged);
        let rendered = self
            .engine
            .evaluate(&entry.template, response_ctx)
            .map_err(SynthesisError::ResponseMapping)?;
        if entry.template.mode() == OutputMode::Json {
            rendered
                .parse_json()
                .map_err(SynthesisError::ResponseMapping)?;
        }

        Ok(SynthesizedResponse {
            status,
            content_type: entry.content_type.clone(),
            body: rendered.rendered,
            headers: entry.headers.clone(),
        })
    }

    /// Shape a failure into a response with the fixed error headers.
    pub fn error_response(
        &self,
        op: &OperationSpec,
        ctx: &RequestContext,
        err: &SynthesisError,
    ) -> SynthesizedResponse {
        let status = err.status();
        let mut headers = self.error_headers.clone();

        let body = match err {
            SynthesisError::Denied(denied) => {
                metrics::counter!("mgw_authorization_denied_total", "reason" => denied.label())
                    .increment(1);
                if let Err(e) = headers.insert("WWW-Authenticate", denied.www_authenticate()) {
                    tracing::error!(
                        operation = %op.name,
                        request_id = %ctx.request_id,
                        error = %e,
                        "challenge header rejected"
                    );
                }
                match denied {
                    Denied::InvalidCredential(fault) => {
                        ErrorBody::new(denied.code(), fault.to_string(), None)
                    }
                    Denied::InsufficientScope { required, .. } => ErrorBody::new(
                        denied.code(),
                        "the credential lacks a scope this operation requires",
                        Some(json!({ "required_scopes": required })),
                    ),
                }
            }
            SynthesisError::UnsupportedMediaType { content_type } => ErrorBody::new(
                err.code(),
                err.to_string(),
                Some(json!({ "content_type": content_type })),
            ),
            _ if status < 500 => {
                let (stage, e) = match err {
                    SynthesisError::RequestMapping(e) => ("request", e),
                    SynthesisError::ResponseMapping(e) => ("response", e),
                    _ => return self.internal(op, ctx, err, headers),
                };
                tracing::info!(
                    operation = %op.name,
                    request_id = %ctx.request_id,
                    stage,
                    error = %e,
                    "request rejected"
                );
                ErrorBody::new(
                    err.code(),
                    e.kind.to_string(),
                    Some(json!({
                        "stage": stage,
                        "line": e.position.line,
                        "column": e.position.column,
                    })),
                )
            }
            _ => return self.internal(op, ctx, err, headers),
        };

        SynthesizedResponse::error(status, &body, headers)
    }

    fn internal(
        &self,
        op: &OperationSpec,
        ctx: &RequestContext,
        err: &SynthesisError,
        headers: HeaderSet,
    ) -> SynthesizedResponse {
        tracing::error!(
            operation = %op.name,
            request_id = %ctx.request_id,
            error = %err,
            "synthesis failed"
        );
        SynthesizedResponse::error(500, &ErrorBody::internal(), headers)
    }
}

/// Status designated by the request stage's output.
fn designated_status(evaluated: &EvaluatedValue) -> Result<u16, SynthesisError> {
    if evaluated.rendered.trim().is_empty() {
        return Ok(200);
    }
    let output = evaluated
        .parse_json()
        .map_err(SynthesisError::RequestMapping)?;
    let code = match output.get("statusCode") {
        None | Some(Value::Null) => return Ok(200),
        Some(code) => code,
    };
    let status = match code {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    status
        .filter(|s| (100..=599).contains(s))
        .and_then(|s| u16::try_from(s).ok())
        .ok_or_else(|| SynthesisError::InvalidStatus {
            detail: format!("statusCode {code}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use jsonwebtoken::{encode, EncodingKey, Header};
    use mgw_auth::KeyStore;
    use mgw_core::{CanonicalScope, CorsPolicy, RequestId, RequestTime};
    use mgw_template::{EvaluationContext, MappingTemplate, TemplateError};

    use crate::operation::{IntegrationResponse, PassthroughBehavior};
    use crate::routing::{Method, ResourcePath};

    const SECRET: &[u8] = b"synth-test-secret";

    #[derive(Default)]
    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl TemplateEngine for CountingEngine {
        fn evaluate(
            &self,
            template: &MappingTemplate,
            context: EvaluationContext,
        ) -> Result<EvaluatedValue, TemplateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Interpreter.evaluate(template, context)
        }
    }

    fn cors() -> HeaderSet {
        CorsPolicy::default().headers().unwrap()
    }

    fn synthesizer() -> ResponseSynthesizer<CountingEngine> {
        let mut keys = KeyStore::new();
        keys.add_hmac(None, SECRET).unwrap();
        ResponseSynthesizer::with_engine(
            CountingEngine::default(),
            AuthorizationGate::new(keys),
            cors(),
        )
    }

    fn token(scope: &str, exp_offset: i64) -> String {
        let exp = jsonwebtoken::get_current_timestamp() as i64 + exp_offset;
        encode(
            &Header::default(),
            &json!({"sub": "user-1", "exp": exp, "scope": scope}),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    fn create_pet() -> OperationSpec {
        let request = MappingTemplate::json(
            "#set($context.requestOverride.path.body = $input.body)\n{\"statusCode\": 201}",
        )
        .unwrap();
        let response = MappingTemplate::json(
            "#set($parsed = $util.parseJson($context.requestOverride.path.body))\n\
             {\"id\": \"$context.requestId\", \"name\": \"$parsed.name\", \"type\": \"$parsed.type\", \
             \"createdAt\": $context.requestTimeEpoch, \"updatedAt\": $context.requestTimeEpoch}",
        )
        .unwrap();
        let mut headers = cors();
        headers.insert("X-Mock", "yes").unwrap();

        OperationSpec {
            name: "createPet".into(),
            method: Method::Post,
            resource: ResourcePath::parse("/pets").unwrap(),
            required_scopes: BTreeSet::from([CanonicalScope::granted("testResourceServer/test")]),
            passthrough: PassthroughBehavior::Never,
            request_templates: BTreeMap::from([("application/json".to_string(), request)]),
            integration_responses: BTreeMap::from([(
                201,
                IntegrationResponse {
                    status: 201,
                    content_type: "application/json".into(),
                    template: response,
                    headers,
                },
            )]),
            method_responses: BTreeMap::from([(201, BTreeSet::from(["X-Mock".to_string()]))]),
        }
    }

    fn call(body: &str) -> RequestContext {
        RequestContext::new(
            "POST",
            "/pets",
            RequestId::from_string("req-42"),
            RequestTime::from_epoch_millis(1_428_582_896_000).unwrap(),
        )
        .with_header("Content-Type", "application/json")
        .with_body(body)
    }

    #[test]
    fn creates_pet_with_echoed_fields() {
        let synth = synthesizer();
        let token = token("testResourceServer/test", 600);
        let response = synth.synthesize(
            &create_pet(),
            &call(r#"{"name":"A dog","type":"dog"}"#),
            Some(&token),
        );
        assert_eq!(response.status, 201);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body,
            json!({
                "id": "req-42",
                "name": "A dog",
                "type": "dog",
                "createdAt": 1_428_582_896_000_i64,
                "updatedAt": 1_428_582_896_000_i64,
            })
        );
        assert_eq!(response.headers.get("X-Mock"), Some("yes"));
        assert_eq!(response.headers.get("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(synth.engine().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_scope_is_forbidden_without_evaluation() {
        let synth = synthesizer();
        let token = token("otherServer/read", 600);
        let response = synth.synthesize(
            &create_pet(),
            &call(r#"{"name":"A dog","type":"dog"}"#),
            Some(&token),
        );
        assert_eq!(response.status, 403);
        assert_eq!(synth.engine().calls.load(Ordering::SeqCst), 0);

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(body.get("id").is_none());
        assert!(body.get("name").is_none());
        assert_eq!(
            body["error"]["details"]["required_scopes"],
            json!(["testResourceServer/test"])
        );
        assert!(!response.body.contains("otherServer/read"));
    }

    #[test]
    fn expired_or_missing_credential_is_unauthorized() {
        let synth = synthesizer();
        let expired = token("testResourceServer/test", -600);
        let err = synth
            .try_synthesize(&create_pet(), &call("{}"), Some(&expired))
            .unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::Denied(Denied::InvalidCredential(CredentialFault::Expired))
        ));

        let response = synth.synthesize(&create_pet(), &call("{}"), None);
        assert_eq!(response.status, 401);
        assert_eq!(response.headers.get("WWW-Authenticate"), Some("Bearer"));
        assert_eq!(synth.engine().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_body_is_bad_request_with_error_headers_only() {
        let synth = synthesizer();
        let token = token("testResourceServer/test", 600);
        let err = synth
            .try_synthesize(&create_pet(), &call("{\"name\": "), Some(&token))
            .unwrap_err();
        assert!(matches!(
            err.template_error().map(|e| &e.kind),
            Some(mgw_template::ErrorKind::MalformedPayload { .. })
        ));

        let response = synth.synthesize(&create_pet(), &call("{\"name\": "), Some(&token));
        assert_eq!(response.status, 400);
        assert_eq!(response.headers, cors());
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["error"]["code"], "MALFORMED_PAYLOAD");
    }

    #[test]
    fn unmatched_media_type_is_unsupported() {
        let synth = synthesizer();
        let token = token("testResourceServer/test", 600);
        let ctx = call("<pet/>").with_header("content-type", "application/xml");
        let response = synth.synthesize(&create_pet(), &ctx, Some(&token));
        assert_eq!(response.status, 415);
        assert_eq!(synth.engine().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn status_without_integration_response_is_internal() {
        let synth = synthesizer();
        let token = token("testResourceServer/test", 600);
        let mut op = create_pet();
        op.request_templates.insert(
            "application/json".into(),
            MappingTemplate::json(r#"{"statusCode": "404"}"#).unwrap(),
        );
        let response = synth.synthesize(&op, &call("{}"), Some(&token));
        assert_eq!(response.status, 500);
        assert_eq!(response.headers, cors());
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn every_outcome_carries_cors_headers() {
        let synth = synthesizer();
        let good = token("testResourceServer/test", 600);
        let weak = token("x/y", 600);
        let outcomes = [
            synth.synthesize(&create_pet(), &call(r#"{"name":"a","type":"b"}"#), Some(&good)),
            synth.synthesize(&create_pet(), &call("nope"), Some(&good)),
            synth.synthesize(&create_pet(), &call("{}"), Some(&weak)),
            synth.synthesize(&create_pet(), &call("{}"), None),
        ];
        let expected = cors();
        for response in outcomes {
            for (name, value) in expected.iter() {
                assert_eq!(response.headers.get(name), Some(value), "status {}", response.status);
            }
        }
    }

    fn evaluated(rendered: &str) -> EvaluatedValue {
        let template = MappingTemplate::json(rendered).unwrap();
        Interpreter.evaluate(&template, EvaluationContext::new()).unwrap()
    }

    #[test]
    fn designated_status_rules() {
        assert_eq!(designated_status(&evaluated("")).unwrap(), 200);
        assert_eq!(designated_status(&evaluated("{}")).unwrap(), 200);
        assert_eq!(designated_status(&evaluated(r#"{"statusCode": 201}"#)).unwrap(), 201);
        assert_eq!(designated_status(&evaluated(r#"{"statusCode": " 204 "}"#)).unwrap(), 204);
        assert!(matches!(
            designated_status(&evaluated(r#"{"statusCode": "abc"}"#)),
            Err(SynthesisError::InvalidStatus { .. })
        ));
        assert!(matches!(
            designated_status(&evaluated(r#"{"statusCode": 1000}"#)),
            Err(SynthesisError::InvalidStatus { .. })
        ));
    }
}
