//! # Request Context
//!
//! The observable data of one inbound call plus the metadata the transport
//! minted for it. Built once per call and never mutated by synthesis.
//!
//! ## Evaluation slots
//!
//! | Slot                                | Stage            | Origin  |
//! |-------------------------------------|------------------|---------|
//! | `input.body`                        | request          | caller  |
//! | `input.headers` (lower-cased)       | request          | caller  |
//! | `input.querystring`                 | request          | caller  |
//! | `input.path`                        | request          | caller  |
//! | `context.requestId`                 | request+response | gateway |
//! | `context.requestTimeEpoch` (ms)     | request+response | gateway |
//! | `context.requestTime` (CLF)         | request+response | gateway |
//! | `context.httpMethod`                | request+response | gateway |
//! | `context.resourcePath`, `.path`     | request+response | gateway |
//! | `context.operationName`             | request+response | gateway |
//! | `context.authorizer.claims.*`       | request+response | gateway |

use std::collections::BTreeMap;

use mgw_auth::Credential;
use mgw_core::{RequestId, RequestTime};
use mgw_template::EvaluationContext;
use serde_json::{Map, Value};

use crate::operation::OperationSpec;

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// One inbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub path_params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: String,
    pub request_id: RequestId,
    pub request_time: RequestTime,
}

impl RequestContext {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        request_id: RequestId,
        request_time: RequestTime,
    ) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            path_params: BTreeMap::new(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body: String::new(),
            request_id,
            request_time,
        }
    }

    /// Add a header. Names are stored lower-cased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_path_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Media type of the body, lower-cased, without parameters.
    /// Defaults to `application/json`.
    pub fn content_type(&self) -> String {
        self.headers
            .get("content-type")
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
    }

    /// Context for the request-mapping stage.
    pub(crate) fn request_stage(
        &self,
        op: &OperationSpec,
        credential: &Credential,
    ) -> EvaluationContext {
        let headers: Map<String, Value> = self
            .headers
            .iter()
            .filter(|(name, _)| name.as_str() != "authorization")
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let mut input = Map::new();
        input.insert("body".into(), Value::String(self.body.clone()));
        input.insert("headers".into(), Value::Object(headers));
        input.insert("querystring".into(), string_map(&self.query));
        input.insert("path".into(), string_map(&self.path_params));

        let mut ctx = EvaluationContext::new();
        ctx.insert_caller("input", Value::Object(input));
        ctx.overlay("context", self.metadata(op, credential));
        ctx
    }

    /// Context for the response-mapping stage: the request stage's final
    /// context without `input`, with metadata re-asserted.
    pub(crate) fn response_stage(
        &self,
        op: &OperationSpec,
        credential: &Credential,
        mut staged: EvaluationContext,
    ) -> EvaluationContext {
        staged.remove("input");
        staged.overlay("context", self.metadata(op, credential));
        staged
    }

    fn metadata(&self, op: &OperationSpec, credential: &Credential) -> Map<String, Value> {
        let mut authorizer = Map::new();
        authorizer.insert("claims".into(), Value::Object(credential.claims().clone()));

        let mut meta = Map::new();
        meta.insert(
            "requestId".into(),
            Value::String(self.request_id.as_str().to_string()),
        );
        meta.insert(
            "requestTimeEpoch".into(),
            Value::from(self.request_time.epoch_millis()),
        );
        meta.insert("requestTime".into(), Value::String(self.request_time.clf()));
        meta.insert("httpMethod".into(), Value::String(self.method.clone()));
        meta.insert(
            "resourcePath".into(),
            Value::String(op.resource.as_str().to_string()),
        );
        meta.insert("path".into(), Value::String(self.path.clone()));
        meta.insert("operationName".into(), Value::String(op.name.clone()));
        meta.insert("authorizer".into(), Value::Object(authorizer));
        meta
    }
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
