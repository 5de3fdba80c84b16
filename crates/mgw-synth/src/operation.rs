//! # Operations
//!
//! An [`OperationSpec`] is the compiled, immutable form of one configured
//! operation: route, required scopes, request templates keyed by media type,
//! and integration responses keyed by status code.

use std::collections::{BTreeMap, BTreeSet};

use mgw_core::{CanonicalScope, HeaderSet};
use mgw_template::MappingTemplate;
use serde::{Deserialize, Serialize};

use crate::routing::{Method, ResourcePath};

/// What happens when no request template matches the body's media type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughBehavior {
    /// Reject with 415.
    #[default]
    Never,
    /// Use the `application/json` template; without one, skip request mapping.
    WhenNoMatch,
}

/// Response mapping for one synthetic status code.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationResponse {
    pub status: u16,
    pub content_type: String,
    pub template: MappingTemplate,
    /// Fixed headers, CORS headers included.
    pub headers: HeaderSet,
}

/// How the request stage is run for a given body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestMapping<'a> {
    Template(&'a MappingTemplate),
    /// No template applies; the request context passes through unchanged.
    Passthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub name: String,
    pub method: Method,
    pub resource: ResourcePath,
    pub required_scopes: BTreeSet<CanonicalScope>,
    pub passthrough: PassthroughBehavior,
    /// Keyed by lower-cased media type.
    pub request_templates: BTreeMap<String, MappingTemplate>,
    pub integration_responses: BTreeMap<u16, IntegrationResponse>,
    /// Header names each method response declares.
    pub method_responses: BTreeMap<u16, BTreeSet<String>>,
}

impl OperationSpec {
    /// Pick the request template for a media type. `None` means 415.
    pub fn request_mapping(&self, content_type: &str) -> Option<RequestMapping<'_>> {
        if let Some(template) = self.request_templates.get(content_type) {
            return Some(RequestMapping::Template(template));
        }
        match self.passthrough {
            PassthroughBehavior::Never => None,
            PassthroughBehavior::WhenNoMatch => Some(
                self.request_templates
                    .get("application/json")
                    .map_or(RequestMapping::Passthrough, RequestMapping::Template),
            ),
        }
    }

    pub fn integration_response(&self, status: u16) -> Option<&IntegrationResponse> {
        self.integration_responses.get(&status)
    }
}
