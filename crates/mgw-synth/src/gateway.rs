//! # Gateway
//!
//! The immutable, fully validated result of loading configuration: scope
//! registry, compiled operations, CORS headers, and the synthesizer. Built
//! once at startup and shared behind an `Arc`.
//!
//! ## Load-time checks
//!
//! - Scopes are registered once (`DuplicateScope`), and every required scope
//!   resolves through the registry (`UnknownScope`).
//! - Every template parses.
//! - Every integration response has a method response, and every non-CORS
//!   fixed header is declared in it.
//! - CORS headers are merged into every integration response. An entry that
//!   sets one of them to a different value is rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use mgw_auth::{AuthorizationGate, ScopeRegistry};
use mgw_core::{CorsPolicy, HeaderSet};
use mgw_template::{Interpreter, MappingTemplate, OutputMode, TemplateEngine};

use crate::config::{GatewayConfig, OperationConfig};
use crate::error::ConfigError;
use crate::operation::{IntegrationResponse, OperationSpec};
use crate::request::RequestContext;
use crate::response::SynthesizedResponse;
use crate::routing::{Method, ResourcePath};
use crate::synthesizer::ResponseSynthesizer;

/// Outcome of matching a request against configured operations.
#[derive(Debug)]
pub enum Route<'a> {
    Matched {
        operation: &'a OperationSpec,
        params: BTreeMap<String, String>,
    },
    /// The resource exists but no operation answers this method.
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

#[derive(Debug)]
pub struct Gateway<E = Interpreter> {
    registry: ScopeRegistry,
    operations: Vec<OperationSpec>,
    cors_headers: HeaderSet,
    synthesizer: ResponseSynthesizer<E>,
}

impl Gateway<Interpreter> {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = GatewayConfig::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_config(config, base_dir)
    }

    /// Validate parsed configuration. Relative key paths resolve against `base_dir`.
    pub fn from_config(config: GatewayConfig, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut registry = ScopeRegistry::new();
        for server in &config.resource_servers {
            for scope in &server.scopes {
                registry.register(&server.identifier, &scope.name)?;
            }
        }

        let cors_headers = config.cors.headers()?;
        let gate = AuthorizationGate::from_config(&config.auth, base_dir)?;

        let mut operations: Vec<OperationSpec> = Vec::with_capacity(config.operations.len());
        for op_config in &config.operations {
            let op = compile_operation(op_config, &registry, &cors_headers)?;
            if operations.iter().any(|o| o.name == op.name) {
                return Err(ConfigError::DuplicateOperation(op.name));
            }
            if let Some(existing) = operations
                .iter()
                .find(|o| o.method == op.method && o.resource.same_shape(&op.resource))
            {
                return Err(ConfigError::DuplicateRoute {
                    first: existing.name.clone(),
                    second: op.name,
                    method: op.method.to_string(),
                    path: op.resource.to_string(),
                });
            }
            operations.push(op);
        }

        tracing::info!(
            operations = operations.len(),
            scopes = registry.len(),
            "gateway configuration loaded"
        );

        Ok(Self {
            registry,
            operations,
            synthesizer: ResponseSynthesizer::new(gate, cors_headers.clone()),
            cors_headers,
        })
    }
}

impl<E: TemplateEngine> Gateway<E> {
    /// Swap the template engine, keeping everything else.
    pub fn with_engine<F: TemplateEngine>(self, engine: F) -> Gateway<F> {
        let gate = self.synthesizer.gate().clone();
        Gateway {
            registry: self.registry,
            operations: self.operations,
            synthesizer: ResponseSynthesizer::with_engine(engine, gate, self.cors_headers.clone()),
            cors_headers: self.cors_headers,
        }
    }

    pub fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }

    /// The three fixed CORS headers.
    pub fn cors_headers(&self) -> &HeaderSet {
        &self.cors_headers
    }

    pub fn synthesizer(&self) -> &ResponseSynthesizer<E> {
        &self.synthesizer
    }

    /// Find the operation answering `method path`.
    pub fn route(&self, method: &str, path: &str) -> Route<'_> {
        let matched: Vec<(&OperationSpec, BTreeMap<String, String>)> = self
            .operations
            .iter()
            .filter_map(|op| op.resource.matches(path).map(|params| (op, params)))
            .collect();

        let Some(best) = matched.iter().map(|(op, _)| op.resource.specificity()).max() else {
            return Route::NotFound;
        };
        let mut candidates: Vec<_> = matched
            .into_iter()
            .filter(|(op, _)| op.resource.specificity() == best)
            .collect();

        let exact = candidates
            .iter()
            .position(|(op, _)| op.method != Method::Any && op.method.accepts(method));
        let any = candidates.iter().position(|(op, _)| op.method == Method::Any);
        match exact.or(any) {
            Some(index) => {
                let (operation, params) = candidates.swap_remove(index);
                Route::Matched { operation, params }
            }
            None => Route::MethodNotAllowed {
                allowed: candidates.iter().map(|(op, _)| op.method).collect(),
            },
        }
    }

    /// Whether any operation is declared on a resource matching `path`.
    pub fn resource_exists(&self, path: &str) -> bool {
        self.operations
            .iter()
            .any(|op| op.resource.matches(path).is_some())
    }

    pub fn synthesize(
        &self,
        op: &OperationSpec,
        ctx: &RequestContext,
        credential: Option<&str>,
    ) -> SynthesizedResponse {
        self.synthesizer.synthesize(op, ctx, credential)
    }
}

fn compile_operation(
    config: &OperationConfig,
    registry: &ScopeRegistry,
    cors_headers: &HeaderSet,
) -> Result<OperationSpec, ConfigError> {
    let name = config.name.clone();
    let template_error = |which: String| {
        let operation = name.clone();
        move |source| ConfigError::Template {
            operation,
            which,
            source,
        }
    };

    let resource = ResourcePath::parse(&config.path)?;

    if config.required_scopes.is_empty() {
        return Err(ConfigError::NoRequiredScopes { operation: name });
    }
    let required_scopes = config
        .required_scopes
        .iter()
        .map(|r| registry.canonical(&r.resource_server, &r.scope))
        .collect::<Result<BTreeSet<_>, _>>()?;

    let mut request_templates = BTreeMap::new();
    for (media_type, source) in &config.request_templates {
        let media_type = media_type.trim().to_ascii_lowercase();
        let template = MappingTemplate::json(source.as_str())
            .map_err(template_error(format!("request template {media_type}")))?;
        request_templates.insert(media_type, template);
    }

    let mut method_responses = BTreeMap::new();
    for (status, headers) in &config.method_responses {
        check_status(&name, *status)?;
        let declared: BTreeSet<String> = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        method_responses.insert(*status, declared);
    }

    if config.integration_responses.is_empty() {
        return Err(ConfigError::NoIntegrationResponses { operation: name });
    }
    let mut integration_responses = BTreeMap::new();
    for (status, entry) in &config.integration_responses {
        let status = *status;
        check_status(&name, status)?;
        let declared = method_responses
            .get(&status)
            .ok_or_else(|| ConfigError::MissingMethodResponse {
                operation: name.clone(),
                status,
            })?;

        for (header, value) in entry.headers.iter() {
            if CorsPolicy::is_cors_header(header) {
                if cors_headers.get(header) != Some(value) {
                    return Err(ConfigError::CorsConflict {
                        operation: name.clone(),
                        status,
                        header: header.to_string(),
                    });
                }
            } else if !declared.contains(&header.to_ascii_lowercase()) {
                return Err(ConfigError::UndeclaredResponseHeader {
                    operation: name.clone(),
                    status,
                    header: header.to_string(),
                });
            }
        }

        let mut headers = cors_headers.clone();
        headers.extend_from(&entry.headers);
        let template = MappingTemplate::parse(
            entry.template.as_str(),
            OutputMode::for_content_type(&entry.content_type),
        )
        .map_err(template_error(format!("integration response {status}")))?;

        integration_responses.insert(
            status,
            IntegrationResponse {
                status,
                content_type: entry.content_type.clone(),
                template,
                headers,
            },
        );
    }

    Ok(OperationSpec {
        name,
        method: config.method,
        resource,
        required_scopes,
        passthrough: config.passthrough_behavior,
        request_templates,
        integration_responses,
        method_responses,
    })
}

fn check_status(operation: &str, status: u16) -> Result<(), ConfigError> {
    if (100..=599).contains(&status) {
        Ok(())
    } else {
        Err(ConfigError::InvalidStatus {
            operation: operation.to_string(),
            status,
        })
    }
}
