//! # Gateway Configuration
//!
//! One YAML document describes the whole gateway:
//!
//! ```yaml
//! cors: {}                      # optional, permissive defaults
//! auth:
//!   issuer: https://idp.example.com
//!   keys:
//!     - secret_env: MGW_JWT_SECRET
//! resource_servers:
//!   - identifier: testResourceServer
//!     scopes:
//!       - name: test
//! operations:
//!   - name: createPet
//!     method: POST
//!     path: /pets
//!     required_scopes:
//!       - { resource_server: testResourceServer, scope: test }
//!     request_templates:
//!       application/json: |
//!         #set($context.requestOverride.path.body = $input.body)
//!         {"statusCode": 201}
//!     integration_responses:
//!       201:
//!         content_type: application/json
//!         template: |
//!           {"id": "$context.requestId"}
//!     method_responses:
//!       201: []
//! ```
//!
//! Status codes are YAML integers, not quoted strings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mgw_auth::GateConfig;
use mgw_core::{CorsPolicy, HeaderSet};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::operation::PassthroughBehavior;
use crate::routing::Method;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default)]
    pub cors: CorsPolicy,
    pub auth: GateConfig,
    pub resource_servers: Vec<ResourceServerConfig>,
    pub operations: Vec<OperationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceServerConfig {
    pub identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    pub scopes: Vec<ScopeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reference to a registered scope.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeRef {
    pub resource_server: String,
    pub scope: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationConfig {
    pub name: String,
    pub method: Method,
    pub path: String,
    pub required_scopes: Vec<ScopeRef>,
    #[serde(default)]
    pub passthrough_behavior: PassthroughBehavior,
    #[serde(default)]
    pub request_templates: BTreeMap<String, String>,
    pub integration_responses: BTreeMap<u16, IntegrationResponseConfig>,
    #[serde(default)]
    pub method_responses: BTreeMap<u16, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationResponseConfig {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub template: String,
    #[serde(default)]
    pub headers: HeaderSet,
}

fn default_content_type() -> String {
    "application/json".to_string()
}

impl GatewayConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_yaml(&content, path)
    }

    /// Parse YAML text. `origin` names the source in errors.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::YamlParse {
            path: PathBuf::from(origin),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
auth:
  keys:
    - secret: dev
resource_servers:
  - identifier: testResourceServer
    scopes:
      - name: test
        description: testing123
operations:
  - name: createPet
    method: POST
    path: /pets
    required_scopes:
      - resource_server: testResourceServer
        scope: test
    request_templates:
      application/json: '{"statusCode": 201}'
    integration_responses:
      201:
        template: '{}'
    method_responses:
      201: []
"#;

    #[test]
    fn parses_minimal_config() {
        let config = GatewayConfig::from_yaml(MINIMAL, Path::new("inline.yaml")).unwrap();
        assert_eq!(config.cors, CorsPolicy::default());
        assert_eq!(config.operations[0].method, Method::Post);
        assert_eq!(
            config.operations[0].passthrough_behavior,
            PassthroughBehavior::Never
        );
        let entry = &config.operations[0].integration_responses[&201];
        assert_eq!(entry.content_type, "application/json");
        assert!(entry.headers.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = MINIMAL.replace("    method: POST", "    method: POST\n    verb: POST");
        assert!(matches!(
            GatewayConfig::from_yaml(&text, Path::new("inline.yaml")),
            Err(ConfigError::YamlParse { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = GatewayConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
