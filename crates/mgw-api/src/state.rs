//! # Application State
//!
//! Shared state for the Axum application, passed to every handler via the
//! `State` extractor. Everything in it is read-only after startup.

use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use mgw_synth::Gateway;

/// Process configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Path of the gateway YAML file (`MGW_CONFIG`).
    pub config_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("MGW_CONFIG must name the gateway configuration file")]
    MissingConfigPath,
    #[error("PORT must be an integer in 1..=65535, got {0:?}")]
    InvalidPort(String),
}

impl AppConfig {
    /// Read `MGW_CONFIG` and `PORT` (default 8080).
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EnvError> {
        let config_path = lookup("MGW_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(EnvError::MissingConfigPath)?;
        let port = match lookup("PORT") {
            None => 8080,
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(EnvError::InvalidPort(raw))?,
        };
        Ok(Self { port, config_path })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    /// Present when the Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_port() {
        let config = AppConfig::from_lookup(lookup(&[("MGW_CONFIG", "gw.yaml")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.config_path, PathBuf::from("gw.yaml"));
    }

    #[test]
    fn config_path_is_required() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("PORT", "9000")])),
            Err(EnvError::MissingConfigPath)
        ));
    }

    #[test]
    fn rejects_bad_port() {
        for bad in ["0", "http", "70000"] {
            assert!(matches!(
                AppConfig::from_lookup(lookup(&[("MGW_CONFIG", "gw.yaml"), ("PORT", bad)])),
                Err(EnvError::InvalidPort(_))
            ));
        }
    }
}
