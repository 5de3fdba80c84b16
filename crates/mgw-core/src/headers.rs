//! # Fixed Response Headers
//!
//! `HeaderSet` is an insertion-ordered, case-insensitive map of header name to
//! literal value. `CorsPolicy` produces the three cross-origin headers that
//! every outcome carries, success or failure.

use http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::HeaderError;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";

/// Ordered set of fixed headers. Names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "std::collections::BTreeMap<String, String>")]
#[serde(try_from = "std::collections::BTreeMap<String, String>")]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header, validating name and value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HeaderError> {
        let name = name.into();
        let value = value.into();
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(HeaderError::InvalidName(name));
        }
        if HeaderValue::from_str(&value).is_err() {
            return Err(HeaderError::InvalidValue { name });
        }
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
        Ok(())
    }

    /// Look up a header value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a header with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every header of `other` into `self`, replacing same-named entries.
    pub fn extend_from(&mut self, other: &HeaderSet) {
        for (name, value) in &other.entries {
            match self
                .entries
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(slot) => slot.1 = value.clone(),
                None => self.entries.push((name.clone(), value.clone())),
            }
        }
    }
}

impl From<HeaderSet> for std::collections::BTreeMap<String, String> {
    fn from(set: HeaderSet) -> Self {
        set.entries.into_iter().collect()
    }
}

impl TryFrom<std::collections::BTreeMap<String, String>> for HeaderSet {
    type Error = HeaderError;

    fn try_from(map: std::collections::BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let mut set = HeaderSet::new();
        for (name, value) in map {
            set.insert(name, value)?;
        }
        Ok(set)
    }
}

/// Permissive cross-origin policy applied to every outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CorsPolicy {
    /// Value of `Access-Control-Allow-Origin`.
    pub allow_origin: String,
    /// Joined with `,` into `Access-Control-Allow-Methods`.
    pub allow_methods: Vec<String>,
    /// Joined with `,` into `Access-Control-Allow-Headers`.
    pub allow_headers: Vec<String>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: ["OPTIONS", "GET", "PUT", "POST", "DELETE", "PATCH", "HEAD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allow_headers: [
                "Content-Type",
                "X-Amz-Date",
                "Authorization",
                "X-Api-Key",
                "X-Amz-Security-Token",
                "X-Amz-User-Agent",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl CorsPolicy {
    /// The three fixed cross-origin headers.
    pub fn headers(&self) -> Result<HeaderSet, HeaderError> {
        let mut set = HeaderSet::new();
        set.insert(ALLOW_METHODS, self.allow_methods.join(","))?;
        set.insert(ALLOW_HEADERS, self.allow_headers.join(","))?;
        set.insert(ALLOW_ORIGIN, self.allow_origin.clone())?;
        Ok(set)
    }

    /// Whether `name` is one of the headers this policy owns.
    pub fn is_cors_header(name: &str) -> bool {
        [ALLOW_ORIGIN, ALLOW_METHODS, ALLOW_HEADERS]
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}
