//! # Resource Paths
//!
//! Resource paths are written the way they are declared on the gateway:
//! `/pets`, `/pets/{id}`, `/files/{proxy+}`. A `{name+}` segment is greedy and
//! must be last; it matches one or more remaining segments.
//!
//! Captured segments are percent-decoded; literal segments compare against
//! the raw request path.
//!
//! When several resource paths match, the one with more literal segments
//! wins, then the one without a greedy segment.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// HTTP method an operation answers to. `ANY` matches every method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Any,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Any => "ANY",
        }
    }

    /// Whether a request with `method` is answered by this operation.
    pub fn accepts(&self, method: &str) -> bool {
        *self == Self::Any || self.as_str().eq_ignore_ascii_case(method)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Greedy(String),
}

/// A parsed resource path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    template: String,
    segments: Vec<Segment>,
}

impl ResourcePath {
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidResourcePath {
            path: template.to_string(),
            reason: reason.to_string(),
        };
        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        let parts: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
        for (index, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(inner) => {
                    let (name, greedy) = match inner.strip_suffix('+') {
                        Some(name) => (name, true),
                        None => (inner, false),
                    };
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        return Err(invalid("parameter names must be alphanumeric"));
                    }
                    if segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(n) | Segment::Greedy(n) if n == name))
                    {
                        return Err(invalid("duplicate parameter name"));
                    }
                    if greedy {
                        if index + 1 != parts.len() {
                            return Err(invalid("a greedy parameter must be the last segment"));
                        }
                        Segment::Greedy(name.to_string())
                    } else {
                        Segment::Param(name.to_string())
                    }
                }
                None => {
                    if part.contains(['{', '}']) {
                        return Err(invalid("braces must enclose a whole segment"));
                    }
                    Segment::Literal(part.to_string())
                }
            };
            segments.push(segment);
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The template as declared, e.g. `/pets/{id}`.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Match a request path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = BTreeMap::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if parts.get(index) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), decode_segment(parts.get(index)?));
                }
                Segment::Greedy(name) => {
                    if index >= parts.len() {
                        return None;
                    }
                    let rest: Vec<String> = parts[index..].iter().map(|p| decode_segment(p)).collect();
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }

    /// Ordering key: more literals first, then non-greedy first.
    pub(crate) fn specificity(&self) -> (usize, bool) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        let exact = !matches!(self.segments.last(), Some(Segment::Greedy(_)));
        (literals, exact)
    }

    /// Whether two templates describe the same resource.
    pub(crate) fn same_shape(&self, other: &ResourcePath) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Param(_), Segment::Param(_)) => true,
                (Segment::Greedy(_), Segment::Greedy(_)) => true,
                _ => false,
            })
    }
}

/// Percent-decode one captured segment. Segments that do not decode to
/// UTF-8 are kept raw.
fn decode_segment(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(t: &str) -> ResourcePath {
        ResourcePath::parse(t).unwrap()
    }

    #[test]
    fn literal_paths() {
        let pets = path("/pets");
        assert!(pets.matches("/pets").unwrap().is_empty());
        assert!(pets.matches("/pets/").is_some());
        assert!(pets.matches("/pets/1").is_none());
        assert!(pets.matches("/dogs").is_none());
        assert!(path("/").matches("/").is_some());
    }

    #[test]
    fn captures_parameters() {
        let params = path("/pets/{id}/toys/{toy}").matches("/pets/7/toys/ball").unwrap();
        assert_eq!(params["id"], "7");
        assert_eq!(params["toy"], "ball");
    }

    #[test]
    fn greedy_matches_remaining_segments() {
        let files = path("/files/{proxy+}");
        assert_eq!(files.matches("/files/a/b/c.txt").unwrap()["proxy"], "a/b/c.txt");
        assert!(files.matches("/files").is_none());
    }

    #[test]
    fn captured_segments_are_percent_decoded() {
        let pets = path("/pets/{id}");
        assert_eq!(pets.matches("/pets/a%20b").unwrap()["id"], "a b");
        assert_eq!(pets.matches("/pets/caf%C3%A9").unwrap()["id"], "caf\u{e9}");
        assert_eq!(pets.matches("/pets/%FF").unwrap()["id"], "%FF");

        let files = path("/files/{proxy+}");
        assert_eq!(
            files.matches("/files/my%20docs/a%2Bb.txt").unwrap()["proxy"],
            "my docs/a+b.txt"
        );
        assert!(path("/my%20pets").matches("/my%20pets").is_some());
    }

    #[test]
    fn display_honours_width() {
        assert_eq!(format!("[{:<6}]", Method::Get), "[GET   ]");
        assert_eq!(format!("[{:<8}]", path("/pets")), "[/pets   ]");
    }

    #[test]
    fn rejects_malformed_templates() {
        for bad in ["pets", "/pets/{}", "/a/{x+}/b", "/a/{x}/{x}", "/a/b{c}", "/a/{b-c}"] {
            assert!(ResourcePath::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn specificity_prefers_literals() {
        assert!(path("/pets/mine").specificity() > path("/pets/{id}").specificity());
        assert!(path("/pets/{id}").specificity() > path("/pets/{proxy+}").specificity());
    }

    #[test]
    fn same_shape_ignores_parameter_names() {
        assert!(path("/pets/{id}").same_shape(&path("/pets/{petId}")));
        assert!(!path("/pets/{id}").same_shape(&path("/pets/mine")));
    }

    #[test]
    fn any_accepts_every_method() {
        assert!(Method::Any.accepts("DELETE"));
        assert!(Method::Post.accepts("post"));
        assert!(!Method::Get.accepts("POST"));
    }
}
