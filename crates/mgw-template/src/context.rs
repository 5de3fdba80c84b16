//! # Evaluation Context
//!
//! A name → value mapping visible to one evaluation pass. Each evaluation
//! owns its context: `#set` mutates it in place and the final state is handed
//! back with the rendered output, so a downstream stage can read what an
//! upstream stage staged.
//!
//! ## Provenance
//!
//! The context remembers which paths hold caller-derived data. A slot inserted
//! with [`EvaluationContext::insert_caller`] is caller-derived, and so is
//! anything copied or parsed out of it by `#set`. A failed lookup whose
//! deepest resolved prefix lies inside a caller-derived path is blamed on the
//! caller.

use serde_json::{Map, Value};

use crate::ast::Path;
use crate::error::Blame;

/// Where a value came from, relative to the path it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    /// The whole value is caller-derived.
    pub whole: bool,
    /// Caller-derived sub-paths, relative to the value's root.
    pub nested: Vec<Vec<String>>,
}

impl Provenance {
    /// Value written by the template itself or by trusted configuration.
    pub fn template() -> Self {
        Self::default()
    }

    /// Value supplied by the caller.
    pub fn caller() -> Self {
        Self {
            whole: true,
            nested: Vec::new(),
        }
    }
}

/// A lookup that did not resolve to a non-null value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unresolved {
    /// Blame for the missing value.
    pub blame: Blame,
}

/// `#set` could not write its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignError {
    /// The intermediate path that holds a non-object value.
    pub blocked_at: String,
}

/// Isolated evaluation context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    slots: Map<String, Value>,
    caller_paths: Vec<Vec<String>>,
}

impl EvaluationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object. No slot is marked caller-derived.
    pub fn from_map(slots: Map<String, Value>) -> Self {
        Self {
            slots,
            caller_paths: Vec::new(),
        }
    }

    /// Insert a trusted top-level slot, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.caller_paths.retain(|p| p[0] != name);
        self.slots.insert(name, value);
    }

    /// Insert a caller-derived top-level slot, replacing any previous value.
    pub fn insert_caller(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.caller_paths.retain(|p| p[0] != name);
        self.caller_paths.push(vec![name.clone()]);
        self.slots.insert(name, value);
    }

    /// Write trusted `fields` into the top-level object `name`.
    ///
    /// Other fields already in the object are kept. A non-object slot is
    /// replaced by a fresh object.
    pub fn overlay(&mut self, name: &str, fields: Map<String, Value>) {
        let slot = self
            .slots
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
            self.caller_paths.retain(|p| p[0] != name);
        }
        if let Value::Object(object) = slot {
            for (field, value) in fields {
                self.caller_paths
                    .retain(|p| !(p[0] == name && p.get(1) == Some(&field)));
                object.insert(field, value);
            }
        }
    }

    /// Remove a top-level slot and any provenance beneath it.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.caller_paths.retain(|p| p[0] != name);
        self.slots.remove(name)
    }

    /// Borrow a top-level slot.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Read the value at `path` without provenance, treating null as absent.
    pub fn value_at(&self, path: &Path) -> Option<&Value> {
        self.lookup(path).ok().map(|(v, _)| v)
    }

    /// Whether the value at `path` is caller-derived.
    pub fn is_caller_derived(&self, path: &Path) -> bool {
        self.covered(path.segments())
    }

    /// All top-level slots.
    pub fn slots(&self) -> &Map<String, Value> {
        &self.slots
    }

    /// Consume the context, returning the slot map.
    pub fn into_slots(self) -> Map<String, Value> {
        self.slots
    }

    /// Resolve `path`, returning the value and its provenance.
    pub fn lookup(&self, path: &Path) -> Result<(&Value, Provenance), Unresolved> {
        let segments = path.segments();
        let mut current = self.slots.get(&segments[0]).ok_or(Unresolved {
            blame: Blame::Template,
        })?;

        for (depth, segment) in segments.iter().enumerate().skip(1) {
            current = current
                .as_object()
                .and_then(|obj| obj.get(segment))
                .ok_or_else(|| self.unresolved_at(&segments[..depth]))?;
        }

        if current.is_null() {
            return Err(self.unresolved_at(&segments[..segments.len() - 1]));
        }

        let whole = self.covered(segments);
        let nested = if whole {
            Vec::new()
        } else {
            self.caller_paths
                .iter()
                .filter(|p| p.len() > segments.len() && p.starts_with(segments))
                .map(|p| p[segments.len()..].to_vec())
                .collect()
        };
        Ok((current, Provenance { whole, nested }))
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    pub fn assign(
        &mut self,
        path: &Path,
        value: Value,
        provenance: Provenance,
    ) -> Result<(), AssignError> {
        let segments = path.segments();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        let mut map = &mut self.slots;
        for (depth, segment) in parents.iter().enumerate() {
            let slot = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            map = match slot {
                Value::Object(inner) => inner,
                _ => {
                    return Err(AssignError {
                        blocked_at: segments[..=depth].join("."),
                    })
                }
            };
        }
        map.insert(last.clone(), value);

        self.caller_paths.retain(|p| !p.starts_with(segments));
        if provenance.whole {
            self.caller_paths.push(segments.to_vec());
        } else {
            for relative in provenance.nested {
                let mut absolute = segments.to_vec();
                absolute.extend(relative);
                self.caller_paths.push(absolute);
            }
        }
        Ok(())
    }

    fn covered(&self, segments: &[String]) -> bool {
        self.caller_paths.iter().any(|p| segments.starts_with(p))
    }

    fn unresolved_at(&self, resolved: &[String]) -> Unresolved {
        let blame = if self.covered(resolved) {
            Blame::Caller
        } else {
            Blame::Template
        };
        Unresolved { blame }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> Path {
        Path::parse(p).unwrap()
    }

    fn sample() -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        ctx.insert_caller("input", json!({"body": "{\"name\":\"A dog\"}", "headers": {}}));
        ctx.insert("context", json!({"requestId": "abc", "requestTimeEpoch": 1000}));
        ctx
    }

    #[test]
    fn lookup_resolves_nested_paths() {
        let ctx = sample();
        let (value, prov) = ctx.lookup(&path("context.requestId")).unwrap();
        assert_eq!(value, &json!("abc"));
        assert!(!prov.whole);
    }

    #[test]
    fn caller_slots_are_tracked() {
        let ctx = sample();
        let (_, prov) = ctx.lookup(&path("input.body")).unwrap();
        assert!(prov.whole);
        assert!(ctx.is_caller_derived(&path("input.headers")));
        assert!(!ctx.is_caller_derived(&path("context")));
    }

    #[test]
    fn missing_under_caller_slot_blames_caller() {
        let ctx = sample();
        let err = ctx.lookup(&path("input.querystring.page")).unwrap_err();
        assert_eq!(err.blame, Blame::Caller);
    }

    #[test]
    fn missing_under_trusted_slot_blames_template() {
        let ctx = sample();
        assert_eq!(
            ctx.lookup(&path("context.nope")).unwrap_err().blame,
            Blame::Template
        );
        assert_eq!(
            ctx.lookup(&path("absent")).unwrap_err().blame,
            Blame::Template
        );
    }

    #[test]
    fn null_is_unresolved() {
        let mut ctx = EvaluationContext::new();
        ctx.insert("a", json!({"b": null}));
        assert!(ctx.lookup(&path("a.b")).is_err());
        assert!(ctx.value_at(&path("a")).is_some());
    }

    #[test]
    fn assign_creates_intermediate_objects() {
        let mut ctx = sample();
        ctx.assign(
            &path("context.requestOverride.path.body"),
            json!("raw"),
            Provenance::caller(),
        )
        .unwrap();
        assert_eq!(
            ctx.value_at(&path("context.requestOverride.path.body")),
            Some(&json!("raw"))
        );
        assert!(ctx.is_caller_derived(&path("context.requestOverride.path.body")));
        assert!(!ctx.is_caller_derived(&path("context.requestId")));
    }

    #[test]
    fn assign_through_scalar_fails() {
        let mut ctx = sample();
        let err = ctx
            .assign(&path("context.requestId.inner"), json!(1), Provenance::template())
            .unwrap_err();
        assert_eq!(err.blocked_at, "context.requestId");
    }

    #[test]
    fn overwrite_with_template_value_clears_caller_mark() {
        let mut ctx = sample();
        ctx.assign(&path("staged"), json!("x"), Provenance::caller())
            .unwrap();
        ctx.assign(&path("staged"), json!("y"), Provenance::template())
            .unwrap();
        assert!(!ctx.is_caller_derived(&path("staged")));
    }

    #[test]
    fn nested_provenance_is_rebased_on_copy() {
        let mut ctx = sample();
        ctx.assign(&path("context.staged"), json!("x"), Provenance::caller())
            .unwrap();
        let (value, prov) = ctx.lookup(&path("context")).unwrap();
        let value = value.clone();
        assert_eq!(prov.nested, vec![vec!["staged".to_string()]]);
        ctx.assign(&path("copy"), value, prov).unwrap();
        assert!(ctx.is_caller_derived(&path("copy.staged")));
        assert!(!ctx.is_caller_derived(&path("copy.requestId")));
    }

    #[test]
    fn overlay_keeps_staged_fields() {
        let mut ctx = sample();
        ctx.assign(&path("context.requestId"), json!("forged"), Provenance::caller())
            .unwrap();
        ctx.assign(&path("context.staged"), json!("x"), Provenance::caller())
            .unwrap();
        let mut fields = Map::new();
        fields.insert("requestId".into(), json!("abc"));
        ctx.overlay("context", fields);
        assert_eq!(ctx.value_at(&path("context.requestId")), Some(&json!("abc")));
        assert!(!ctx.is_caller_derived(&path("context.requestId")));
        assert!(ctx.is_caller_derived(&path("context.staged")));
    }

    #[test]
    fn overlay_replaces_non_objects() {
        let mut ctx = EvaluationContext::new();
        ctx.insert("context", json!("scalar"));
        let mut fields = Map::new();
        fields.insert("requestId".into(), json!("abc"));
        ctx.overlay("context", fields);
        assert_eq!(ctx.get("context"), Some(&json!({"requestId": "abc"})));
    }

    #[test]
    fn remove_drops_provenance() {
        let mut ctx = sample();
        ctx.remove("input");
        assert!(ctx.get("input").is_none());
        assert!(!ctx.is_caller_derived(&path("input")));
    }
}
