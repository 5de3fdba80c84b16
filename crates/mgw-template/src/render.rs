//! Output rendering.
//!
//! In [`OutputMode::Json`] the renderer follows the template's own literal
//! text to know whether it is inside a JSON string. Substituted values never
//! change that state.

use serde_json::Value;

use crate::template::OutputMode;

pub(crate) struct Renderer {
    mode: OutputMode,
    out: String,
    in_string: bool,
    escaped: bool,
    caller_unquoted: bool,
}

impl Renderer {
    pub(crate) fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            out: String::new(),
            in_string: false,
            escaped: false,
            caller_unquoted: false,
        }
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.out.push_str(text);
        if self.mode != OutputMode::Json {
            return;
        }
        for c in text.chars() {
            if self.escaped {
                self.escaped = false;
            } else if self.in_string && c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = !self.in_string;
            }
        }
    }

    /// Substitute `value`. `from_caller` marks values derived from caller input.
    pub(crate) fn push_value(&mut self, value: &Value, from_caller: bool) {
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if self.mode == OutputMode::Json && self.in_string {
            let quoted = Value::String(raw).to_string();
            self.out.push_str(&quoted[1..quoted.len() - 1]);
        } else {
            if from_caller && self.mode == OutputMode::Json {
                self.caller_unquoted = true;
            }
            self.out.push_str(&raw);
        }
    }

    /// Whether caller-derived text was written outside a JSON string literal.
    pub(crate) fn caller_unquoted(&self) -> bool {
        self.caller_unquoted
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
