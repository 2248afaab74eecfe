//! Raw: opaque JSON, edited as text.
//!
//! The catch-all node: unknown `condition_type`s, payloads that do not fit a
//! known kind's grammar, and explicit "(edit as JSON)" selections all end up
//! here and are re-emitted exactly as held.

use serde_json::{json, Value};

/// Opaque JSON payload with an editable text rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    data: Value,
    text: String,
    pending: bool,
}

impl Default for Raw {
    fn default() -> Self {
        Self::from_value(json!({ "condition_type": "..." }))
    }
}

impl Raw {
    /// Hold `data` verbatim.
    #[must_use]
    pub fn from_value(data: Value) -> Self {
        Self {
            text: render(&data),
            data,
            pending: false,
        }
    }

    /// The committed payload.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Replace the committed payload and its text.
    pub fn set_data(&mut self, data: Value) {
        self.text = render(&data);
        self.data = data;
        self.pending = false;
    }

    /// Editable text (pretty-printed JSON unless the operator changed it).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Parsed on the next validation.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.pending = true;
    }

    pub(crate) fn check(&mut self) -> Result<(), String> {
        if !self.pending {
            return Ok(());
        }
        let data = serde_json::from_str(&self.text).map_err(|e| format!("Unparseable JSON: {e}"))?;
        self.data = data;
        self.pending = false;
        Ok(())
    }

    /// The payload, unchanged.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        self.data.clone()
    }
}

fn render(data: &Value) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
}
