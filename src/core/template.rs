use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Named slots handed to the rendering collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateContext {
    slots: BTreeMap<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `slot`, replacing any previous binding.
    pub fn assign(&mut self, slot: &str, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::warn!(slot, error = %e, "Template value not serializable");
            Value::Null
        });
        self.slots.insert(slot.to_string(), value);
    }

    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.slots.get(slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}
