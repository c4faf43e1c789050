//! Serializable description of a configured model.
//!
//! A model's serialized form is its constructor parameters only. Derived state
//! such as cached layout terms never appears here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            params: Map::new(),
        }
    }

    /// Builder-style parameter insert.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Insert an optional nested model; `None` serializes as `null`.
    pub fn with_model(mut self, name: &str, model: Option<ModelConfig>) -> Self {
        let value = match model {
            Some(cfg) => cfg.into_value(),
            None => Value::Null,
        };
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn into_value(self) -> Value {
        let mut obj = Map::new();
        obj.insert("model".into(), Value::String(self.model));
        if !self.params.is_empty() {
            obj.insert("params".into(), Value::Object(self.params));
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_models_serialize_inline() {
        let cfg = ModelConfig::new("NOJDeficit")
            .with("k", 0.1)
            .with_model("rotor_avg_model", Some(ModelConfig::new("RotorCenter")))
            .with_model("ground_model", None);
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["params"]["rotor_avg_model"]["model"], "RotorCenter");
        assert!(json["params"]["ground_model"].is_null());
        let back: ModelConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, cfg);
    }
}
