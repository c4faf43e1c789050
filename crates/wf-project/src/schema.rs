//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use wf_models::ModelConfig;

/// One model slot of a configuration.
///
/// A map `{ model: Name, params: {...} }` describes a configured instance. A
/// bare `Name` only names the model type and is rejected during validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ModelSpec {
    Instance(ModelConfig),
    TypeRef(String),
}

impl ModelSpec {
    pub fn instance(model: impl Into<String>) -> Self {
        ModelSpec::Instance(ModelConfig::new(model))
    }

    pub fn name(&self) -> &str {
        match self {
            ModelSpec::Instance(cfg) => &cfg.model,
            ModelSpec::TypeRef(name) => name,
        }
    }
}

impl From<ModelConfig> for ModelSpec {
    fn from(cfg: ModelConfig) -> Self {
        ModelSpec::Instance(cfg)
    }
}

/// Model selection of an engineering wind-farm model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WakeConfig {
    pub name: String,
    /// Farm default superposition; `LinearSum` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superposition_model: Option<ModelSpec>,
    pub wake_deficit_model: ModelSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockage_deficit_model: Option<ModelSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turbulence_model: Option<ModelSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deflection_model: Option<ModelSpec>,
}

impl WakeConfig {
    pub fn new(name: impl Into<String>, wake_deficit_model: impl Into<ModelSpec>) -> Self {
        Self {
            name: name.into(),
            superposition_model: None,
            wake_deficit_model: wake_deficit_model.into(),
            blockage_deficit_model: None,
            turbulence_model: None,
            deflection_model: None,
        }
    }
}
