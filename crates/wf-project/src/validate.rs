//! Configuration validation logic.

use serde_json::Value;

use crate::build::build_models;
use crate::registry::{self, ModelCategory};
use crate::schema::{ModelSpec, WakeConfig};
use crate::{ProjectError, ProjectResult};
use wf_models::ModelConfig;

/// Accept `spec` for the argument `arg` only if it is a configured instance of
/// a model in `category`.
pub fn check_model<'a>(
    spec: &'a ModelSpec,
    category: ModelCategory,
    arg: &str,
) -> ProjectResult<&'a ModelConfig> {
    let expected = category.type_name();
    match spec {
        ModelSpec::Instance(cfg) => {
            if registry::find(&cfg.model, category).is_some() {
                return Ok(cfg);
            }
            if registry::lookup(&cfg.model).next().is_some() {
                return Err(ProjectError::InvalidModel {
                    arg: arg.to_string(),
                    expected,
                    actual: cfg.model.clone(),
                });
            }
            Err(ProjectError::UnknownModel {
                name: cfg.model.clone(),
            })
        }
        ModelSpec::TypeRef(name) => {
            if registry::find(name, category).is_some() {
                return Err(ProjectError::NotAnInstance {
                    arg: arg.to_string(),
                    expected,
                    name: name.clone(),
                });
            }
            if registry::lookup(name).next().is_some() {
                return Err(ProjectError::InvalidModel {
                    arg: arg.to_string(),
                    expected,
                    actual: "type".to_string(),
                });
            }
            Err(ProjectError::UnknownModel { name: name.clone() })
        }
    }
}

/// [`check_model`] for a nested model given as a raw parameter value.
pub fn check_value(value: &Value, category: ModelCategory, arg: &str) -> ProjectResult<ModelConfig> {
    let spec: ModelSpec = serde_json::from_value(value.clone())?;
    check_model(&spec, category, arg).cloned()
}

/// A configuration is valid when every model it names can be built and the
/// models fit together.
pub fn validate_config(config: &WakeConfig) -> ProjectResult<()> {
    build_models(config).map(|_| ())
}
