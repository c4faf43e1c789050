//! wf-project: wake-model configuration files, model registry and validation.

pub mod build;
pub mod registry;
pub mod schema;
pub mod validate;

pub use build::{FarmModels, build_models};
pub use registry::{ModelCategory, ModelEntry};
pub use schema::*;
pub use validate::{check_model, validate_config};

use wf_models::ModelError;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Argument, {arg}, must be a {expected} instance, but is a {actual} instance")]
    InvalidModel {
        arg: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Argument, {arg}, must be a {expected} instance. Did you forget the brackets: {name}()")]
    NotAnInstance {
        arg: String,
        expected: &'static str,
        name: String,
    },

    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    #[error("Invalid parameter {model}.{param}: {reason}")]
    InvalidParam {
        model: String,
        param: String,
        reason: String,
    },

    #[error("Incompatible models: {what}")]
    Incompatible { what: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<WakeConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: WakeConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_yaml(path: &std::path::Path, config: &WakeConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<WakeConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: WakeConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_json(path: &std::path::Path, config: &WakeConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
