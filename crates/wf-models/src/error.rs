//! Error types for model evaluation.

use thiserror::Error;
use wf_core::WakeError;

/// Errors that can occur while composing or evaluating physics models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A required computation was called on a model that never provided it.
    #[error("{what} not implemented for {model}")]
    NotImplemented { what: &'static str, model: String },

    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// A model needs farm-wide defaults but was never attached to a farm context.
    #[error("{model} needs {what} but is not attached to a farm context")]
    Detached { model: String, what: &'static str },

    #[error(transparent)]
    Core(#[from] WakeError),
}

pub type ModelResult<T> = Result<T, ModelError>;
