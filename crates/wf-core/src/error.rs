use crate::args::ArgKey;
use thiserror::Error;

pub type WakeResult<T> = Result<T, WakeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WakeError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Missing model input: {key}")]
    MissingInput { key: ArgKey },

    #[error("Shape mismatch for {what}: {left:?} vs {right:?}")]
    ShapeMismatch {
        what: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },
}
