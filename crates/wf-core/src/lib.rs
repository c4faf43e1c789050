//! wf-core: stable foundation for wakeflow.
//!
//! Contains:
//! - numeric (Real + domain guards)
//! - tensor (rank-4 `(i, j, l, k)` tensors + broadcasting helpers)
//! - args (named physical quantities, argument sets, declared signatures)
//! - inputs (named-input bundle handed to every model call)
//! - error (shared error types)

pub mod args;
pub mod error;
pub mod inputs;
pub mod numeric;
pub mod tensor;

// Re-exports: nice ergonomics for downstream crates
pub use args::{ArgKey, ArgSet, Param, Signature, method_args};
pub use error::{WakeError, WakeResult};
pub use inputs::{ModelInputs, PointInputs};
pub use numeric::*;
pub use tensor::Tensor;
