//! Wake-deflection models: shift the wake centreline of yawed or tilted rotors.

mod jimenez;

pub use jimenez::JimenezWakeDeflection;

use std::fmt;

use wf_core::tensor::hypot;
use wf_core::{ArgKey, ArgSet, ModelInputs, Signature, Tensor, method_args};

use crate::config::ModelConfig;
use crate::error::ModelResult;

/// Distances from the deflected wake centreline to the field points.
#[derive(Clone, Debug, PartialEq)]
pub struct Deflected {
    pub dw: Tensor,
    pub hcw: Tensor,
    pub dh: Tensor,
}

impl Deflected {
    /// Copy of `inputs` with the deflected distances and the matching `cw`.
    pub fn apply(self, inputs: &ModelInputs) -> ModelResult<ModelInputs> {
        let cw = hypot(&self.hcw, &self.dh)?;
        Ok(inputs.overriding([
            (ArgKey::DwIjlk, self.dw),
            (ArgKey::HcwIjlk, self.hcw),
            (ArgKey::DhIjlk, self.dh),
            (ArgKey::CwIjlk, cw),
        ]))
    }
}

pub trait DeflectionModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Declared parameters of [`DeflectionModel::calc_deflection`].
    fn deflection_signature(&self) -> Signature;

    fn calc_deflection(&self, inputs: &ModelInputs) -> ModelResult<Deflected>;

    fn args4deflection(&self) -> ArgSet {
        method_args(self.deflection_signature())
    }

    fn evaluate(&self, inputs: &ModelInputs) -> ModelResult<Deflected> {
        inputs.require(&self.args4deflection())?;
        self.calc_deflection(inputs)
    }

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name())
    }
}
