use std::sync::Arc;

use wf_core::tensor::{map2, map4};
use wf_core::{ArgKey, ModelInputs, Real, Tensor, floor_positive};

use super::DeficitModel;
use crate::container::EvalFn;
use crate::error::{ModelError, ModelResult};
use crate::superposition::SuperpositionModel;

/// Downwind distance at or beyond which a point counts as being at or behind
/// the rotor plane.
pub const ROTOR_POSITION: Real = -1e-10;

/// Options common to all blockage models.
#[derive(Debug, Clone)]
pub struct BlockageSettings {
    /// Keep only the induction ahead of the rotor.
    pub upstream_only: bool,
    /// Normalised downwind distance below which [`BlockageDeficitModel::remove_wake`] keeps values.
    pub limiter: Real,
    /// Superposition of blockage contributions; the farm default when `None`.
    pub superposition: Option<Arc<dyn SuperpositionModel>>,
}

impl Default for BlockageSettings {
    fn default() -> Self {
        Self {
            upstream_only: false,
            limiter: 1e-10,
            superposition: None,
        }
    }
}

/// Deficit model for the induction zone upstream of a rotor.
pub trait BlockageDeficitModel: DeficitModel {
    fn blockage(&self) -> &BlockageSettings;

    /// Blockage deficit through the container. With `upstream_only` every
    /// point with `dw >= -1e-10` is exactly zero.
    fn calc_blockage_deficit(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        inputs.require(&self.args4deficit())?;
        let physics: EvalFn<'_> = Box::new(|inputs: &ModelInputs| self.calc_deficit(inputs));
        let deficit = self.base().container().wrap(physics)(inputs)?;
        if !self.blockage().upstream_only {
            return Ok(deficit);
        }
        let dw = inputs.get(ArgKey::DwIjlk)?;
        Ok(map2(&deficit, dw, |d, dw| if dw < ROTOR_POSITION { d } else { 0.0 })?)
    }

    /// Zero the deficit inside the rotor-sized cylinder behind the rotor, where
    /// a wake model takes over.
    fn remove_wake(
        &self,
        deficit: &Tensor,
        dw: &Tensor,
        cw: &Tensor,
        d_src: &Tensor,
    ) -> ModelResult<Tensor> {
        let limiter = self.blockage().limiter;
        Ok(map4(deficit, dw, cw, d_src, |d, dw, cw, diameter| {
            let r = diameter / 2.0;
            if dw / floor_positive(r) >= -limiter && cw.abs() <= r {
                0.0
            } else {
                d
            }
        })?)
    }

    /// Own superposition model, else the farm default once attached.
    fn blockage_superposition(&self) -> ModelResult<Arc<dyn SuperpositionModel>> {
        if let Some(own) = &self.blockage().superposition {
            return Ok(Arc::clone(own));
        }
        self.base()
            .container()
            .context()
            .map(|ctx| Arc::clone(ctx.superposition()))
            .ok_or_else(|| ModelError::Detached {
                model: self.name().to_string(),
                what: "a blockage superposition model",
            })
    }
}
