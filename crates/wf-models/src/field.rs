//! Per-source evaluation and superposition over a set of upstream turbines.
//!
//! Each entry of `sources` is the input bundle of one upstream turbine. Sources
//! are evaluated independently on the rayon pool and combined afterwards.

use rayon::prelude::*;
use tracing::{debug, warn};
use wf_core::tensor::ensure_finite;
use wf_core::{ModelInputs, Tensor};

use crate::deficit::{BlockageDeficitModel, DeficitModel};
use crate::error::ModelResult;
use crate::superposition::{ConvectionTerms, SuperpositionModel};
use crate::turbulence::TurbulenceModel;

/// Combined wake deficit of all sources.
///
/// A convection-weighted superposition is fed the convection terms of the
/// model when it provides them. Their point deficits pass through the same
/// ground reflection, rotor averaging and yaw projection as
/// [`DeficitModel::evaluate`].
pub fn evaluate_deficit_field(
    model: &dyn DeficitModel,
    superposition: &dyn SuperpositionModel,
    sources: &[ModelInputs],
) -> ModelResult<Tensor> {
    debug!(
        model = model.name(),
        superposition = superposition.name(),
        sources = sources.len(),
        "evaluating deficit field"
    );
    if superposition.requires_convection() {
        match model.as_convection() {
            Some(convection) => {
                let terms = sources
                    .par_iter()
                    .map(|inputs| convection.evaluate_convection(inputs))
                    .collect::<ModelResult<Vec<ConvectionTerms>>>()?;
                let field = superposition.superpose_convection(&terms)?;
                ensure_finite(&field, "deficit field")?;
                return Ok(field);
            }
            None => warn!(
                model = model.name(),
                superposition = superposition.name(),
                "model has no convection terms, combining plain deficits"
            ),
        }
    }
    let deficits = sources
        .par_iter()
        .map(|inputs| model.evaluate(inputs))
        .collect::<ModelResult<Vec<_>>>()?;
    let field = superposition.superpose_deficit(&deficits)?;
    ensure_finite(&field, "deficit field")?;
    Ok(field)
}

/// Combined blockage deficit, superposed with the model's blockage superposition.
pub fn evaluate_blockage_field(
    model: &dyn BlockageDeficitModel,
    sources: &[ModelInputs],
) -> ModelResult<Tensor> {
    let superposition = model.blockage_superposition()?;
    debug!(
        model = model.name(),
        superposition = superposition.name(),
        sources = sources.len(),
        "evaluating blockage field"
    );
    let deficits = sources
        .par_iter()
        .map(|inputs| model.calc_blockage_deficit(inputs))
        .collect::<ModelResult<Vec<_>>>()?;
    let field = superposition.superpose_deficit(&deficits)?;
    ensure_finite(&field, "blockage field")?;
    Ok(field)
}

/// Effective turbulence intensity: ambient `ti` plus the added turbulence of
/// all sources.
pub fn evaluate_added_turbulence_field(
    model: &dyn TurbulenceModel,
    ti: &Tensor,
    sources: &[ModelInputs],
) -> ModelResult<Tensor> {
    debug!(
        model = model.name(),
        sources = sources.len(),
        "evaluating added turbulence field"
    );
    let added = sources
        .par_iter()
        .map(|inputs| model.evaluate(inputs))
        .collect::<ModelResult<Vec<_>>>()?;
    let effective = model.calc_effective_ti(ti, &added)?;
    ensure_finite(&effective, "effective turbulence intensity")?;
    Ok(effective)
}
