use tracing::trace;
use wf_core::{ArgKey, ArgSet, ModelInputs, Signature, Tensor, method_args};

use super::DeficitModel;
use crate::container::ConvectionFn;
use crate::context::Attachment;
use crate::error::{ModelError, ModelResult};
use crate::superposition::ConvectionTerms;

/// Deficit model for the wake downstream of a rotor.
pub trait WakeDeficitModel: DeficitModel {
    fn wake_radius_signature(&self) -> Signature {
        Signature::EMPTY
    }

    /// Wake radius at each field point. Models that do not define a wake
    /// boundary fail loudly rather than returning a guess.
    fn wake_radius(&self, _inputs: &ModelInputs) -> ModelResult<Tensor> {
        Err(ModelError::NotImplemented {
            what: "wake_radius",
            model: self.name().to_string(),
        })
    }
}

/// Wake model expressed through centreline deficit, convection velocity and
/// wake width, as required by convection-weighted superposition.
pub trait ConvectionDeficitModel: WakeDeficitModel {
    fn convection_signature(&self) -> Signature;

    fn calc_deficit_convection(&self, inputs: &ModelInputs) -> ModelResult<ConvectionTerms>;

    /// Convection terms in the downwind frame, projected by `cos(yaw)` like
    /// [`DeficitModel::calc_deficit_downwind`].
    fn calc_deficit_convection_downwind(
        &self,
        inputs: &ModelInputs,
    ) -> ModelResult<ConvectionTerms> {
        let yaw = inputs.get(ArgKey::YawIlk)?;
        let terms = self.calc_deficit_convection(inputs)?;
        if yaw.iter().all(|&y| y == 0.0) {
            return Ok(terms);
        }
        terms.scaled(&yaw.mapv(|y| y.to_radians().cos()))
    }

    /// Convection terms whose point deficit went through ground reflection and
    /// rotor averaging, matching [`DeficitModel::evaluate`].
    fn evaluate_convection(&self, inputs: &ModelInputs) -> ModelResult<ConvectionTerms> {
        trace!(model = self.name(), "evaluating convection terms");
        inputs.require(&self.args4deficit())?;
        let physics: ConvectionFn<'_> =
            Box::new(|inputs: &ModelInputs| self.calc_deficit_convection_downwind(inputs));
        self.base().container().wrap_convection(physics)(inputs)
    }

    /// Inputs of [`ConvectionDeficitModel::calc_deficit_convection`] when the
    /// farm combines wakes with a convection-weighted rule, else nothing.
    fn weighted_superposition_args(&self) -> ArgSet {
        match self.base().container().attachment() {
            Attachment::Standalone => {
                trace!(
                    model = self.name(),
                    "standalone convection model, weighted superposition arguments skipped"
                );
                ArgSet::new()
            }
            Attachment::Attached(ctx) if ctx.superposition().requires_convection() => {
                method_args(self.convection_signature())
            }
            Attachment::Attached(_) => ArgSet::new(),
        }
    }
}
