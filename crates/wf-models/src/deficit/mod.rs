//! Velocity-deficit models.
//!
//! All deficit models share one calling convention ([`DeficitModel::evaluate`])
//! and refine it by category:
//! - [`BlockageDeficitModel`]: induction ahead of the rotor
//! - [`WakeDeficitModel`]: downstream wake with a wake radius
//! - [`ConvectionDeficitModel`]: wake expressed through centreline deficit,
//!   convection velocity and wake width
//!
//! Category membership is exposed through the `as_*` capability checks rather
//! than through type hierarchies.

mod blockage;
mod gaussian;
mod noj;
mod self_similarity;
mod wake;

pub use blockage::{BlockageDeficitModel, BlockageSettings, ROTOR_POSITION};
pub use gaussian::BastankhahGaussianDeficit;
pub use noj::NojDeficit;
pub use self_similarity::SelfSimilarityDeficit;
pub use wake::{ConvectionDeficitModel, WakeDeficitModel};

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use wf_core::tensor::map2;
use wf_core::{ArgKey, ArgSet, ModelInputs, Param, Signature, Tensor, method_args};

use crate::config::ModelConfig;
use crate::container::{EvalFn, LayoutFn, ModelContainer};
use crate::context::FarmContext;
use crate::error::ModelResult;
use crate::ground::GroundModel;
use crate::rotor_avg::RotorAvgModel;

/// Parameters of [`DeficitModel::calc_deficit_downwind`].
pub const CALC_DEFICIT_DOWNWIND: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::YawIlk),
    Param::Variadic,
]);

/// State shared by every deficit model: sub-model composition plus the two
/// input selectors.
#[derive(Debug)]
pub struct DeficitBase {
    container: ModelContainer,
    use_effective_ws: bool,
    use_effective_ti: bool,
}

impl Default for DeficitBase {
    fn default() -> Self {
        Self {
            container: ModelContainer::default(),
            use_effective_ws: true,
            use_effective_ti: false,
        }
    }
}

impl DeficitBase {
    pub fn new(
        rotor_avg: Option<Box<dyn RotorAvgModel>>,
        ground: Option<Box<dyn GroundModel>>,
        use_effective_ws: bool,
        use_effective_ti: bool,
    ) -> Self {
        Self {
            container: ModelContainer::new(rotor_avg, ground),
            use_effective_ws,
            use_effective_ti,
        }
    }

    pub fn with_rotor_avg(mut self, model: Box<dyn RotorAvgModel>) -> Self {
        self.container.set_rotor_avg(Some(model));
        self
    }

    pub fn with_ground(mut self, model: Box<dyn GroundModel>) -> Self {
        self.container.set_ground(Some(model));
        self
    }

    pub fn with_effective_ws(mut self, use_effective_ws: bool) -> Self {
        self.use_effective_ws = use_effective_ws;
        self
    }

    pub fn with_effective_ti(mut self, use_effective_ti: bool) -> Self {
        self.use_effective_ti = use_effective_ti;
        self
    }

    pub fn container(&self) -> &ModelContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut ModelContainer {
        &mut self.container
    }

    /// Wind speed the physics is evaluated with.
    pub fn ws_key(&self) -> ArgKey {
        ArgKey::wind_speed(self.use_effective_ws)
    }

    /// Turbulence intensity the physics is evaluated with.
    pub fn ti_key(&self) -> ArgKey {
        ArgKey::turbulence_intensity(self.use_effective_ti)
    }

    pub fn additional_args(&self) -> ArgSet {
        ArgSet::from([self.ws_key(), self.ti_key()])
    }

    /// Append the shared constructor parameters to a model's configuration.
    pub fn describe(&self, cfg: ModelConfig) -> ModelConfig {
        cfg.with("use_effective_ws", self.use_effective_ws)
            .with("use_effective_ti", self.use_effective_ti)
            .with_model(
                "rotor_avg_model",
                self.container.rotor_avg().map(|m| m.config()),
            )
            .with_model("ground_model", self.container.ground().map(|m| m.config()))
    }
}

/// Velocity deficit caused by one upstream turbine at a set of points.
pub trait DeficitModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn base(&self) -> &DeficitBase;

    fn base_mut(&mut self) -> &mut DeficitBase;

    /// Declared parameters of [`DeficitModel::calc_deficit`].
    fn deficit_signature(&self) -> Signature;

    /// Deficit of sources `i` at points `j` for all directions and speeds.
    fn calc_deficit(&self, inputs: &ModelInputs) -> ModelResult<Tensor>;

    fn downwind_signature(&self) -> Signature {
        CALC_DEFICIT_DOWNWIND
    }

    /// Deficit in the downwind frame. Yawed rotors project their deficit by
    /// `cos(yaw)`; unyawed inputs return `calc_deficit` unchanged.
    fn calc_deficit_downwind(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let yaw = inputs.get(ArgKey::YawIlk)?;
        let deficit = self.calc_deficit(inputs)?;
        if yaw.iter().all(|&y| y == 0.0) {
            return Ok(deficit);
        }
        Ok(map2(&deficit, yaw, |d, y| d * y.to_radians().cos())?)
    }

    /// Declared parameters of [`DeficitModel::compute_layout_terms`].
    fn layout_signature(&self) -> Signature {
        Signature::EMPTY
    }

    /// Compute and cache terms that only depend on the layout.
    fn compute_layout_terms(&self, _inputs: &ModelInputs) -> ModelResult<()> {
        Ok(())
    }

    /// Drop cached layout terms.
    fn invalidate_layout(&self) {}

    /// Every quantity a call to [`DeficitModel::evaluate`] may read.
    fn args4deficit(&self) -> ArgSet {
        let base = self.base();
        let mut args = base.container().args4model();
        args |= method_args(self.deficit_signature());
        args |= method_args(self.downwind_signature());
        args |= method_args(self.layout_signature());
        if let Some(wake) = self.as_wake() {
            args |= method_args(wake.wake_radius_signature());
        }
        if let Some(convection) = self.as_convection() {
            args |= convection.weighted_superposition_args();
        }
        args |= base.additional_args();
        args
    }

    /// Deficit contribution through ground reflection and rotor averaging.
    fn evaluate(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        trace!(model = self.name(), "evaluating deficit");
        inputs.require(&self.args4deficit())?;
        let physics: EvalFn<'_> =
            Box::new(|inputs: &ModelInputs| self.calc_deficit_downwind(inputs));
        self.base().container().wrap(physics)(inputs)
    }

    fn calc_layout_terms(&self, inputs: &ModelInputs) -> ModelResult<()> {
        let layout: LayoutFn<'_> =
            Box::new(|inputs: &ModelInputs| self.compute_layout_terms(inputs));
        self.base().container().wrap_layout(layout)(inputs)
    }

    fn attach(&mut self, ctx: &Arc<FarmContext>) {
        self.base_mut().container_mut().attach(ctx);
    }

    /// Zero outside a hard-edged wake radius.
    fn is_top_hat(&self) -> bool {
        false
    }

    fn as_wake(&self) -> Option<&dyn WakeDeficitModel> {
        None
    }

    fn as_blockage(&self) -> Option<&dyn BlockageDeficitModel> {
        None
    }

    fn as_convection(&self) -> Option<&dyn ConvectionDeficitModel> {
        None
    }

    fn config(&self) -> ModelConfig;
}
