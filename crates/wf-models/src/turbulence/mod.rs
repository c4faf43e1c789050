//! Added-turbulence models.

mod crespo;

pub use crespo::CrespoHernandez;

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use wf_core::{ArgSet, ModelInputs, Signature, Tensor, method_args};

use crate::config::ModelConfig;
use crate::container::{EvalFn, ModelContainer};
use crate::context::FarmContext;
use crate::error::ModelResult;
use crate::superposition::AddedTurbulenceSuperposition;

/// Turbulence intensity added by one upstream turbine.
pub trait TurbulenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn container(&self) -> &ModelContainer;

    fn container_mut(&mut self) -> &mut ModelContainer;

    /// Declared parameters of [`TurbulenceModel::calc_added_turbulence`].
    fn added_turbulence_signature(&self) -> Signature;

    fn calc_added_turbulence(&self, inputs: &ModelInputs) -> ModelResult<Tensor>;

    /// Rule combining the added turbulence of several sources with the ambient level.
    fn superposition(&self) -> &dyn AddedTurbulenceSuperposition;

    fn args4addturb(&self) -> ArgSet {
        let mut args = self.container().args4model();
        args |= method_args(self.added_turbulence_signature());
        args
    }

    fn evaluate(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        trace!(model = self.name(), "evaluating added turbulence");
        inputs.require(&self.args4addturb())?;
        let physics: EvalFn<'_> =
            Box::new(|inputs: &ModelInputs| self.calc_added_turbulence(inputs));
        self.container().wrap(physics)(inputs)
    }

    fn calc_effective_ti(&self, ti: &Tensor, added: &[Tensor]) -> ModelResult<Tensor> {
        self.superposition().calc_effective_ti(ti, added)
    }

    fn attach(&mut self, ctx: &Arc<FarmContext>) {
        self.container_mut().attach(ctx);
    }

    fn is_top_hat(&self) -> bool {
        false
    }

    fn config(&self) -> ModelConfig;
}
