use std::sync::Arc;

use wf_core::tensor::map3;
use wf_core::{
    ArgKey, ModelInputs, Param, Real, Signature, Tensor, floor_positive, induction_factor,
};

use super::{BlockageDeficitModel, BlockageSettings, DeficitBase, DeficitModel};
use crate::config::ModelConfig;
use crate::error::ModelResult;
use crate::superposition::SuperpositionModel;

const DEFICIT_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::DwIjlk),
    Param::Key(ArgKey::CwIjlk),
    Param::Key(ArgKey::CtIlk),
    Param::Variadic,
]);

/// Self-similar induction zone of Troldborg & Meyer Forsting (2017).
///
/// Axial decay `1 + x / sqrt(1 + x²)` with `x = dw/R`, radial shape
/// `sech(β·cw / (R·r½))^α` with half-width `r½ = sqrt(λ (η + x²))`.
#[derive(Debug)]
pub struct SelfSimilarityDeficit {
    pub ss_gamma: Real,
    pub ss_lambda: Real,
    pub ss_eta: Real,
    pub ss_alpha: Real,
    pub ss_beta: Real,
    /// Zero the rotor-sized cylinder behind the rotor.
    pub exclude_wake: bool,
    blockage: BlockageSettings,
    base: DeficitBase,
}

impl Default for SelfSimilarityDeficit {
    fn default() -> Self {
        Self {
            ss_gamma: 1.1,
            ss_lambda: 0.587,
            ss_eta: 1.32,
            ss_alpha: 8.0 / 9.0,
            ss_beta: std::f64::consts::SQRT_2,
            exclude_wake: true,
            blockage: BlockageSettings::default(),
            base: DeficitBase::default(),
        }
    }
}

impl SelfSimilarityDeficit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: DeficitBase) -> Self {
        self.base = base;
        self
    }

    pub fn upstream_only(mut self, upstream_only: bool) -> Self {
        self.blockage.upstream_only = upstream_only;
        self
    }

    pub fn with_limiter(mut self, limiter: Real) -> Self {
        self.blockage.limiter = limiter;
        self
    }

    pub fn with_superposition(mut self, superposition: Arc<dyn SuperpositionModel>) -> Self {
        self.blockage.superposition = Some(superposition);
        self
    }

    pub fn exclude_wake(mut self, exclude_wake: bool) -> Self {
        self.exclude_wake = exclude_wake;
        self
    }

    fn centreline_induction(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let ct = inputs.get(ArgKey::CtIlk)?;
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let gamma = self.ss_gamma;
        Ok(map3(ct, dw, d_src, |ct, dw, d| {
            let x = dw / floor_positive(d / 2.0);
            gamma * induction_factor(ct) * (1.0 + x / (1.0 + x * x).sqrt())
        })?)
    }

    fn radial_shape(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let cw = inputs.get(ArgKey::CwIjlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let (lambda, eta, alpha, beta) = (self.ss_lambda, self.ss_eta, self.ss_alpha, self.ss_beta);
        Ok(map3(dw, cw, d_src, |dw, cw, d| {
            let r = floor_positive(d / 2.0);
            let x = dw / r;
            let half_width = (lambda * (eta + x * x)).sqrt();
            (1.0 / (beta * cw / (r * half_width)).cosh()).powf(alpha)
        })?)
    }
}

impl DeficitModel for SelfSimilarityDeficit {
    fn name(&self) -> &str {
        "SelfSimilarityDeficit"
    }

    fn base(&self) -> &DeficitBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DeficitBase {
        &mut self.base
    }

    fn deficit_signature(&self) -> Signature {
        DEFICIT_SIG
    }

    fn calc_deficit(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let ws = inputs.get(self.base.ws_key())?;
        let induction = self.centreline_induction(inputs)?;
        let shape = self.radial_shape(inputs)?;
        let deficit = map3(ws, &induction, &shape, |ws, a, f| ws * a * f)?;
        if !self.exclude_wake {
            return Ok(deficit);
        }
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let cw = inputs.get(ArgKey::CwIjlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        self.remove_wake(&deficit, dw, cw, d_src)
    }

    fn as_blockage(&self) -> Option<&dyn BlockageDeficitModel> {
        Some(self)
    }

    fn config(&self) -> ModelConfig {
        let cfg = ModelConfig::new(self.name())
            .with("ss_gamma", self.ss_gamma)
            .with("ss_lambda", self.ss_lambda)
            .with("ss_eta", self.ss_eta)
            .with("ss_alpha", self.ss_alpha)
            .with("ss_beta", self.ss_beta)
            .with("exclude_wake", self.exclude_wake)
            .with("upstream_only", self.blockage.upstream_only)
            .with("limiter", self.blockage.limiter)
            .with_model(
                "superposition_model",
                self.blockage.superposition.as_ref().map(|s| s.config()),
            );
        self.base.describe(cfg)
    }
}

impl BlockageDeficitModel for SelfSimilarityDeficit {
    fn blockage(&self) -> &BlockageSettings {
        &self.blockage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FarmContext;
    use crate::error::ModelError;
    use crate::superposition::{LinearSum, SquaredSum};
    use wf_core::PointInputs;

    fn point(dw: Real, hcw: Real) -> ModelInputs {
        PointInputs {
            dw,
            hcw,
            ..PointInputs::default()
        }
        .into_inputs()
    }

    fn value(model: &SelfSimilarityDeficit, dw: Real, hcw: Real) -> Real {
        model.calc_blockage_deficit(&point(dw, hcw)).unwrap()[[0, 0, 0, 0]]
    }

    #[test]
    fn induction_decays_upstream() {
        let model = SelfSimilarityDeficit::new();
        let near = value(&model, -40.0, 0.0);
        let far = value(&model, -400.0, 0.0);
        assert!(near > far && far > 0.0);
        assert!(value(&model, -40.0, 60.0) < near);
    }

    #[test]
    fn wake_cylinder_is_removed() {
        let model = SelfSimilarityDeficit::new();
        assert_eq!(value(&model, 100.0, 0.0), 0.0);
        assert_eq!(value(&model, 100.0, 40.0), 0.0);
        // outside the rotor-sized cylinder the downstream induction remains
        assert!(value(&model, 100.0, 80.0) > 0.0);

        let keep = SelfSimilarityDeficit::new().exclude_wake(false);
        assert!(value(&keep, 100.0, 0.0) > 0.0);
    }

    #[test]
    fn upstream_only_zeroes_downstream() {
        let model = SelfSimilarityDeficit::new().upstream_only(true);
        assert_eq!(value(&model, 100.0, 80.0), 0.0);
        assert_eq!(value(&model, 0.0, 0.0), 0.0);
        assert!(value(&model, -100.0, 0.0) > 0.0);
    }

    #[test]
    fn superposition_falls_back_to_farm_default() {
        let mut model = SelfSimilarityDeficit::new();
        assert!(matches!(
            model.blockage_superposition(),
            Err(ModelError::Detached { .. })
        ));
        model.attach(&Arc::new(FarmContext::new(Arc::new(SquaredSum))));
        assert_eq!(model.blockage_superposition().unwrap().name(), "SquaredSum");

        let own = SelfSimilarityDeficit::new().with_superposition(Arc::new(LinearSum));
        assert_eq!(own.blockage_superposition().unwrap().name(), "LinearSum");
    }

    #[test]
    fn capabilities_and_config() {
        let model = SelfSimilarityDeficit::new();
        assert!(model.as_blockage().is_some());
        assert!(model.as_wake().is_none());
        let cfg = model.config();
        assert_eq!(cfg.params["upstream_only"], false);
        assert_eq!(cfg.params["ss_gamma"], 1.1);
    }
}
