use wf_core::tensor::{map2, map3};
use wf_core::{ArgKey, ModelInputs, Param, Real, Signature, Tensor, floor_positive, safe_sqrt};

use super::{ConvectionDeficitModel, DeficitBase, DeficitModel, WakeDeficitModel};
use crate::config::ModelConfig;
use crate::error::ModelResult;
use crate::superposition::ConvectionTerms;

const DEFICIT_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::DwIjlk),
    Param::Key(ArgKey::CwIjlk),
    Param::Key(ArgKey::CtIlk),
    Param::Variadic,
]);

const WAKE_RADIUS_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::DwIjlk),
    Param::Key(ArgKey::CtIlk),
    Param::Variadic,
]);

const CONVECTION_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::WsIlk),
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::DwIjlk),
    Param::Key(ArgKey::CwIjlk),
    Param::Key(ArgKey::CtIlk),
    Param::Variadic,
]);

/// Gaussian wake of Bastankhah & Porté-Agel (2014).
///
/// The wake width grows as `σ = k·dw + ε·D` with `ε = 0.2·sqrt(β)` and
/// `β = (1 + sqrt(1 - Ct)) / (2 sqrt(1 - Ct))`. The centreline deficit is
/// `WS (1 - sqrt(1 - Ct / (8 (σ/D)²)))`.
#[derive(Debug)]
pub struct BastankhahGaussianDeficit {
    k: Real,
    base: DeficitBase,
}

impl Default for BastankhahGaussianDeficit {
    fn default() -> Self {
        Self::new(Self::DEFAULT_K)
    }
}

impl BastankhahGaussianDeficit {
    pub const DEFAULT_K: Real = 0.0324555;

    pub fn new(k: Real) -> Self {
        Self::with_base(k, DeficitBase::default())
    }

    pub fn with_base(k: Real, base: DeficitBase) -> Self {
        Self { k, base }
    }

    pub fn k(&self) -> Real {
        self.k
    }

    fn sigma(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let ct = inputs.get(ArgKey::CtIlk)?;
        let k = self.k;
        Ok(map3(dw, d_src, ct, |dw, d, ct| {
            let s = floor_positive(safe_sqrt(1.0 - ct));
            let beta = 0.5 * (1.0 + s) / s;
            floor_positive(k * dw + 0.2 * beta.sqrt() * d)
        })?)
    }

    /// Centreline deficit, zero at and upstream of the rotor.
    fn centre(&self, inputs: &ModelInputs, sigma: &Tensor) -> ModelResult<Tensor> {
        let ws = inputs.get(self.base.ws_key())?;
        let ct = inputs.get(ArgKey::CtIlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let fraction = map3(ct, d_src, sigma, |ct, d, sigma| {
            let width = sigma / floor_positive(d);
            1.0 - safe_sqrt(1.0 - ct / (8.0 * width * width))
        })?;
        Ok(map3(ws, &fraction, dw, |ws, f, dw| {
            if dw > 0.0 { ws * f } else { 0.0 }
        })?)
    }
}

impl DeficitModel for BastankhahGaussianDeficit {
    fn name(&self) -> &str {
        "BastankhahGaussianDeficit"
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
        let cw = inputs.get(ArgKey::CwIjlk)?;
        let sigma = self.sigma(inputs)?;
        let centre = self.centre(inputs, &sigma)?;
        Ok(map3(&centre, cw, &sigma, |c, cw, s| {
            c * (-cw * cw / (2.0 * s * s)).exp()
        })?)
    }

    fn as_wake(&self) -> Option<&dyn WakeDeficitModel> {
        Some(self)
    }

    fn as_convection(&self) -> Option<&dyn ConvectionDeficitModel> {
        Some(self)
    }

    fn config(&self) -> ModelConfig {
        self.base
            .describe(ModelConfig::new(self.name()).with("k", self.k))
    }
}

impl WakeDeficitModel for BastankhahGaussianDeficit {
    fn wake_radius_signature(&self) -> Signature {
        WAKE_RADIUS_SIG
    }

    /// Two standard deviations of the Gaussian profile.
    fn wake_radius(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        Ok(self.sigma(inputs)?.mapv(|s| 2.0 * s))
    }
}

impl ConvectionDeficitModel for BastankhahGaussianDeficit {
    fn convection_signature(&self) -> Signature {
        CONVECTION_SIG
    }

    fn calc_deficit_convection(&self, inputs: &ModelInputs) -> ModelResult<ConvectionTerms> {
        let ws = inputs.get(ArgKey::WsIlk)?;
        let cw = inputs.get(ArgKey::CwIjlk)?;
        let sigma = self.sigma(inputs)?;
        let deficit_centre = self.centre(inputs, &sigma)?;
        let uc = map2(ws, &deficit_centre, |ws, c| ws - 0.5 * c)?;
        ConvectionTerms::new(deficit_centre, uc, sigma.mapv(|s| s * s), cw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FarmContext;
    use crate::superposition::{LinearSum, WeightedSum};
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use wf_core::PointInputs;

    fn point(dw: Real, hcw: Real) -> ModelInputs {
        PointInputs {
            dw,
            hcw,
            ..PointInputs::default()
        }
        .into_inputs()
    }

    #[test]
    fn peak_on_centreline_and_decays_crosswind() {
        let model = BastankhahGaussianDeficit::default();
        let centre = model.evaluate(&point(400.0, 0.0)).unwrap()[[0, 0, 0, 0]];
        let side = model.evaluate(&point(400.0, 40.0)).unwrap()[[0, 0, 0, 0]];
        assert!(centre > side && side > 0.0);
        assert!(centre < 10.0);
        assert_eq!(model.evaluate(&point(-400.0, 0.0)).unwrap()[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn deficit_recovers_downstream() {
        let model = BastankhahGaussianDeficit::default();
        let near = model.evaluate(&point(300.0, 0.0)).unwrap()[[0, 0, 0, 0]];
        let far = model.evaluate(&point(1500.0, 0.0)).unwrap()[[0, 0, 0, 0]];
        assert!(near > far);
    }

    #[test]
    fn convection_terms_reproduce_point_deficit() {
        let model = BastankhahGaussianDeficit::default();
        let inputs = point(500.0, 30.0);
        let terms = model.calc_deficit_convection(&inputs).unwrap();
        let direct = model.calc_deficit(&inputs).unwrap();
        assert_relative_eq!(
            terms.deficit[[0, 0, 0, 0]],
            direct[[0, 0, 0, 0]],
            epsilon = 1e-12
        );
        let radius = model.wake_radius(&inputs).unwrap();
        assert_relative_eq!(
            radius[[0, 0, 0, 0]],
            2.0 * terms.sigma_sqr[[0, 0, 0, 0]].sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn convection_args_only_under_weighted_superposition() {
        let mut model = BastankhahGaussianDeficit::default();
        assert!(!model.args4deficit().contains(ArgKey::WsIlk));

        model.attach(&Arc::new(FarmContext::new(Arc::new(LinearSum))));
        assert!(!model.args4deficit().contains(ArgKey::WsIlk));

        model.attach(&Arc::new(FarmContext::new(Arc::new(WeightedSum))));
        assert!(model.args4deficit().contains(ArgKey::WsIlk));
    }

    #[test]
    fn capabilities() {
        let model = BastankhahGaussianDeficit::default();
        assert!(model.as_wake().is_some());
        assert!(model.as_convection().is_some());
        assert!(model.as_blockage().is_none());
        assert!(!model.is_top_hat());
    }
}
