use wf_core::tensor::{map2, map3};
use wf_core::{ArgKey, ModelInputs, Param, Real, Signature, Tensor, floor_positive};

use super::{Deflected, DeflectionModel};
use crate::config::ModelConfig;
use crate::error::ModelResult;

const DEFLECTION_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::DwIjl),
    Param::Key(ArgKey::HcwIjl),
    Param::Key(ArgKey::DhIjl),
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::YawIlk),
    Param::Key(ArgKey::TiltIlk),
    Param::Key(ArgKey::CtIlk),
    Param::Variadic,
]);

/// Jiménez et al. (2010) deflection: the wake centre moves sideways by
/// `C·dw / (1 + β·dw/D)` with `C = cos²γ·sinγ·Ct/2` for yaw γ, and vertically
/// the same way for tilt. Points upstream of the rotor are not moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JimenezWakeDeflection {
    pub beta: Real,
}

impl Default for JimenezWakeDeflection {
    fn default() -> Self {
        Self { beta: 0.1 }
    }
}

impl JimenezWakeDeflection {
    pub fn new(beta: Real) -> Self {
        Self { beta }
    }

    fn skew(angle_deg: Real, ct: Real) -> Real {
        let g = angle_deg.to_radians();
        g.cos().powi(2) * g.sin() * ct / 2.0
    }

    fn shift(
        &self,
        offset: &Tensor,
        angle: &Tensor,
        ct: &Tensor,
        growth: &Tensor,
    ) -> ModelResult<Tensor> {
        let coefficient = map2(angle, ct, Self::skew)?;
        Ok(map3(offset, &coefficient, growth, |o, c, g| o - c * g)?)
    }
}

impl DeflectionModel for JimenezWakeDeflection {
    fn name(&self) -> &str {
        "JimenezWakeDeflection"
    }

    fn deflection_signature(&self) -> Signature {
        DEFLECTION_SIG
    }

    fn calc_deflection(&self, inputs: &ModelInputs) -> ModelResult<Deflected> {
        let dw = inputs.get(ArgKey::DwIjl)?;
        let hcw = inputs.get(ArgKey::HcwIjl)?;
        let dh = inputs.get(ArgKey::DhIjl)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let yaw = inputs.get(ArgKey::YawIlk)?;
        let tilt = inputs.get(ArgKey::TiltIlk)?;
        let ct = inputs.get(ArgKey::CtIlk)?;

        let beta = self.beta;
        let growth = map2(dw, d_src, |dw, d| {
            if dw > 0.0 { dw / (1.0 + beta * dw / floor_positive(d)) } else { 0.0 }
        })?;
        let hcw = self.shift(hcw, yaw, ct, &growth)?;
        let dh = self.shift(dh, tilt, ct, &growth)?;
        // dw is unchanged but broadcast to the full ijlk shape
        let dw = map2(dw, &hcw, |dw, _| dw)?;
        Ok(Deflected { dw, hcw, dh })
    }

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name()).with("beta", self.beta)
    }
}
