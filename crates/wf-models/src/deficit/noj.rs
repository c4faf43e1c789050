use wf_core::tensor::{map2, map3};
use wf_core::{
    ArgKey, ModelInputs, Param, Real, Signature, Tensor, floor_positive, induction_factor,
};

use super::{DeficitBase, DeficitModel, WakeDeficitModel};
use crate::cache::{LayoutCache, LayoutKey};
use crate::config::ModelConfig;
use crate::error::ModelResult;

const DEFICIT_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::DwIjlk),
    Param::Key(ArgKey::CwIjlk),
    Param::Key(ArgKey::CtIlk),
    Param::Variadic,
]);

const LAYOUT_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::DwIjlk),
    Param::Variadic,
]);

/// Jensen top-hat wake with linear expansion `k`.
///
/// Inside the wake the deficit is `2a·WS / (1 + k·dw/R)²`; the squared
/// expansion term only depends on the layout and is cached.
#[derive(Debug)]
pub struct NojDeficit {
    k: Real,
    base: DeficitBase,
    layout: LayoutCache,
}

impl Default for NojDeficit {
    fn default() -> Self {
        Self::new(Self::DEFAULT_K)
    }
}

impl NojDeficit {
    pub const DEFAULT_K: Real = 0.1;

    pub fn new(k: Real) -> Self {
        Self::with_base(k, DeficitBase::default())
    }

    pub fn with_base(k: Real, base: DeficitBase) -> Self {
        Self {
            k,
            base,
            layout: LayoutCache::new(),
        }
    }

    pub fn k(&self) -> Real {
        self.k
    }

    /// Cached expansion terms, one entry per source bundle.
    pub fn layout_cache(&self) -> &LayoutCache {
        &self.layout
    }

    fn layout_key(inputs: &ModelInputs) -> ModelResult<LayoutKey> {
        let dw = inputs.shared(ArgKey::DwIjlk)?;
        let d_src = inputs.shared(ArgKey::DSrcIl)?;
        Ok(LayoutKey::new([dw, d_src]))
    }

    fn expansion(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let k = self.k;
        Ok(map2(dw, d_src, |dw, d| {
            let r = floor_positive(d / 2.0);
            (1.0 + k * dw.max(0.0) / r).powi(2)
        })?)
    }
}

impl DeficitModel for NojDeficit {
    fn name(&self) -> &str {
        "NOJDeficit"
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
        let ct = inputs.get(ArgKey::CtIlk)?;
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let cw = inputs.get(ArgKey::CwIjlk)?;

        let key = Self::layout_key(inputs)?;
        let expansion = self.layout.get_or_compute(key, || self.expansion(inputs))?;
        let radius = self.wake_radius(inputs)?;

        let in_wake = map3(dw, cw, &radius, |dw, cw, r| {
            if dw > 0.0 && cw.abs() < r { 1.0 } else { 0.0 }
        })?;
        let centre = map2(ws, ct, |ws, ct| 2.0 * induction_factor(ct) * ws)?;
        Ok(map3(&centre, &expansion, &in_wake, |c, e, m| {
            if m > 0.0 { c / e } else { 0.0 }
        })?)
    }

    fn layout_signature(&self) -> Signature {
        LAYOUT_SIG
    }

    fn compute_layout_terms(&self, inputs: &ModelInputs) -> ModelResult<()> {
        let key = Self::layout_key(inputs)?;
        self.layout.store(key, self.expansion(inputs)?);
        Ok(())
    }

    fn invalidate_layout(&self) {
        self.layout.invalidate();
    }

    fn is_top_hat(&self) -> bool {
        true
    }

    fn as_wake(&self) -> Option<&dyn WakeDeficitModel> {
        Some(self)
    }

    fn config(&self) -> ModelConfig {
        self.base
            .describe(ModelConfig::new(self.name()).with("k", self.k))
    }
}

impl WakeDeficitModel for NojDeficit {
    fn wake_radius_signature(&self) -> Signature {
        LAYOUT_SIG
    }

    fn wake_radius(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let k = self.k;
        Ok(map2(dw, d_src, |dw, d| k * dw + d / 2.0)?)
    }
}
