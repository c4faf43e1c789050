//! Named-input bundle passed to every model call.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::args::{ArgKey, ArgSet};
use crate::error::{WakeError, WakeResult};
use crate::numeric::Real;
use crate::tensor::{self, Tensor};

/// Named tensors supplied by the farm driver for one source turbine set.
///
/// Tensors are shared, so wrappers that override a few quantities (rotor
/// averaging nodes, mirrored sources) copy the map, not the data.
#[derive(Clone, Debug, Default)]
pub struct ModelInputs {
    values: BTreeMap<ArgKey, Arc<Tensor>>,
}

impl ModelInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: ArgKey, value: Tensor) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: ArgKey, value: Tensor) {
        self.values.insert(key, Arc::new(value));
    }

    pub fn remove(&mut self, key: ArgKey) -> Option<Arc<Tensor>> {
        self.values.remove(&key)
    }

    pub fn get(&self, key: ArgKey) -> WakeResult<&Tensor> {
        self.values
            .get(&key)
            .map(Arc::as_ref)
            .ok_or(WakeError::MissingInput { key })
    }

    /// The shared tensor itself; its address identifies the data while it is held.
    pub fn shared(&self, key: ArgKey) -> WakeResult<&Arc<Tensor>> {
        self.values.get(&key).ok_or(WakeError::MissingInput { key })
    }

    pub fn contains(&self, key: ArgKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Keys currently present.
    pub fn keys(&self) -> ArgSet {
        self.values.keys().copied().collect()
    }

    /// Fail on the first declared quantity that is not supplied.
    pub fn require(&self, args: &ArgSet) -> WakeResult<()> {
        match args.iter().find(|key| !self.contains(*key)) {
            Some(key) => Err(WakeError::MissingInput { key }),
            None => Ok(()),
        }
    }

    /// Copy of this bundle with some quantities replaced.
    pub fn overriding(&self, overrides: impl IntoIterator<Item = (ArgKey, Tensor)>) -> Self {
        let mut out = self.clone();
        for (key, value) in overrides {
            out.insert(key, value);
        }
        out
    }
}

/// Inputs for a single source/field-point pair at one wind condition.
///
/// Every quantity becomes a `(1, 1, 1, 1)` tensor; `cw` is derived from the
/// horizontal and vertical crosswind parts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointInputs {
    pub dw: Real,
    pub hcw: Real,
    pub dh: Real,
    pub d_src: Real,
    pub d_dst: Real,
    pub hub_height: Real,
    pub ct: Real,
    pub ws: Real,
    pub ws_eff: Real,
    pub ti: Real,
    pub ti_eff: Real,
    pub yaw: Real,
    pub tilt: Real,
    pub wake_radius: Option<Real>,
}

impl Default for PointInputs {
    fn default() -> Self {
        Self {
            dw: 0.0,
            hcw: 0.0,
            dh: 0.0,
            d_src: 80.0,
            d_dst: 0.0,
            hub_height: 70.0,
            ct: 0.8,
            ws: 10.0,
            ws_eff: 10.0,
            ti: 0.1,
            ti_eff: 0.1,
            yaw: 0.0,
            tilt: 0.0,
            wake_radius: None,
        }
    }
}

impl PointInputs {
    pub fn into_inputs(self) -> ModelInputs {
        let s = tensor::scalar;
        let cw = self.hcw.hypot(self.dh);
        let inputs = ModelInputs::new()
            .with(ArgKey::DwIjlk, s(self.dw))
            .with(ArgKey::HcwIjlk, s(self.hcw))
            .with(ArgKey::DhIjlk, s(self.dh))
            .with(ArgKey::CwIjlk, s(cw))
            .with(ArgKey::DwIjl, s(self.dw))
            .with(ArgKey::HcwIjl, s(self.hcw))
            .with(ArgKey::DhIjl, s(self.dh))
            .with(ArgKey::DSrcIl, s(self.d_src))
            .with(ArgKey::DDstIjl, s(self.d_dst))
            .with(ArgKey::HIlk, s(self.hub_height))
            .with(ArgKey::CtIlk, s(self.ct))
            .with(ArgKey::WsIlk, s(self.ws))
            .with(ArgKey::WsEffIlk, s(self.ws_eff))
            .with(ArgKey::TiIlk, s(self.ti))
            .with(ArgKey::TiEffIlk, s(self.ti_eff))
            .with(ArgKey::YawIlk, s(self.yaw))
            .with(ArgKey::TiltIlk, s(self.tilt));
        match self.wake_radius {
            Some(r) => inputs.with(ArgKey::WakeRadiusIjlk, s(r)),
            None => inputs,
        }
    }
}

impl From<PointInputs> for ModelInputs {
    fn from(p: PointInputs) -> Self {
        p.into_inputs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_reported() {
        let inputs = ModelInputs::new().with(ArgKey::DwIjlk, tensor::scalar(1.0));
        let err = inputs.get(ArgKey::CwIjlk).unwrap_err();
        assert_eq!(err, WakeError::MissingInput { key: ArgKey::CwIjlk });

        let need = ArgSet::from([ArgKey::DwIjlk, ArgKey::CtIlk]);
        assert_eq!(
            inputs.require(&need).unwrap_err(),
            WakeError::MissingInput { key: ArgKey::CtIlk }
        );
    }

    #[test]
    fn overriding_leaves_original_untouched() {
        let base = ModelInputs::new().with(ArgKey::DhIjlk, tensor::scalar(1.0));
        let moved = base.overriding([(ArgKey::DhIjlk, tensor::scalar(5.0))]);
        assert_eq!(base.get(ArgKey::DhIjlk).unwrap()[[0, 0, 0, 0]], 1.0);
        assert_eq!(moved.get(ArgKey::DhIjlk).unwrap()[[0, 0, 0, 0]], 5.0);
    }

    #[test]
    fn point_inputs_derive_crosswind() {
        let inputs = PointInputs {
            hcw: 3.0,
            dh: 4.0,
            ..PointInputs::default()
        }
        .into_inputs();
        assert_eq!(inputs.get(ArgKey::CwIjlk).unwrap()[[0, 0, 0, 0]], 5.0);
        assert!(!inputs.contains(ArgKey::WakeRadiusIjlk));
    }
}
