//! Ground models emulating a reflecting ground boundary.

use std::fmt;
use std::sync::Arc;

use wf_core::tensor::{hypot, map2};
use wf_core::{ArgKey, ArgSet, ModelInputs, Tensor};

use crate::config::ModelConfig;
use crate::container::{LayoutPhysics, Physics};
use crate::context::{Attachment, FarmContext};
use crate::error::{ModelError, ModelResult};
use crate::superposition::SuperpositionModel;

pub trait GroundModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn args4model(&self) -> ArgSet;

    /// Evaluate `func` for the real source and its image and combine the two.
    fn reflect(&self, func: &Physics<'_>, inputs: &ModelInputs) -> ModelResult<Tensor>;

    fn layout_terms(&self, func: &LayoutPhysics<'_>, inputs: &ModelInputs) -> ModelResult<()> {
        func(inputs)
    }

    fn attach(&mut self, _ctx: &Arc<FarmContext>) {}

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name())
    }
}

/// Mirror the source below the ground plane.
///
/// The image source sits at `-h`, so its vertical distance to a destination is
/// `dh + 2h`. Direct and image contributions are combined with the model's own
/// superposition model, or the farm default once attached.
#[derive(Debug, Clone, Default)]
pub struct Mirror {
    superposition: Option<Arc<dyn SuperpositionModel>>,
    attachment: Attachment,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_superposition(superposition: Arc<dyn SuperpositionModel>) -> Self {
        Self {
            superposition: Some(superposition),
            attachment: Attachment::Standalone,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_attached()
    }

    fn superposition(&self) -> ModelResult<&Arc<dyn SuperpositionModel>> {
        if let Some(own) = &self.superposition {
            return Ok(own);
        }
        self.attachment
            .context()
            .map(|ctx| ctx.superposition())
            .ok_or_else(|| ModelError::Detached {
                model: "Mirror".into(),
                what: "a superposition model",
            })
    }
}

impl GroundModel for Mirror {
    fn name(&self) -> &str {
        "Mirror"
    }

    fn args4model(&self) -> ArgSet {
        ArgSet::from([ArgKey::DhIjlk, ArgKey::HcwIjlk, ArgKey::HIlk])
    }

    fn reflect(&self, func: &Physics<'_>, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let superposition = self.superposition()?;
        let dh = inputs.get(ArgKey::DhIjlk)?;
        let hcw = inputs.get(ArgKey::HcwIjlk)?;
        let h = inputs.get(ArgKey::HIlk)?;

        let dh_image = map2(dh, h, |dh, h| dh + 2.0 * h)?;
        let cw_image = hypot(hcw, &dh_image)?;
        let image_inputs =
            inputs.overriding([(ArgKey::DhIjlk, dh_image), (ArgKey::CwIjlk, cw_image)]);

        let direct = func(inputs)?;
        let image = func(&image_inputs)?;
        let combined = superposition.superpose_deficit(&[direct, image])?;

        let above_ground = map2(dh, h, |dh, h| if h + dh > 0.0 { 1.0 } else { 0.0 })?;
        Ok(map2(&combined, &above_ground, |v, m| v * m)?)
    }

    fn attach(&mut self, ctx: &Arc<FarmContext>) {
        self.attachment = Attachment::Attached(Arc::clone(ctx));
    }

    fn config(&self) -> ModelConfig {
        let cfg = ModelConfig::new(self.name());
        match &self.superposition {
            Some(s) => cfg.with_model("superposition_model", Some(s.config())),
            None => cfg.with_model("superposition_model", None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superposition::{LinearSum, SquaredSum};
    use wf_core::PointInputs;

    fn vertical(inputs: &ModelInputs) -> ModelResult<Tensor> {
        Ok(inputs.get(ArgKey::DhIjlk)?.clone())
    }

    fn point(dh: f64) -> ModelInputs {
        PointInputs {
            dh,
            hub_height: 70.0,
            ..PointInputs::default()
        }
        .into_inputs()
    }

    #[test]
    fn detached_mirror_without_superposition_fails() {
        let err = Mirror::new().reflect(&vertical, &point(0.0)).unwrap_err();
        assert!(matches!(err, ModelError::Detached { .. }));
    }

    #[test]
    fn mirror_adds_image_source() {
        let mirror = Mirror::with_superposition(Arc::new(LinearSum));
        let out = mirror.reflect(&vertical, &point(10.0)).unwrap();
        // direct dh = 10, image dh = 10 + 140
        assert_eq!(out[[0, 0, 0, 0]], 160.0);
    }

    #[test]
    fn mirror_uses_farm_default_once_attached() {
        let mut mirror = Mirror::new();
        mirror.attach(&Arc::new(FarmContext::new(Arc::new(SquaredSum))));
        assert!(mirror.is_attached());
        let out = mirror.reflect(&vertical, &point(-10.0)).unwrap();
        let expected = ((-10.0f64).powi(2) + 130.0f64.powi(2)).sqrt();
        assert!((out[[0, 0, 0, 0]] - expected).abs() < 1e-9);
    }

    #[test]
    fn below_ground_is_zero() {
        let mirror = Mirror::with_superposition(Arc::new(LinearSum));
        let out = mirror.reflect(&vertical, &point(-80.0)).unwrap();
        assert_eq!(out[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn own_superposition_is_serialized() {
        let cfg = Mirror::with_superposition(Arc::new(LinearSum)).config();
        assert_eq!(cfg.params["superposition_model"]["model"], "LinearSum");
    }
}
