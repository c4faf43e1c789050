//! Rotor-averaging and ground-model composition shared by deficit and turbulence models.

use std::sync::Arc;

use tracing::debug;
use wf_core::{ArgSet, ModelInputs, Tensor};

use crate::context::{Attachment, FarmContext};
use crate::error::ModelResult;
use crate::ground::GroundModel;
use crate::rotor_avg::RotorAvgModel;
use crate::superposition::ConvectionTerms;

/// A physics call: named inputs in, contribution tensor out.
pub type Physics<'f> = dyn Fn(&ModelInputs) -> ModelResult<Tensor> + 'f;

/// A layout-term call: fills the model's layout cache.
pub type LayoutPhysics<'f> = dyn Fn(&ModelInputs) -> ModelResult<()> + 'f;

/// A convection-form call: named inputs in, wake terms out.
pub type ConvectionPhysics<'f> = dyn Fn(&ModelInputs) -> ModelResult<ConvectionTerms> + 'f;

pub type EvalFn<'f> = Box<Physics<'f>>;
pub type LayoutFn<'f> = Box<LayoutPhysics<'f>>;
pub type ConvectionFn<'f> = Box<ConvectionPhysics<'f>>;

/// Optional rotor-averaging and ground sub-models of a physics model.
///
/// Wrapping always nests ground reflection around rotor averaging around the
/// physics, so the image source is averaged over the same rotor nodes as the
/// real one.
#[derive(Debug, Default)]
pub struct ModelContainer {
    rotor_avg: Option<Box<dyn RotorAvgModel>>,
    ground: Option<Box<dyn GroundModel>>,
    attachment: Attachment,
}

impl ModelContainer {
    pub fn new(
        rotor_avg: Option<Box<dyn RotorAvgModel>>,
        ground: Option<Box<dyn GroundModel>>,
    ) -> Self {
        Self {
            rotor_avg,
            ground,
            attachment: Attachment::Standalone,
        }
    }

    pub fn rotor_avg(&self) -> Option<&dyn RotorAvgModel> {
        self.rotor_avg.as_deref()
    }

    pub fn ground(&self) -> Option<&dyn GroundModel> {
        self.ground.as_deref()
    }

    /// Replace the rotor-averaging model; a current attachment is passed on.
    pub fn set_rotor_avg(&mut self, mut model: Option<Box<dyn RotorAvgModel>>) {
        if let (Some(m), Some(ctx)) = (model.as_mut(), self.attachment.context()) {
            m.attach(ctx);
        }
        self.rotor_avg = model;
    }

    /// Replace the ground model; a current attachment is passed on.
    pub fn set_ground(&mut self, mut model: Option<Box<dyn GroundModel>>) {
        if let (Some(m), Some(ctx)) = (model.as_mut(), self.attachment.context()) {
            m.attach(ctx);
        }
        self.ground = model;
    }

    /// Union of the sub-models' required quantities, recomputed on every call.
    pub fn args4model(&self) -> ArgSet {
        let mut args = ArgSet::new();
        if let Some(ground) = &self.ground {
            args |= ground.args4model();
        }
        if let Some(rotor_avg) = &self.rotor_avg {
            args |= rotor_avg.args4model();
        }
        args
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn context(&self) -> Option<&Arc<FarmContext>> {
        self.attachment.context()
    }

    /// Attach to a farm context and propagate it to both sub-models.
    pub fn attach(&mut self, ctx: &Arc<FarmContext>) {
        debug!(
            rotor_avg = self.rotor_avg.as_ref().map(|m| m.name()),
            ground = self.ground.as_ref().map(|m| m.name()),
            "attaching model container to farm context"
        );
        self.attachment = Attachment::Attached(Arc::clone(ctx));
        if let Some(ground) = self.ground.as_mut() {
            ground.attach(ctx);
        }
        if let Some(rotor_avg) = self.rotor_avg.as_mut() {
            rotor_avg.attach(ctx);
        }
    }

    /// Wrap a physics call: rotor averaging innermost, ground reflection outermost.
    pub fn wrap<'a>(&'a self, f: EvalFn<'a>) -> EvalFn<'a> {
        let mut f = f;
        if let Some(rotor_avg) = self.rotor_avg.as_deref() {
            let inner = f;
            f = Box::new(move |inputs: &ModelInputs| rotor_avg.average(&*inner, inputs));
        }
        if let Some(ground) = self.ground.as_deref() {
            let inner = f;
            f = Box::new(move |inputs: &ModelInputs| ground.reflect(&*inner, inputs));
        }
        f
    }

    /// Wrap a convection-form call. The wake-centre terms come from the
    /// unwrapped call; the point deficit goes through the same chain as
    /// [`ModelContainer::wrap`].
    pub fn wrap_convection<'a>(&'a self, f: ConvectionFn<'a>) -> ConvectionFn<'a> {
        if self.rotor_avg.is_none() && self.ground.is_none() {
            return f;
        }
        Box::new(move |inputs: &ModelInputs| {
            let terms = f(inputs)?;
            let point: EvalFn<'_> =
                Box::new(|inputs: &ModelInputs| Ok(f(inputs)?.deficit));
            let deficit = self.wrap(point)(inputs)?;
            Ok(terms.with_deficit(deficit))
        })
    }

    /// Wrap a layout-term call in the same order as [`ModelContainer::wrap`].
    pub fn wrap_layout<'a>(&'a self, f: LayoutFn<'a>) -> LayoutFn<'a> {
        let mut f = f;
        if let Some(rotor_avg) = self.rotor_avg.as_deref() {
            let inner = f;
            f = Box::new(move |inputs: &ModelInputs| rotor_avg.layout_terms(&*inner, inputs));
        }
        if let Some(ground) = self.ground.as_deref() {
            let inner = f;
            f = Box::new(move |inputs: &ModelInputs| ground.layout_terms(&*inner, inputs));
        }
        f
    }
}


#[cfg(test)]
mod tests {
    use super::probes::*;
    use super::*;
    use crate::rotor_avg::GridRotorAvg;
    use std::sync::Mutex;
    use wf_core::tensor::scalar;
    use wf_core::ArgKey;

    fn entries(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn args_are_union_of_sub_models() {
        let log = CallLog::default();
        let container = probed_container(&log);
        let expected = ArgSet::from([ArgKey::DDstIjl, ArgKey::HcwIjlk, ArgKey::HIlk]);
        assert_eq!(container.args4model(), expected);
        assert!(ModelContainer::default().args4model().is_empty());
    }

    #[test]
    fn args_follow_sub_model_changes() {
        let mut container = ModelContainer::default();
        container.set_rotor_avg(Some(Box::new(GridRotorAvg::new(3).unwrap())));
        assert!(container.args4model().contains(ArgKey::DDstIjl));
        container.set_rotor_avg(None);
        assert!(container.args4model().is_empty());
    }

    #[test]
    fn ground_wraps_rotor_average_wraps_physics() {
        let log = CallLog::default();
        let container = probed_container(&log);
        let physics_log = Arc::clone(&log);
        let physics: EvalFn<'_> = Box::new(move |_inputs: &ModelInputs| {
            log_call(&physics_log, "physics");
            Ok(scalar(3.0))
        });
        let out = container.wrap(physics)(&ModelInputs::new()).unwrap();
        assert_eq!(
            entries(&log),
            [
                "ground:enter",
                "rotor_avg:enter",
                "physics",
                "rotor_avg:exit",
                "ground:exit"
            ]
        );
        // (3 * 2) + 1: the ground model saw the averaged value
        assert_eq!(out[[0, 0, 0, 0]], 7.0);
    }

    #[test]
    fn layout_wrapping_uses_the_same_order() {
        let log = CallLog::default();
        let container = probed_container(&log);
        let physics_log = Arc::clone(&log);
        let layout: LayoutFn<'_> = Box::new(move |_inputs: &ModelInputs| {
            log_call(&physics_log, "layout");
            Ok(())
        });
        container.wrap_layout(layout)(&ModelInputs::new()).unwrap();
        assert_eq!(
            entries(&log),
            ["ground:layout", "rotor_avg:layout", "layout"]
        );
    }

    #[test]
    fn convection_point_deficit_goes_through_the_chain() {
        let log = CallLog::default();
        let container = probed_container(&log);
        let convection: ConvectionFn<'_> = Box::new(|_inputs: &ModelInputs| {
            ConvectionTerms::new(scalar(3.0), scalar(8.0), scalar(100.0), scalar(0.0))
        });
        let terms = container.wrap_convection(convection)(&ModelInputs::new()).unwrap();
        assert_eq!(terms.deficit[[0, 0, 0, 0]], 7.0);
        assert_eq!(terms.deficit_centre[[0, 0, 0, 0]], 3.0);
        assert_eq!(terms.uc[[0, 0, 0, 0]], 8.0);
        assert!(entries(&log).starts_with(&["ground:enter".to_string()]));
    }

    #[test]
    fn empty_container_is_pass_through() {
        let container = ModelContainer::default();
        let out = container
            .wrap(Box::new(|_inputs: &ModelInputs| Ok(scalar(5.0))))(&ModelInputs::new())
            .unwrap();
        assert_eq!(out[[0, 0, 0, 0]], 5.0);
    }

    #[test]
    fn attach_propagates_to_sub_models() {
        let log = CallLog::default();
        let mut container = probed_container(&log);
        assert!(!container.attachment().is_attached());
        container.attach(&Arc::new(FarmContext::default()));
        assert!(container.attachment().is_attached());
        let calls = entries(&log);
        assert!(calls.contains(&"ground:attach".to_string()));
        assert!(calls.contains(&"rotor_avg:attach".to_string()));
    }

    #[test]
    fn sub_model_set_after_attach_is_attached() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut container = ModelContainer::default();
        container.attach(&Arc::new(FarmContext::default()));
        container.set_ground(Some(Box::new(ProbeGround {
            log: Arc::clone(&log),
        })));
        assert_eq!(entries(&log), ["ground:attach"]);
    }
}
