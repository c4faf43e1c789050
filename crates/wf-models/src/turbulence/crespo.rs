use wf_core::tensor::{map2, map3};
use wf_core::{
    ArgKey, ModelInputs, Param, Signature, Tensor, floor_positive, induction_factor, safe_powf,
};

use super::TurbulenceModel;
use crate::config::ModelConfig;
use crate::container::ModelContainer;
use crate::error::ModelResult;
use crate::ground::GroundModel;
use crate::rotor_avg::{AreaOverlapAvgModel, RotorAvgModel};
use crate::superposition::{AddedTurbulenceSuperposition, SqrMaxSum};

const ADDED_TURBULENCE_SIG: Signature = Signature::new(&[
    Param::Receiver,
    Param::Key(ArgKey::DwIjlk),
    Param::Key(ArgKey::CwIjlk),
    Param::Key(ArgKey::DSrcIl),
    Param::Key(ArgKey::CtIlk),
    Param::Key(ArgKey::TiIlk),
    Param::Key(ArgKey::WakeRadiusIjlk),
    Param::Variadic,
]);

/// Empirical added turbulence of Crespo & Hernández (1996):
///
/// `TI_add = 0.73 a^0.8325 TI^0.0325 (D/dw)^0.32`
///
/// inside the wake (`dw > 0`, `cw < wake_radius`) and zero elsewhere, with `a`
/// the axial induction factor floored at `1e-10`.
#[derive(Debug)]
pub struct CrespoHernandez {
    container: ModelContainer,
    superposition: Box<dyn AddedTurbulenceSuperposition>,
}

impl Default for CrespoHernandez {
    fn default() -> Self {
        Self::new(
            Box::new(SqrMaxSum),
            Some(Box::new(AreaOverlapAvgModel)),
            None,
        )
    }
}

impl CrespoHernandez {
    pub fn new(
        superposition: Box<dyn AddedTurbulenceSuperposition>,
        rotor_avg: Option<Box<dyn RotorAvgModel>>,
        ground: Option<Box<dyn GroundModel>>,
    ) -> Self {
        Self {
            container: ModelContainer::new(rotor_avg, ground),
            superposition,
        }
    }
}

impl TurbulenceModel for CrespoHernandez {
    fn name(&self) -> &str {
        "CrespoHernandez"
    }

    fn container(&self) -> &ModelContainer {
        &self.container
    }

    fn container_mut(&mut self) -> &mut ModelContainer {
        &mut self.container
    }

    fn added_turbulence_signature(&self) -> Signature {
        ADDED_TURBULENCE_SIG
    }

    fn calc_added_turbulence(&self, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let dw = inputs.get(ArgKey::DwIjlk)?;
        let cw = inputs.get(ArgKey::CwIjlk)?;
        let d_src = inputs.get(ArgKey::DSrcIl)?;
        let ct = inputs.get(ArgKey::CtIlk)?;
        let ti = inputs.get(ArgKey::TiIlk)?;
        let wake_radius = inputs.get(ArgKey::WakeRadiusIjlk)?;

        let amplitude = map2(ct, ti, |ct, ti| {
            let a = floor_positive(induction_factor(ct));
            0.73 * a.powf(0.8325) * safe_powf(ti, 0.0325)
        })?;
        let decay = map2(d_src, dw, |d, dw| (d / floor_positive(dw)).abs().powf(0.32))?;
        let in_wake = map3(dw, cw, wake_radius, |dw, cw, r| {
            if dw > 0.0 && cw.abs() < r { 1.0 } else { 0.0 }
        })?;
        Ok(map3(&amplitude, &decay, &in_wake, |amp, decay, m| {
            if m > 0.0 { amp * decay } else { 0.0 }
        })?)
    }

    fn superposition(&self) -> &dyn AddedTurbulenceSuperposition {
        self.superposition.as_ref()
    }

    fn is_top_hat(&self) -> bool {
        true
    }

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name())
            .with_model("addedTurbSuperpositionModel", Some(self.superposition.config()))
            .with_model(
                "rotor_avg_model",
                self.container.rotor_avg().map(|m| m.config()),
            )
            .with_model("ground_model", self.container.ground().map(|m| m.config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotor_avg::RotorCenter;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use wf_core::{PointInputs, Real};

    fn point(dw: Real, hcw: Real, ct: Real, ti: Real, wake_radius: Real) -> ModelInputs {
        PointInputs {
            dw,
            hcw,
            ct,
            ti,
            d_dst: 80.0,
            wake_radius: Some(wake_radius),
            ..PointInputs::default()
        }
        .into_inputs()
    }

    fn centre_only() -> CrespoHernandez {
        CrespoHernandez::new(Box::new(SqrMaxSum), Some(Box::new(RotorCenter)), None)
    }

    #[test]
    fn formula_on_centreline() {
        let model = centre_only();
        let out = model
            .calc_added_turbulence(&point(400.0, 0.0, 0.75, 0.1, 100.0))
            .unwrap();
        let expected = 0.73 * 0.25f64.powf(0.8325) * 0.1f64.powf(0.0325) * 0.2f64.powf(0.32);
        assert_relative_eq!(out[[0, 0, 0, 0]], expected, epsilon = 1e-12);
    }

    #[test]
    fn zero_upstream_and_outside_wake() {
        let model = centre_only();
        let upstream = model.evaluate(&point(-500.0, 0.0, 0.8, 0.1, 100.0)).unwrap();
        assert_eq!(upstream[[0, 0, 0, 0]], 0.0);
        let outside = model.evaluate(&point(500.0, 100.0, 0.8, 0.1, 100.0)).unwrap();
        assert_eq!(outside[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn zero_thrust_stays_finite() {
        let model = centre_only();
        let out = model.evaluate(&point(500.0, 0.0, 0.0, 0.1, 100.0)).unwrap();
        let v = out[[0, 0, 0, 0]];
        assert!(v.is_finite() && v >= 0.0 && v < 1e-6);
    }

    #[test]
    fn defaults_to_area_overlap_and_sqr_max_sum() {
        let model = CrespoHernandez::default();
        assert!(model.is_top_hat());
        assert_eq!(model.superposition().name(), "SqrMaxSum");
        assert_eq!(
            model.container().rotor_avg().map(|m| m.name()),
            Some("AreaOverlapAvgModel")
        );
        let args = model.args4addturb();
        assert!(args.contains(ArgKey::DDstIjl));
        assert!(args.contains(ArgKey::WakeRadiusIjlk));
    }

    proptest! {
        #[test]
        fn upstream_points_get_no_turbulence(
            dw in -2000.0f64..=0.0,
            ct in 0.0f64..=1.0,
            ti in 0.0f64..0.5,
        ) {
            let out = centre_only().evaluate(&point(dw, 0.0, ct, ti, 100.0)).unwrap();
            prop_assert_eq!(out[[0, 0, 0, 0]], 0.0);
        }

        #[test]
        fn outside_wake_radius_gets_no_turbulence(
            dw in 1.0f64..2000.0,
            excess in 0.0f64..500.0,
            radius in 1.0f64..300.0,
        ) {
            let out = centre_only()
                .evaluate(&point(dw, radius + excess, 0.8, 0.1, radius))
                .unwrap();
            prop_assert_eq!(out[[0, 0, 0, 0]], 0.0);
        }

        #[test]
        fn inside_wake_is_positive_and_finite(
            dw in 1.0f64..5000.0,
            ct in 0.0f64..=1.0,
            ti in 0.0f64..0.5,
        ) {
            let out = centre_only().evaluate(&point(dw, 0.0, ct, ti, 50.0)).unwrap();
            let v = out[[0, 0, 0, 0]];
            prop_assert!(v.is_finite());
            prop_assert!(v > 0.0);
        }
    }
}
