//! Rotor-averaging models.
//!
//! A rotor-averaging model replaces a single-point evaluation at the rotor
//! centre of the destination with an average over the rotor disk.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use wf_core::tensor::{hypot, map2, map3};
use wf_core::{ArgKey, ArgSet, ModelInputs, Real, Tensor, WakeError, floor_positive};

use crate::config::ModelConfig;
use crate::container::{LayoutPhysics, Physics};
use crate::context::FarmContext;
use crate::error::ModelResult;

pub trait RotorAvgModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Quantities the averaging itself consumes.
    fn args4model(&self) -> ArgSet;

    /// Evaluate `func` over the rotor and return the averaged result.
    fn average(&self, func: &Physics<'_>, inputs: &ModelInputs) -> ModelResult<Tensor>;

    /// Layout terms only depend on positions along the wind, so by default they
    /// are computed once on the unmodified inputs.
    fn layout_terms(&self, func: &LayoutPhysics<'_>, inputs: &ModelInputs) -> ModelResult<()> {
        func(inputs)
    }

    /// Whether the model is only valid for top-hat shaped wakes.
    fn requires_top_hat(&self) -> bool {
        false
    }

    fn attach(&mut self, _ctx: &Arc<FarmContext>) {}

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name())
    }
}

/// Evaluate at the rotor centre only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotorCenter;

impl RotorAvgModel for RotorCenter {
    fn name(&self) -> &str {
        "RotorCenter"
    }

    fn args4model(&self) -> ArgSet {
        ArgSet::new()
    }

    fn average(&self, func: &Physics<'_>, inputs: &ModelInputs) -> ModelResult<Tensor> {
        func(inputs)
    }
}

/// Weighted average over nodes placed on the rotor disk.
///
/// Node coordinates are in units of the destination rotor radius.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRotorAvg {
    n: usize,
    nodes_x: Vec<Real>,
    nodes_y: Vec<Real>,
    weights: Vec<Real>,
}

impl GridRotorAvg {
    /// Uniform `n × n` grid over the bounding square, keeping nodes inside the disk.
    pub fn new(n: usize) -> Result<Self, WakeError> {
        if n == 0 {
            return Err(WakeError::InvalidArg {
                what: "GridRotorAvg needs at least one node per axis",
            });
        }
        let coords: Vec<Real> = (0..n)
            .map(|i| -1.0 + (2 * i + 1) as Real / n as Real)
            .collect();
        let (nodes_x, nodes_y): (Vec<Real>, Vec<Real>) = coords
            .iter()
            .flat_map(|&x| coords.iter().map(move |&y| (x, y)))
            .filter(|(x, y)| x * x + y * y <= 1.0)
            .unzip();
        let weights = vec![1.0 / nodes_x.len() as Real; nodes_x.len()];
        Ok(Self {
            n,
            nodes_x,
            nodes_y,
            weights,
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = (Real, Real, Real)> + '_ {
        self.nodes_x
            .iter()
            .zip(&self.nodes_y)
            .zip(&self.weights)
            .map(|((&x, &y), &w)| (x, y, w))
    }
}

impl RotorAvgModel for GridRotorAvg {
    fn name(&self) -> &str {
        "GridRotorAvg"
    }

    fn args4model(&self) -> ArgSet {
        ArgSet::from([ArgKey::HcwIjlk, ArgKey::DhIjlk, ArgKey::DDstIjl])
    }

    fn average(&self, func: &Physics<'_>, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let hcw = inputs.get(ArgKey::HcwIjlk)?;
        let dh = inputs.get(ArgKey::DhIjlk)?;
        let d_dst = inputs.get(ArgKey::DDstIjl)?;

        let mut acc: Option<Tensor> = None;
        for (x, y, w) in self.nodes() {
            let hcw_node = map2(hcw, d_dst, |h, d| h + x * d / 2.0)?;
            let dh_node = map2(dh, d_dst, |v, d| v + y * d / 2.0)?;
            let cw_node = hypot(&hcw_node, &dh_node)?;
            let node_inputs = inputs.overriding([
                (ArgKey::HcwIjlk, hcw_node),
                (ArgKey::DhIjlk, dh_node),
                (ArgKey::CwIjlk, cw_node),
            ]);
            let value = func(&node_inputs)?;
            acc = Some(match acc {
                None => value.mapv(|v| v * w),
                Some(sum) => map2(&sum, &value, |s, v| s + w * v)?,
            });
        }
        acc.ok_or_else(|| {
            WakeError::InvalidArg {
                what: "GridRotorAvg has no nodes",
            }
            .into()
        })
    }

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name()).with("n", self.n as u64)
    }
}

/// Fraction of a rotor disk (radius `r_rotor`) covered by a wake disk
/// (radius `r_wake`) whose centre is `d` away.
///
/// A rotor of zero size degenerates to a point test, `d < r_wake`.
pub fn overlap_fraction(d: Real, r_rotor: Real, r_wake: Real) -> Real {
    let d = d.abs();
    if r_rotor <= 0.0 {
        return if d < r_wake { 1.0 } else { 0.0 };
    }
    if r_wake <= 0.0 || d >= r_rotor + r_wake {
        return 0.0;
    }
    if d <= (r_wake - r_rotor).abs() {
        let r_min = r_rotor.min(r_wake);
        return (r_min / r_rotor).powi(2);
    }
    let (r1, r2) = (r_rotor, r_wake);
    let c1 = ((d * d + r1 * r1 - r2 * r2) / (2.0 * d * r1)).clamp(-1.0, 1.0);
    let c2 = ((d * d + r2 * r2 - r1 * r1) / (2.0 * d * r2)).clamp(-1.0, 1.0);
    let k = (-d + r1 + r2) * (d + r1 - r2) * (d - r1 + r2) * (d + r1 + r2);
    let lens = r1 * r1 * c1.acos() + r2 * r2 * c2.acos() - 0.5 * k.max(0.0).sqrt();
    (lens / (PI * floor_positive(r1 * r1))).clamp(0.0, 1.0)
}

/// Average of a top-hat wake over the rotor: the centreline value scaled by
/// the wake/rotor overlap fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaOverlapAvgModel;

impl RotorAvgModel for AreaOverlapAvgModel {
    fn name(&self) -> &str {
        "AreaOverlapAvgModel"
    }

    fn args4model(&self) -> ArgSet {
        ArgSet::from([ArgKey::CwIjlk, ArgKey::DDstIjl, ArgKey::WakeRadiusIjlk])
    }

    fn average(&self, func: &Physics<'_>, inputs: &ModelInputs) -> ModelResult<Tensor> {
        let cw = inputs.get(ArgKey::CwIjlk)?;
        let d_dst = inputs.get(ArgKey::DDstIjl)?;
        let wake_radius = inputs.get(ArgKey::WakeRadiusIjlk)?;

        let centre_inputs = inputs.overriding([(ArgKey::CwIjlk, Tensor::zeros(cw.raw_dim()))]);
        let centre = func(&centre_inputs)?;
        let overlap = map3(cw, d_dst, wake_radius, |cw, d, r| {
            overlap_fraction(cw, d / 2.0, r)
        })?;
        Ok(map2(&centre, &overlap, |v, o| v * o)?)
    }

    fn requires_top_hat(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wf_core::PointInputs;

    fn crosswind(inputs: &ModelInputs) -> ModelResult<Tensor> {
        Ok(inputs.get(ArgKey::CwIjlk)?.clone())
    }

    #[test]
    fn rotor_center_is_pass_through() {
        let inputs = PointInputs {
            hcw: 12.0,
            ..PointInputs::default()
        }
        .into_inputs();
        let out = RotorCenter.average(&crosswind, &inputs).unwrap();
        assert_eq!(out[[0, 0, 0, 0]], 12.0);
        assert!(RotorCenter.args4model().is_empty());
    }

    #[test]
    fn grid_nodes_inside_disk_with_unit_weight() {
        let grid = GridRotorAvg::new(4).unwrap();
        let nodes: Vec<_> = grid.nodes().collect();
        assert_eq!(nodes.len(), 12);
        assert!(nodes.iter().all(|(x, y, _)| x * x + y * y <= 1.0));
        let total: Real = nodes.iter().map(|(_, _, w)| w).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert!(GridRotorAvg::new(0).is_err());
    }

    #[test]
    fn grid_average_of_linear_field_is_centre_value() {
        // symmetric nodes: the mean horizontal offset is zero
        let grid = GridRotorAvg::new(5).unwrap();
        let inputs = PointInputs {
            hcw: 7.0,
            d_dst: 80.0,
            ..PointInputs::default()
        }
        .into_inputs();
        let hcw_only = |inp: &ModelInputs| -> ModelResult<Tensor> {
            Ok(inp.get(ArgKey::HcwIjlk)?.clone())
        };
        let out = grid.average(&hcw_only, &inputs).unwrap();
        assert_relative_eq!(out[[0, 0, 0, 0]], 7.0, epsilon = 1e-9);

        // the crosswind magnitude is convex, so its average exceeds the centre value
        let cw = grid.average(&crosswind, &inputs).unwrap();
        assert!(cw[[0, 0, 0, 0]] > 7.0);
    }

    #[test]
    fn overlap_fraction_limits() {
        assert_eq!(overlap_fraction(0.0, 40.0, 100.0), 1.0);
        assert_eq!(overlap_fraction(200.0, 40.0, 100.0), 0.0);
        assert_relative_eq!(overlap_fraction(0.0, 40.0, 20.0), 0.25, epsilon = 1e-12);
        let partial = overlap_fraction(100.0, 40.0, 100.0);
        assert!(partial > 0.0 && partial < 1.0);
        assert_eq!(overlap_fraction(5.0, 0.0, 10.0), 1.0);
        assert_eq!(overlap_fraction(10.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn overlap_is_continuous_at_edges() {
        let inside = overlap_fraction(60.0 - 1e-9, 40.0, 100.0);
        let lens = overlap_fraction(60.0 + 1e-9, 40.0, 100.0);
        assert_relative_eq!(inside, lens, epsilon = 1e-6);
        assert!(overlap_fraction(140.0 - 1e-6, 40.0, 100.0) < 1e-6);
    }

    #[test]
    fn area_overlap_scales_centre_value() {
        let inputs = PointInputs {
            hcw: 100.0,
            d_dst: 80.0,
            wake_radius: Some(100.0),
            ..PointInputs::default()
        }
        .into_inputs();
        let top_hat = |inp: &ModelInputs| -> ModelResult<Tensor> {
            let cw = inp.get(ArgKey::CwIjlk)?;
            let r = inp.get(ArgKey::WakeRadiusIjlk)?;
            Ok(map2(cw, r, |c, r| if c < r { 1.0 } else { 0.0 })?)
        };
        let out = AreaOverlapAvgModel.average(&top_hat, &inputs).unwrap();
        assert_relative_eq!(
            out[[0, 0, 0, 0]],
            overlap_fraction(100.0, 40.0, 100.0),
            epsilon = 1e-12
        );
        assert!(AreaOverlapAvgModel.requires_top_hat());
    }
}
