//! Rules for combining contributions of several upstream turbines.

use std::fmt;

use tracing::trace;
use wf_core::tensor::{map2, map3};
use wf_core::{Real, Tensor, WakeError, floor_positive};

use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};

/// Convection-form wake terms of one source, as produced by a convection deficit model.
#[derive(Clone, Debug)]
pub struct ConvectionTerms {
    /// Centreline deficit (crosswind distance zero)
    pub deficit_centre: Tensor,
    /// Convection velocity of the wake
    pub uc: Tensor,
    /// Squared wake width
    pub sigma_sqr: Tensor,
    /// Crosswind distance of the field points
    pub cw: Tensor,
    /// Deficit at the field points after rotor averaging and ground reflection
    pub deficit: Tensor,
}

impl ConvectionTerms {
    /// Terms of a Gaussian wake; the point deficit is reconstructed from the profile.
    pub fn new(
        deficit_centre: Tensor,
        uc: Tensor,
        sigma_sqr: Tensor,
        cw: Tensor,
    ) -> ModelResult<Self> {
        let deficit = map3(&deficit_centre, &cw, &sigma_sqr, |centre, cw, s2| {
            centre * (-cw * cw / (2.0 * floor_positive(s2))).exp()
        })?;
        Ok(Self {
            deficit_centre,
            uc,
            sigma_sqr,
            cw,
            deficit,
        })
    }

    /// Replace the point deficit, keeping the wake-centre terms.
    pub fn with_deficit(self, deficit: Tensor) -> Self {
        Self { deficit, ..self }
    }

    /// Scale both deficits, e.g. by the `cos(yaw)` projection.
    pub fn scaled(self, factor: &Tensor) -> ModelResult<Self> {
        let deficit_centre = map2(&self.deficit_centre, factor, |d, f| d * f)?;
        let deficit = map2(&self.deficit, factor, |d, f| d * f)?;
        Ok(Self {
            deficit_centre,
            deficit,
            ..self
        })
    }
}

/// Combination rule for velocity deficits.
pub trait SuperpositionModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Combine contributions element-wise; all tensors must broadcast together.
    fn superpose_deficit(&self, deficits: &[Tensor]) -> ModelResult<Tensor>;

    /// True for weighted rules that need wake width and convection velocity.
    fn requires_convection(&self) -> bool {
        false
    }

    fn superpose_convection(&self, _terms: &[ConvectionTerms]) -> ModelResult<Tensor> {
        Err(ModelError::NotSupported {
            what: "convection-form superposition",
        })
    }

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name())
    }
}

/// Combination rule for added turbulence intensity.
pub trait AddedTurbulenceSuperposition: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Effective turbulence intensity from the ambient value and all added contributions.
    fn calc_effective_ti(&self, ti: &Tensor, added: &[Tensor]) -> ModelResult<Tensor>;

    fn config(&self) -> ModelConfig {
        ModelConfig::new(self.name())
    }
}

fn fold(parts: &[Tensor], f: impl Fn(Real, Real) -> Real) -> ModelResult<Tensor> {
    let (first, rest) = parts.split_first().ok_or(WakeError::InvalidArg {
        what: "no contributions to superpose",
    })?;
    let mut acc = first.clone();
    for part in rest {
        acc = map2(&acc, part, &f)?;
    }
    Ok(acc)
}

fn sum_of_squares(parts: &[Tensor]) -> ModelResult<Tensor> {
    let squares: Vec<Tensor> = parts.iter().map(|p| p.mapv(|v| v * v)).collect();
    fold(&squares, |a, b| a + b)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSum;

#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredSum;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxSum;

/// Root of ambient squared plus the largest added contribution squared.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqrMaxSum;

/// Convection-velocity weighted sum for meandering-aware combination.
///
/// A global convection velocity `Uc = Σ uc_i σ_i² Δc_i / Σ σ_i² Δc_i` is
/// formed from the wake-integrated deficits; each point deficit is then scaled
/// by `uc_i / Uc` before summing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSum;

impl SuperpositionModel for LinearSum {
    fn name(&self) -> &str {
        "LinearSum"
    }

    fn superpose_deficit(&self, deficits: &[Tensor]) -> ModelResult<Tensor> {
        fold(deficits, |a, b| a + b)
    }
}

impl SuperpositionModel for SquaredSum {
    fn name(&self) -> &str {
        "SquaredSum"
    }

    fn superpose_deficit(&self, deficits: &[Tensor]) -> ModelResult<Tensor> {
        Ok(sum_of_squares(deficits)?.mapv_into(Real::sqrt))
    }
}

impl SuperpositionModel for MaxSum {
    fn name(&self) -> &str {
        "MaxSum"
    }

    fn superpose_deficit(&self, deficits: &[Tensor]) -> ModelResult<Tensor> {
        fold(deficits, Real::max)
    }
}

impl SuperpositionModel for WeightedSum {
    fn name(&self) -> &str {
        "WeightedSum"
    }

    fn superpose_deficit(&self, deficits: &[Tensor]) -> ModelResult<Tensor> {
        // plain deficits (e.g. mirrored image sources) carry no convection terms
        trace!("WeightedSum falling back to linear sum for plain deficits");
        LinearSum.superpose_deficit(deficits)
    }

    fn requires_convection(&self) -> bool {
        true
    }

    fn superpose_convection(&self, terms: &[ConvectionTerms]) -> ModelResult<Tensor> {
        let mut numerators = Vec::with_capacity(terms.len());
        let mut denominators = Vec::with_capacity(terms.len());
        for t in terms {
            let flux = map2(&t.sigma_sqr, &t.deficit_centre, |s2, dc| s2 * dc)?;
            numerators.push(map2(&flux, &t.uc, |f, uc| f * uc)?);
            denominators.push(flux);
        }
        let num = fold(&numerators, |a, b| a + b)?;
        let den = fold(&denominators, |a, b| a + b)?;
        let uc_global = map2(&num, &den, |n, d| n / floor_positive(d))?;

        let weighted = terms
            .iter()
            .map(|t| {
                Ok(map3(&t.uc, &uc_global, &t.deficit, |uc, ucg, p| {
                    uc / floor_positive(ucg) * p
                })?)
            })
            .collect::<ModelResult<Vec<_>>>()?;
        fold(&weighted, |a, b| a + b)
    }
}

impl AddedTurbulenceSuperposition for LinearSum {
    fn name(&self) -> &str {
        "LinearSum"
    }

    fn calc_effective_ti(&self, ti: &Tensor, added: &[Tensor]) -> ModelResult<Tensor> {
        if added.is_empty() {
            return Ok(ti.clone());
        }
        Ok(map2(ti, &fold(added, |a, b| a + b)?, |t, a| t + a)?)
    }
}

impl AddedTurbulenceSuperposition for SquaredSum {
    fn name(&self) -> &str {
        "SquaredSum"
    }

    fn calc_effective_ti(&self, ti: &Tensor, added: &[Tensor]) -> ModelResult<Tensor> {
        if added.is_empty() {
            return Ok(ti.clone());
        }
        Ok(map2(ti, &sum_of_squares(added)?, |t, s| (t * t + s).sqrt())?)
    }
}

impl AddedTurbulenceSuperposition for MaxSum {
    fn name(&self) -> &str {
        "MaxSum"
    }

    fn calc_effective_ti(&self, ti: &Tensor, added: &[Tensor]) -> ModelResult<Tensor> {
        if added.is_empty() {
            return Ok(ti.clone());
        }
        Ok(map2(ti, &fold(added, Real::max)?, |t, m| t + m)?)
    }
}

impl AddedTurbulenceSuperposition for SqrMaxSum {
    fn name(&self) -> &str {
        "SqrMaxSum"
    }

    fn calc_effective_ti(&self, ti: &Tensor, added: &[Tensor]) -> ModelResult<Tensor> {
        if added.is_empty() {
            return Ok(ti.clone());
        }
        Ok(map2(ti, &fold(added, Real::max)?, |t, m| (t * t + m * m).sqrt())?)
    }
}
