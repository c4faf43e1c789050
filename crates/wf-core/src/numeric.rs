/// Floating point type used throughout system
pub type Real = f64;

/// Floor applied to quantities whose domain excludes zero (divisions, fractional powers).
pub const EPS_POSITIVE: Real = 1e-10;

/// Clamp `v` to at least [`EPS_POSITIVE`]. NaN is mapped to the floor as well.
#[inline]
pub fn floor_positive(v: Real) -> Real {
    if v > EPS_POSITIVE { v } else { EPS_POSITIVE }
}

/// Square root with negative (round-off) arguments clamped to zero.
#[inline]
pub fn safe_sqrt(v: Real) -> Real {
    if v > 0.0 { v.sqrt() } else { 0.0 }
}

/// Fractional power of a base floored at [`EPS_POSITIVE`].
#[inline]
pub fn safe_powf(base: Real, exp: Real) -> Real {
    floor_positive(base).powf(exp)
}

/// Axial induction factor from thrust coefficient, `0.5 (1 - sqrt(1 - ct))`.
#[inline]
pub fn induction_factor(ct: Real) -> Real {
    0.5 * (1.0 - safe_sqrt(1.0 - ct))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_stay_finite() {
        assert_eq!(floor_positive(0.0), EPS_POSITIVE);
        assert_eq!(floor_positive(-3.0), EPS_POSITIVE);
        assert_eq!(floor_positive(Real::NAN), EPS_POSITIVE);
        assert_eq!(floor_positive(2.0), 2.0);
        assert_eq!(safe_sqrt(-1e-16), 0.0);
        assert!(safe_powf(0.0, -0.5).is_finite());
    }

    #[test]
    fn induction_factor_limits() {
        assert_eq!(induction_factor(0.0), 0.0);
        assert!((induction_factor(1.0) - 0.5).abs() < 1e-15);
        // ct > 1 is clamped rather than producing NaN
        assert!((induction_factor(1.2) - 0.5).abs() < 1e-15);
    }
}
