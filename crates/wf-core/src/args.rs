//! Named physical quantities and the argument sets models declare.
//!
//! Every model method publishes a static [`Signature`]. The set of quantities
//! a model requires is the union of the signatures of the methods it calls, so
//! composing models is a plain set union over declared data.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeSet;
use std::ops::{BitOr, BitOrAssign};

use crate::error::WakeError;

/// Identifier of a named quantity supplied by the farm driver.
///
/// The suffix of the name lists the tensor axes the quantity varies along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArgKey {
    /// Downwind distance, source to destination, after deflection
    #[cfg_attr(feature = "serde", serde(rename = "dw_ijlk"))]
    DwIjlk,
    /// Horizontal crosswind distance after deflection
    #[cfg_attr(feature = "serde", serde(rename = "hcw_ijlk"))]
    HcwIjlk,
    /// Vertical distance after deflection
    #[cfg_attr(feature = "serde", serde(rename = "dh_ijlk"))]
    DhIjlk,
    /// Total crosswind distance, `sqrt(hcw² + dh²)`
    #[cfg_attr(feature = "serde", serde(rename = "cw_ijlk"))]
    CwIjlk,
    /// Downwind distance before deflection
    #[cfg_attr(feature = "serde", serde(rename = "dw_ijl"))]
    DwIjl,
    #[cfg_attr(feature = "serde", serde(rename = "hcw_ijl"))]
    HcwIjl,
    #[cfg_attr(feature = "serde", serde(rename = "dh_ijl"))]
    DhIjl,
    /// Rotor diameter of the source turbine
    #[cfg_attr(feature = "serde", serde(rename = "D_src_il"))]
    DSrcIl,
    /// Rotor diameter at the destination (zero for plain field points)
    #[cfg_attr(feature = "serde", serde(rename = "D_dst_ijl"))]
    DDstIjl,
    /// Hub height of the source turbine
    #[cfg_attr(feature = "serde", serde(rename = "h_ilk"))]
    HIlk,
    #[cfg_attr(feature = "serde", serde(rename = "ct_ilk"))]
    CtIlk,
    #[cfg_attr(feature = "serde", serde(rename = "WS_ilk"))]
    WsIlk,
    #[cfg_attr(feature = "serde", serde(rename = "WS_eff_ilk"))]
    WsEffIlk,
    #[cfg_attr(feature = "serde", serde(rename = "TI_ilk"))]
    TiIlk,
    #[cfg_attr(feature = "serde", serde(rename = "TI_eff_ilk"))]
    TiEffIlk,
    /// Yaw misalignment [deg]
    #[cfg_attr(feature = "serde", serde(rename = "yaw_ilk"))]
    YawIlk,
    /// Rotor tilt [deg]
    #[cfg_attr(feature = "serde", serde(rename = "tilt_ilk"))]
    TiltIlk,
    #[cfg_attr(feature = "serde", serde(rename = "wake_radius_ijlk"))]
    WakeRadiusIjlk,
}

impl ArgKey {
    pub const ALL: [ArgKey; 18] = [
        ArgKey::DwIjlk,
        ArgKey::HcwIjlk,
        ArgKey::DhIjlk,
        ArgKey::CwIjlk,
        ArgKey::DwIjl,
        ArgKey::HcwIjl,
        ArgKey::DhIjl,
        ArgKey::DSrcIl,
        ArgKey::DDstIjl,
        ArgKey::HIlk,
        ArgKey::CtIlk,
        ArgKey::WsIlk,
        ArgKey::WsEffIlk,
        ArgKey::TiIlk,
        ArgKey::TiEffIlk,
        ArgKey::YawIlk,
        ArgKey::TiltIlk,
        ArgKey::WakeRadiusIjlk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArgKey::DwIjlk => "dw_ijlk",
            ArgKey::HcwIjlk => "hcw_ijlk",
            ArgKey::DhIjlk => "dh_ijlk",
            ArgKey::CwIjlk => "cw_ijlk",
            ArgKey::DwIjl => "dw_ijl",
            ArgKey::HcwIjl => "hcw_ijl",
            ArgKey::DhIjl => "dh_ijl",
            ArgKey::DSrcIl => "D_src_il",
            ArgKey::DDstIjl => "D_dst_ijl",
            ArgKey::HIlk => "h_ilk",
            ArgKey::CtIlk => "ct_ilk",
            ArgKey::WsIlk => "WS_ilk",
            ArgKey::WsEffIlk => "WS_eff_ilk",
            ArgKey::TiIlk => "TI_ilk",
            ArgKey::TiEffIlk => "TI_eff_ilk",
            ArgKey::YawIlk => "yaw_ilk",
            ArgKey::TiltIlk => "tilt_ilk",
            ArgKey::WakeRadiusIjlk => "wake_radius_ijlk",
        }
    }

    /// Key selecting freestream or effective wind speed.
    pub fn wind_speed(use_effective: bool) -> ArgKey {
        if use_effective {
            ArgKey::WsEffIlk
        } else {
            ArgKey::WsIlk
        }
    }

    /// Key selecting freestream or effective turbulence intensity.
    pub fn turbulence_intensity(use_effective: bool) -> ArgKey {
        if use_effective {
            ArgKey::TiEffIlk
        } else {
            ArgKey::TiIlk
        }
    }
}

impl fmt::Display for ArgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArgKey {
    type Err = WakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArgKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(WakeError::InvalidArg {
                what: "unknown quantity name",
            })
    }
}

/// One entry of a method's parameter list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    /// The model itself
    Receiver,
    /// A named quantity
    Key(ArgKey),
    /// Rest placeholder; the matching inputs are pulled in through other signatures
    Variadic,
}

/// Declared parameter list of a model method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub params: &'static [Param],
}

impl Signature {
    pub const EMPTY: Signature = Signature { params: &[] };

    pub const fn new(params: &'static [Param]) -> Self {
        Self { params }
    }
}

/// Named quantities of a signature, without receiver and variadic placeholders.
pub fn method_args(signature: Signature) -> ArgSet {
    signature
        .params
        .iter()
        .filter_map(|p| match p {
            Param::Key(key) => Some(*key),
            Param::Receiver | Param::Variadic => None,
        })
        .collect()
}

/// Unordered set of unique quantity keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ArgSet(BTreeSet<ArgKey>);

impl ArgSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ArgKey) -> bool {
        self.0.insert(key)
    }

    pub fn contains(&self, key: ArgKey) -> bool {
        self.0.contains(&key)
    }

    pub fn is_superset(&self, other: &ArgSet) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ArgKey> + '_ {
        self.0.iter().copied()
    }

    /// Sorted quantity names.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.iter().map(ArgKey::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<ArgKey> for ArgSet {
    fn from_iter<I: IntoIterator<Item = ArgKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[ArgKey; N]> for ArgSet {
    fn from(keys: [ArgKey; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl BitOrAssign<ArgSet> for ArgSet {
    fn bitor_assign(&mut self, rhs: ArgSet) {
        self.0.extend(rhs.0);
    }
}

impl BitOrAssign<&ArgSet> for ArgSet {
    fn bitor_assign(&mut self, rhs: &ArgSet) {
        self.0.extend(rhs.0.iter().copied());
    }
}

impl BitOr for ArgSet {
    type Output = ArgSet;

    fn bitor(mut self, rhs: ArgSet) -> ArgSet {
        self |= rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIG: Signature = Signature::new(&[
        Param::Receiver,
        Param::Key(ArgKey::DwIjlk),
        Param::Key(ArgKey::CtIlk),
        Param::Key(ArgKey::DwIjlk),
        Param::Variadic,
    ]);

    #[test]
    fn method_args_skips_placeholders() {
        let args = method_args(SIG);
        assert_eq!(args, ArgSet::from([ArgKey::DwIjlk, ArgKey::CtIlk]));
    }

    #[test]
    fn variadic_only_resolves_to_empty() {
        const REST: Signature = Signature::new(&[Param::Receiver, Param::Variadic]);
        assert!(method_args(REST).is_empty());
        assert!(method_args(Signature::EMPTY).is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        assert_eq!(method_args(SIG), method_args(SIG));
    }

    #[test]
    fn names_round_trip() {
        for key in ArgKey::ALL {
            assert_eq!(key.as_str().parse::<ArgKey>().unwrap(), key);
        }
        assert!("rho_ilk".parse::<ArgKey>().is_err());
    }

    #[test]
    fn union_keeps_both_sides() {
        let mut a = ArgSet::from([ArgKey::DwIjlk]);
        a |= ArgSet::from([ArgKey::CwIjlk, ArgKey::DwIjlk]);
        assert_eq!(a.len(), 2);
        assert_eq!(a.names(), vec!["cw_ijlk", "dw_ijlk"]);
    }

    #[test]
    fn selectors_pick_keys() {
        assert_eq!(ArgKey::wind_speed(true), ArgKey::WsEffIlk);
        assert_eq!(ArgKey::wind_speed(false), ArgKey::WsIlk);
        assert_eq!(ArgKey::turbulence_intensity(true), ArgKey::TiEffIlk);
        assert_eq!(ArgKey::turbulence_intensity(false), ArgKey::TiIlk);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn union_is_superset_of_parts(
            a in prop::collection::vec(0usize..ArgKey::ALL.len(), 0..8),
            b in prop::collection::vec(0usize..ArgKey::ALL.len(), 0..8),
        ) {
            let left: ArgSet = a.iter().map(|&i| ArgKey::ALL[i]).collect();
            let right: ArgSet = b.iter().map(|&i| ArgKey::ALL[i]).collect();
            let union = left.clone() | right.clone();
            prop_assert!(union.is_superset(&left));
            prop_assert!(union.is_superset(&right));
        }
    }
}
