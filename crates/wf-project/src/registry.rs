//! Table of the models a configuration may name.
//!
//! Each entry lists the constructor parameters with their defaults. The first
//! entry of a category is that category's default model.

use std::fmt;

use serde::{Deserialize, Serialize};
use wf_core::ArgSet;
use wf_models::{
    DeficitModel, DeflectionModel, GroundModel, ModelConfig, RotorAvgModel, TurbulenceModel,
};

use crate::build;
use crate::{ProjectError, ProjectResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelCategory {
    Superposition,
    AddedTurbulenceSuperposition,
    WakeDeficit,
    BlockageDeficit,
    Turbulence,
    Deflection,
    RotorAvg,
    Ground,
}

impl ModelCategory {
    pub const ALL: [ModelCategory; 8] = [
        ModelCategory::Superposition,
        ModelCategory::AddedTurbulenceSuperposition,
        ModelCategory::WakeDeficit,
        ModelCategory::BlockageDeficit,
        ModelCategory::Turbulence,
        ModelCategory::Deflection,
        ModelCategory::RotorAvg,
        ModelCategory::Ground,
    ];

    /// Interface name used in error messages.
    pub fn type_name(self) -> &'static str {
        match self {
            ModelCategory::Superposition => "SuperpositionModel",
            ModelCategory::AddedTurbulenceSuperposition => "AddedTurbulenceSuperpositionModel",
            ModelCategory::WakeDeficit => "WakeDeficitModel",
            ModelCategory::BlockageDeficit => "BlockageDeficitModel",
            ModelCategory::Turbulence => "TurbulenceModel",
            ModelCategory::Deflection => "DeflectionModel",
            ModelCategory::RotorAvg => "RotorAvgModel",
            ModelCategory::Ground => "GroundModel",
        }
    }
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A constructor parameter and the text of its default.
pub type ParamSpec = (&'static str, &'static str);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelEntry {
    pub name: &'static str,
    pub category: ModelCategory,
    pub params: &'static [ParamSpec],
}

impl ModelEntry {
    pub fn accepts(&self, param: &str) -> bool {
        self.params.iter().any(|(name, _)| *name == param)
    }

    /// Constructor signature with defaults, e.g. `NOJDeficit(k=0.1, ...)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(name, default)| format!("{name}={default}"))
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

const DEFICIT_COMMON: [ParamSpec; 4] = [
    ("rotor_avg_model", "null"),
    ("ground_model", "null"),
    ("use_effective_ws", "true"),
    ("use_effective_ti", "false"),
];

const NOJ_PARAMS: [ParamSpec; 5] = [
    ("k", "0.1"),
    DEFICIT_COMMON[0],
    DEFICIT_COMMON[1],
    DEFICIT_COMMON[2],
    DEFICIT_COMMON[3],
];

const GAUSSIAN_PARAMS: [ParamSpec; 5] = [
    ("k", "0.0324555"),
    DEFICIT_COMMON[0],
    DEFICIT_COMMON[1],
    DEFICIT_COMMON[2],
    DEFICIT_COMMON[3],
];

const SELF_SIMILARITY_PARAMS: [ParamSpec; 13] = [
    ("ss_gamma", "1.1"),
    ("ss_lambda", "0.587"),
    ("ss_eta", "1.32"),
    ("ss_alpha", "0.8888888888888888"),
    ("ss_beta", "1.4142135623730951"),
    ("exclude_wake", "true"),
    ("upstream_only", "false"),
    ("limiter", "1e-10"),
    ("superposition_model", "null"),
    DEFICIT_COMMON[0],
    DEFICIT_COMMON[1],
    DEFICIT_COMMON[2],
    DEFICIT_COMMON[3],
];

const ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        name: "LinearSum",
        category: ModelCategory::Superposition,
        params: &[],
    },
    ModelEntry {
        name: "SquaredSum",
        category: ModelCategory::Superposition,
        params: &[],
    },
    ModelEntry {
        name: "MaxSum",
        category: ModelCategory::Superposition,
        params: &[],
    },
    ModelEntry {
        name: "WeightedSum",
        category: ModelCategory::Superposition,
        params: &[],
    },
    ModelEntry {
        name: "SqrMaxSum",
        category: ModelCategory::AddedTurbulenceSuperposition,
        params: &[],
    },
    ModelEntry {
        name: "LinearSum",
        category: ModelCategory::AddedTurbulenceSuperposition,
        params: &[],
    },
    ModelEntry {
        name: "SquaredSum",
        category: ModelCategory::AddedTurbulenceSuperposition,
        params: &[],
    },
    ModelEntry {
        name: "MaxSum",
        category: ModelCategory::AddedTurbulenceSuperposition,
        params: &[],
    },
    ModelEntry {
        name: "NOJDeficit",
        category: ModelCategory::WakeDeficit,
        params: &NOJ_PARAMS,
    },
    ModelEntry {
        name: "BastankhahGaussianDeficit",
        category: ModelCategory::WakeDeficit,
        params: &GAUSSIAN_PARAMS,
    },
    ModelEntry {
        name: "SelfSimilarityDeficit",
        category: ModelCategory::BlockageDeficit,
        params: &SELF_SIMILARITY_PARAMS,
    },
    ModelEntry {
        name: "CrespoHernandez",
        category: ModelCategory::Turbulence,
        params: &[
            ("addedTurbSuperpositionModel", "SqrMaxSum()"),
            ("rotor_avg_model", "AreaOverlapAvgModel()"),
            ("ground_model", "null"),
        ],
    },
    ModelEntry {
        name: "JimenezWakeDeflection",
        category: ModelCategory::Deflection,
        params: &[("beta", "0.1")],
    },
    ModelEntry {
        name: "RotorCenter",
        category: ModelCategory::RotorAvg,
        params: &[],
    },
    ModelEntry {
        name: "GridRotorAvg",
        category: ModelCategory::RotorAvg,
        params: &[("n", "4")],
    },
    ModelEntry {
        name: "AreaOverlapAvgModel",
        category: ModelCategory::RotorAvg,
        params: &[],
    },
    ModelEntry {
        name: "Mirror",
        category: ModelCategory::Ground,
        params: &[("superposition_model", "null")],
    },
];

/// Models of a category, default first.
pub fn models(category: ModelCategory) -> impl Iterator<Item = &'static ModelEntry> {
    ENTRIES.iter().filter(move |e| e.category == category)
}

pub fn default_model(category: ModelCategory) -> Option<&'static ModelEntry> {
    models(category).next()
}

/// Every entry registered under `name`, across categories.
pub fn lookup(name: &str) -> impl Iterator<Item = &'static ModelEntry> + '_ {
    ENTRIES.iter().filter(move |e| e.name == name)
}

pub fn find(name: &str, category: ModelCategory) -> Option<&'static ModelEntry> {
    lookup(name).find(|e| e.category == category)
}

pub fn signature(name: &str) -> ProjectResult<String> {
    lookup(name)
        .next()
        .map(ModelEntry::signature)
        .ok_or_else(|| ProjectError::UnknownModel {
            name: name.to_string(),
        })
}

/// Named inputs a default-constructed model declares.
pub fn required_args(name: &str) -> ProjectResult<ArgSet> {
    let entry = lookup(name)
        .next()
        .ok_or_else(|| ProjectError::UnknownModel {
            name: name.to_string(),
        })?;
    let cfg = ModelConfig::new(entry.name);
    let args = match entry.category {
        ModelCategory::Superposition | ModelCategory::AddedTurbulenceSuperposition => {
            ArgSet::new()
        }
        ModelCategory::WakeDeficit => build::wake_deficit(&cfg)?.args4deficit(),
        ModelCategory::BlockageDeficit => build::blockage_deficit(&cfg)?.args4deficit(),
        ModelCategory::Turbulence => build::turbulence(&cfg)?.args4addturb(),
        ModelCategory::Deflection => build::deflection(&cfg)?.args4deflection(),
        ModelCategory::RotorAvg => build::rotor_avg(&cfg)?.args4model(),
        ModelCategory::Ground => build::ground(&cfg)?.args4model(),
    };
    Ok(args)
}
