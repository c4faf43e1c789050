//! wf-models: composable engineering wake models for wind farms.
//!
//! Provides:
//! - Velocity-deficit models (wake, blockage, convection form)
//! - Added-turbulence models
//! - Wake-deflection models
//! - Rotor-averaging and ground-reflection sub-models, composed through
//!   [`ModelContainer`]
//! - Superposition rules and per-source field aggregation
//!
//! Every model declares the named quantities it reads (`args4deficit`,
//! `args4addturb`, `args4deflection`) so a farm model can compute exactly
//! those inputs before calling it.
//!
//! # Example
//!
//! ```no_run
//! use wf_core::PointInputs;
//! use wf_models::{DeficitModel, NojDeficit};
//!
//! let model = NojDeficit::default();
//! let inputs = PointInputs { dw: 400.0, ..PointInputs::default() }.into_inputs();
//! let deficit = model.evaluate(&inputs).unwrap();
//! println!("deficit: {} m/s", deficit[[0, 0, 0, 0]]);
//! ```

pub mod cache;
pub mod config;
pub mod container;
pub mod context;
pub mod deficit;
pub mod deflection;
pub mod error;
pub mod field;
pub mod ground;
pub mod rotor_avg;
pub mod superposition;
pub mod turbulence;

// Re-exports
pub use config::ModelConfig;
pub use container::ModelContainer;
pub use context::{Attachment, FarmContext};
pub use deficit::{
    BastankhahGaussianDeficit, BlockageDeficitModel, BlockageSettings, ConvectionDeficitModel,
    DeficitBase, DeficitModel, NojDeficit, SelfSimilarityDeficit, WakeDeficitModel,
};
pub use deflection::{Deflected, DeflectionModel, JimenezWakeDeflection};
pub use error::{ModelError, ModelResult};
pub use field::{evaluate_added_turbulence_field, evaluate_blockage_field, evaluate_deficit_field};
pub use ground::{GroundModel, Mirror};
pub use rotor_avg::{AreaOverlapAvgModel, GridRotorAvg, RotorAvgModel, RotorCenter};
pub use superposition::{
    AddedTurbulenceSuperposition, ConvectionTerms, LinearSum, MaxSum, SqrMaxSum, SquaredSum,
    SuperpositionModel, WeightedSum,
};
pub use turbulence::{CrespoHernandez, TurbulenceModel};
