//! Instantiate configured models and attach them to one farm context.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use wf_core::{ArgSet, ModelInputs, Real, Tensor};
use wf_models::{
    AddedTurbulenceSuperposition, AreaOverlapAvgModel, BastankhahGaussianDeficit,
    BlockageDeficitModel, CrespoHernandez, DeficitBase, DeficitModel, DeflectionModel,
    FarmContext, GridRotorAvg, GroundModel, JimenezWakeDeflection, LinearSum, MaxSum, Mirror,
    ModelConfig, ModelContainer, ModelError, ModelResult, NojDeficit, RotorAvgModel, RotorCenter,
    SelfSimilarityDeficit, SqrMaxSum, SquaredSum, SuperpositionModel, TurbulenceModel,
    WeightedSum, evaluate_added_turbulence_field, evaluate_blockage_field,
    evaluate_deficit_field,
};

use crate::registry::{self, ModelCategory, ModelEntry};
use crate::schema::{ModelSpec, WakeConfig};
use crate::validate::{check_model, check_value};
use crate::{ProjectError, ProjectResult};

/// Upper bound on `GridRotorAvg.n`; the grid holds `n²` nodes.
pub const MAX_GRID_N: u64 = 64;

/// Constructor parameters of one configured model.
struct Params<'a> {
    entry: &'static ModelEntry,
    cfg: &'a ModelConfig,
}

impl<'a> Params<'a> {
    fn new(cfg: &'a ModelConfig, category: ModelCategory) -> ProjectResult<Self> {
        let entry =
            registry::find(&cfg.model, category).ok_or_else(|| ProjectError::UnknownModel {
                name: cfg.model.clone(),
            })?;
        let params = Self { entry, cfg };
        if let Some(unknown) = cfg.params.keys().find(|k| !entry.accepts(k)) {
            return Err(params.invalid(unknown, "unknown parameter"));
        }
        Ok(params)
    }

    fn invalid(&self, param: &str, reason: &str) -> ProjectError {
        ProjectError::InvalidParam {
            model: self.entry.name.to_string(),
            param: param.to_string(),
            reason: reason.to_string(),
        }
    }

    fn value(&self, name: &str) -> Option<&'a Value> {
        self.cfg.params.get(name).filter(|v| !v.is_null())
    }

    fn real(&self, name: &str, default: Real) -> ProjectResult<Real> {
        match self.value(name) {
            None => Ok(default),
            Some(v) => v
                .as_f64()
                .ok_or_else(|| self.invalid(name, "expected a number")),
        }
    }

    fn flag(&self, name: &str, default: bool) -> ProjectResult<bool> {
        match self.value(name) {
            None => Ok(default),
            Some(v) => v
                .as_bool()
                .ok_or_else(|| self.invalid(name, "expected true or false")),
        }
    }

    fn count(&self, name: &str, default: u64) -> ProjectResult<u64> {
        match self.value(name) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .ok_or_else(|| self.invalid(name, "expected a non-negative integer")),
        }
    }

    /// Nested model parameter: `default` when absent, nothing when `null`.
    fn model(
        &self,
        name: &str,
        category: ModelCategory,
        default: Option<&str>,
    ) -> ProjectResult<Option<ModelConfig>> {
        match self.cfg.params.get(name) {
            None => Ok(default.map(ModelConfig::new)),
            Some(Value::Null) => Ok(None),
            Some(v) => check_value(v, category, name).map(Some),
        }
    }
}

fn unknown(name: &str) -> ProjectError {
    ProjectError::UnknownModel {
        name: name.to_string(),
    }
}

pub fn superposition(cfg: &ModelConfig) -> ProjectResult<Arc<dyn SuperpositionModel>> {
    Params::new(cfg, ModelCategory::Superposition)?;
    Ok(match cfg.model.as_str() {
        "LinearSum" => Arc::new(LinearSum),
        "SquaredSum" => Arc::new(SquaredSum),
        "MaxSum" => Arc::new(MaxSum),
        "WeightedSum" => Arc::new(WeightedSum),
        other => return Err(unknown(other)),
    })
}

pub fn added_turbulence_superposition(
    cfg: &ModelConfig,
) -> ProjectResult<Box<dyn AddedTurbulenceSuperposition>> {
    Params::new(cfg, ModelCategory::AddedTurbulenceSuperposition)?;
    Ok(match cfg.model.as_str() {
        "SqrMaxSum" => Box::new(SqrMaxSum),
        "LinearSum" => Box::new(LinearSum),
        "SquaredSum" => Box::new(SquaredSum),
        "MaxSum" => Box::new(MaxSum),
        other => return Err(unknown(other)),
    })
}

pub fn rotor_avg(cfg: &ModelConfig) -> ProjectResult<Box<dyn RotorAvgModel>> {
    let p = Params::new(cfg, ModelCategory::RotorAvg)?;
    Ok(match cfg.model.as_str() {
        "RotorCenter" => Box::new(RotorCenter),
        "GridRotorAvg" => {
            let n = p.count("n", 4)?;
            if n > MAX_GRID_N {
                let reason = format!("expected at most {MAX_GRID_N} nodes per axis");
                return Err(p.invalid("n", &reason));
            }
            Box::new(GridRotorAvg::new(n as usize).map_err(ModelError::from)?)
        }
        "AreaOverlapAvgModel" => Box::new(AreaOverlapAvgModel),
        other => return Err(unknown(other)),
    })
}

pub fn ground(cfg: &ModelConfig) -> ProjectResult<Box<dyn GroundModel>> {
    let p = Params::new(cfg, ModelCategory::Ground)?;
    match cfg.model.as_str() {
        "Mirror" => {
            let own = p.model("superposition_model", ModelCategory::Superposition, None)?;
            Ok(match own {
                Some(s) => Box::new(Mirror::with_superposition(superposition(&s)?)),
                None => Box::new(Mirror::new()),
            })
        }
        other => Err(unknown(other)),
    }
}

fn deficit_base(p: &Params<'_>) -> ProjectResult<DeficitBase> {
    let rotor = p
        .model("rotor_avg_model", ModelCategory::RotorAvg, None)?
        .map(|c| rotor_avg(&c))
        .transpose()?;
    let ground_model = p
        .model("ground_model", ModelCategory::Ground, None)?
        .map(|c| ground(&c))
        .transpose()?;
    Ok(DeficitBase::new(
        rotor,
        ground_model,
        p.flag("use_effective_ws", true)?,
        p.flag("use_effective_ti", false)?,
    ))
}

pub fn wake_deficit(cfg: &ModelConfig) -> ProjectResult<Box<dyn DeficitModel>> {
    let p = Params::new(cfg, ModelCategory::WakeDeficit)?;
    let base = deficit_base(&p)?;
    Ok(match cfg.model.as_str() {
        "NOJDeficit" => Box::new(NojDeficit::with_base(
            p.real("k", NojDeficit::DEFAULT_K)?,
            base,
        )),
        "BastankhahGaussianDeficit" => Box::new(BastankhahGaussianDeficit::with_base(
            p.real("k", BastankhahGaussianDeficit::DEFAULT_K)?,
            base,
        )),
        other => return Err(unknown(other)),
    })
}

pub fn blockage_deficit(cfg: &ModelConfig) -> ProjectResult<Box<dyn BlockageDeficitModel>> {
    let p = Params::new(cfg, ModelCategory::BlockageDeficit)?;
    match cfg.model.as_str() {
        "SelfSimilarityDeficit" => {
            let mut model = SelfSimilarityDeficit::new()
                .with_base(deficit_base(&p)?)
                .upstream_only(p.flag("upstream_only", false)?)
                .with_limiter(p.real("limiter", 1e-10)?)
                .exclude_wake(p.flag("exclude_wake", true)?);
            model.ss_gamma = p.real("ss_gamma", model.ss_gamma)?;
            model.ss_lambda = p.real("ss_lambda", model.ss_lambda)?;
            model.ss_eta = p.real("ss_eta", model.ss_eta)?;
            model.ss_alpha = p.real("ss_alpha", model.ss_alpha)?;
            model.ss_beta = p.real("ss_beta", model.ss_beta)?;
            if let Some(s) = p.model("superposition_model", ModelCategory::Superposition, None)? {
                model = model.with_superposition(superposition(&s)?);
            }
            Ok(Box::new(model))
        }
        other => Err(unknown(other)),
    }
}

pub fn turbulence(cfg: &ModelConfig) -> ProjectResult<Box<dyn TurbulenceModel>> {
    let p = Params::new(cfg, ModelCategory::Turbulence)?;
    match cfg.model.as_str() {
        "CrespoHernandez" => {
            let added = p
                .model(
                    "addedTurbSuperpositionModel",
                    ModelCategory::AddedTurbulenceSuperposition,
                    Some("SqrMaxSum"),
                )?
                .unwrap_or_else(|| ModelConfig::new("SqrMaxSum"));
            let rotor = p
                .model(
                    "rotor_avg_model",
                    ModelCategory::RotorAvg,
                    Some("AreaOverlapAvgModel"),
                )?
                .map(|c| rotor_avg(&c))
                .transpose()?;
            let ground_model = p
                .model("ground_model", ModelCategory::Ground, None)?
                .map(|c| ground(&c))
                .transpose()?;
            Ok(Box::new(CrespoHernandez::new(
                added_turbulence_superposition(&added)?,
                rotor,
                ground_model,
            )))
        }
        other => Err(unknown(other)),
    }
}

pub fn deflection(cfg: &ModelConfig) -> ProjectResult<Box<dyn DeflectionModel>> {
    let p = Params::new(cfg, ModelCategory::Deflection)?;
    match cfg.model.as_str() {
        "JimenezWakeDeflection" => Ok(Box::new(JimenezWakeDeflection::new(p.real("beta", 0.1)?))),
        other => Err(unknown(other)),
    }
}

/// Area-overlap rotor averaging is only valid for hard-edged wakes.
fn check_top_hat(container: &ModelContainer, is_top_hat: bool, model: &str) -> ProjectResult<()> {
    if let Some(rotor_avg) = container.rotor_avg() {
        if rotor_avg.requires_top_hat() && !is_top_hat {
            return Err(ProjectError::Incompatible {
                what: format!(
                    "{} needs a top-hat wake model, but {} is not",
                    rotor_avg.name(),
                    model
                ),
            });
        }
    }
    Ok(())
}

fn check_deficit_top_hat<M: DeficitModel + ?Sized>(model: &M) -> ProjectResult<()> {
    check_top_hat(model.base().container(), model.is_top_hat(), model.name())
}

fn check_turbulence_top_hat(model: &dyn TurbulenceModel) -> ProjectResult<()> {
    check_top_hat(model.container(), model.is_top_hat(), model.name())
}

/// Models of one engineering wind-farm model sharing a farm context.
#[derive(Debug)]
pub struct FarmModels {
    context: Arc<FarmContext>,
    pub wake_deficit: Box<dyn DeficitModel>,
    pub blockage_deficit: Option<Box<dyn BlockageDeficitModel>>,
    pub turbulence: Option<Box<dyn TurbulenceModel>>,
    pub deflection: Option<Box<dyn DeflectionModel>>,
}

impl FarmModels {
    pub fn context(&self) -> &Arc<FarmContext> {
        &self.context
    }

    pub fn superposition(&self) -> &dyn SuperpositionModel {
        self.context.superposition().as_ref()
    }

    /// Every named input any of the models may read.
    pub fn required_args(&self) -> ArgSet {
        let mut args = self.wake_deficit.args4deficit();
        if let Some(blockage) = &self.blockage_deficit {
            args |= blockage.args4deficit();
        }
        if let Some(turbulence) = &self.turbulence {
            args |= turbulence.args4addturb();
        }
        if let Some(deflection) = &self.deflection {
            args |= deflection.args4deflection();
        }
        args
    }

    /// Inputs with distances measured from the deflected wake centreline.
    pub fn deflect(&self, inputs: &ModelInputs) -> ModelResult<ModelInputs> {
        match &self.deflection {
            Some(deflection) => deflection.evaluate(inputs)?.apply(inputs),
            None => Ok(inputs.clone()),
        }
    }

    pub fn deficit_field(&self, sources: &[ModelInputs]) -> ModelResult<Tensor> {
        evaluate_deficit_field(self.wake_deficit.as_ref(), self.superposition(), sources)
    }

    pub fn blockage_field(&self, sources: &[ModelInputs]) -> ModelResult<Option<Tensor>> {
        self.blockage_deficit
            .as_deref()
            .map(|model| evaluate_blockage_field(model, sources))
            .transpose()
    }

    /// Effective turbulence intensity; the ambient value without a turbulence model.
    pub fn effective_ti(&self, ti: &Tensor, sources: &[ModelInputs]) -> ModelResult<Tensor> {
        match &self.turbulence {
            Some(model) => evaluate_added_turbulence_field(model.as_ref(), ti, sources),
            None => Ok(ti.clone()),
        }
    }

    /// Configuration reproducing these models.
    pub fn describe(&self, name: impl Into<String>) -> WakeConfig {
        WakeConfig {
            name: name.into(),
            superposition_model: Some(self.superposition().config().into()),
            wake_deficit_model: self.wake_deficit.config().into(),
            blockage_deficit_model: self.blockage_deficit.as_ref().map(|m| m.config().into()),
            turbulence_model: self.turbulence.as_ref().map(|m| m.config().into()),
            deflection_model: self.deflection.as_ref().map(|m| m.config().into()),
        }
    }
}

/// Instantiate every configured model, check that they fit together and attach
/// them to one farm context.
pub fn build_models(config: &WakeConfig) -> ProjectResult<FarmModels> {
    let superposition_model = match &config.superposition_model {
        Some(spec) => superposition(check_model(
            spec,
            ModelCategory::Superposition,
            "superposition_model",
        )?)?,
        None => Arc::new(LinearSum),
    };
    let mut wake = wake_deficit(check_model(
        &config.wake_deficit_model,
        ModelCategory::WakeDeficit,
        "wake_deficit_model",
    )?)?;
    let mut blockage = optional(
        config.blockage_deficit_model.as_ref(),
        ModelCategory::BlockageDeficit,
        "blockage_deficit_model",
        blockage_deficit,
    )?;
    let mut turbulence_model = optional(
        config.turbulence_model.as_ref(),
        ModelCategory::Turbulence,
        "turbulence_model",
        turbulence,
    )?;
    let deflection_model = optional(
        config.deflection_model.as_ref(),
        ModelCategory::Deflection,
        "deflection_model",
        deflection,
    )?;

    if superposition_model.requires_convection() && wake.as_convection().is_none() {
        return Err(ProjectError::Incompatible {
            what: format!(
                "{} needs a convection deficit model, but {} is not",
                superposition_model.name(),
                wake.name()
            ),
        });
    }
    check_deficit_top_hat(wake.as_ref())?;
    if let Some(b) = &blockage {
        check_deficit_top_hat(b.as_ref())?;
    }
    if let Some(t) = &turbulence_model {
        check_turbulence_top_hat(t.as_ref())?;
    }

    let context = Arc::new(FarmContext::new(superposition_model));
    wake.attach(&context);
    if let Some(b) = blockage.as_mut() {
        b.attach(&context);
    }
    if let Some(t) = turbulence_model.as_mut() {
        t.attach(&context);
    }

    debug!(
        name = %config.name,
        superposition = context.superposition().name(),
        wake_deficit = wake.name(),
        blockage_deficit = blockage.as_ref().map(|m| m.name()),
        turbulence = turbulence_model.as_ref().map(|m| m.name()),
        deflection = deflection_model.as_ref().map(|m| m.name()),
        "built farm models"
    );

    Ok(FarmModels {
        context,
        wake_deficit: wake,
        blockage_deficit: blockage,
        turbulence: turbulence_model,
        deflection: deflection_model,
    })
}

fn optional<T>(
    spec: Option<&ModelSpec>,
    category: ModelCategory,
    arg: &str,
    build: impl Fn(&ModelConfig) -> ProjectResult<T>,
) -> ProjectResult<Option<T>> {
    spec.map(|s| check_model(s, category, arg).and_then(&build))
        .transpose()
}
