//! Farm-wide defaults injected into models.

use std::fmt;
use std::sync::Arc;

use crate::superposition::{LinearSum, SuperpositionModel};

/// Defaults a model may fall back on once it belongs to a wind-farm model.
#[derive(Clone)]
pub struct FarmContext {
    superposition: Arc<dyn SuperpositionModel>,
}

impl FarmContext {
    pub fn new(superposition: Arc<dyn SuperpositionModel>) -> Self {
        Self { superposition }
    }

    /// Default superposition model of the farm.
    pub fn superposition(&self) -> &Arc<dyn SuperpositionModel> {
        &self.superposition
    }
}

impl Default for FarmContext {
    fn default() -> Self {
        Self::new(Arc::new(LinearSum))
    }
}

impl fmt::Debug for FarmContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FarmContext")
            .field("superposition", &self.superposition.name())
            .finish()
    }
}

/// Whether a model has been attached to a farm context.
#[derive(Clone, Debug, Default)]
pub enum Attachment {
    /// Instantiated on its own, e.g. for inspection.
    #[default]
    Standalone,
    Attached(Arc<FarmContext>),
}

impl Attachment {
    pub fn context(&self) -> Option<&Arc<FarmContext>> {
        match self {
            Attachment::Standalone => None,
            Attachment::Attached(ctx) => Some(ctx),
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, Attachment::Attached(_))
    }
}
