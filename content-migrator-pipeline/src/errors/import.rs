//! Error types for the import pipeline.
use content_migrator_api::ApiError;
use content_migrator_shared::types::SnapshotValidationError;
use thiserror::Error;

use super::harness::ErrorClass;
use super::transform::TransformError;
use super::workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("management API error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A codename from the snapshot does not resolve in the target
    /// environment data.
    #[error("{entity} '{name}' not found in the target environment")]
    Lookup { entity: &'static str, name: String },

    /// The snapshot carries more than one version of the same kind for an
    /// item.
    #[error("item '{item}' ({language}) has more than one {kind} version")]
    DuplicateVersion {
        item: String,
        language: String,
        kind: &'static str,
    },

    /// The target already contains snapshot items and the run was not
    /// forced.
    #[error(
        "target environment already contains {count} item(s) from the snapshot \
         (first: '{first}'); re-run with --force to overwrite"
    )]
    TargetNotEmpty { count: usize, first: String },

    #[error("snapshot validation failed: {0}")]
    Validation(#[from] SnapshotValidationError),

    #[error("import cancelled")]
    Cancelled,
}

impl ImportError {
    pub fn lookup(entity: &'static str, name: impl Into<String>) -> Self {
        Self::Lookup {
            entity,
            name: name.into(),
        }
    }
}

impl ErrorClass for ImportError {
    fn is_not_found(&self) -> bool {
        matches!(self, ImportError::Api(api) if api.is_not_found())
    }
}
