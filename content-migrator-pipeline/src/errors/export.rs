//! Error types for the export pipeline.
use content_migrator_api::ApiError;
use content_migrator_shared::types::SnapshotValidationError;
use thiserror::Error;

use super::harness::ErrorClass;
use super::transform::TransformError;
use super::workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("management API error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A codename referenced by an export item does not resolve in the
    /// source environment data.
    #[error("{entity} '{name}' not found in the source environment")]
    Lookup { entity: &'static str, name: String },

    #[error("snapshot validation failed: {0}")]
    Validation(#[from] SnapshotValidationError),

    #[error("export cancelled")]
    Cancelled,
}

impl ExportError {
    pub fn lookup(entity: &'static str, name: impl Into<String>) -> Self {
        Self::Lookup {
            entity,
            name: name.into(),
        }
    }
}

impl ErrorClass for ExportError {
    fn is_not_found(&self) -> bool {
        matches!(self, ExportError::Api(api) if api.is_not_found())
    }
}
