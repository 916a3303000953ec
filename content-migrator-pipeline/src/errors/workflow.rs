//! Error types for workflow lookups and path search.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow '{0}' not found")]
    WorkflowNotFound(String),

    #[error("step '{step}' not found in workflow '{workflow}'")]
    StepNotFound { workflow: String, step: String },

    #[error("no transition path from step '{from}' to step '{to}' in workflow '{workflow}'")]
    NoPath {
        workflow: String,
        from: String,
        to: String,
    },
}
