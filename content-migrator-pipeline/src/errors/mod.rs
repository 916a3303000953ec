mod export;
mod harness;
mod import;
mod transform;
mod workflow;

pub use export::ExportError;
pub use harness::ErrorClass;
pub use import::ImportError;
pub use transform::TransformError;
pub use workflow::WorkflowError;
