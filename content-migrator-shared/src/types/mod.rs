//! Core data structures shared by the export and import pipelines.
//!
//! The migration snapshot types (`MigrationData`, `MigrationItem`,
//! `MigrationElement`, `MigrationAsset`, `MigrationComponent`) are addressed
//! by codename exclusively; server-assigned ids never enter the snapshot.
//! The environment types (`EnvironmentData`, `Workflow`,
//! `FlattenedContentType`, ...) describe one environment's model and carry
//! both ids and codenames so the pipelines can translate between the two.

mod asset;
mod component;
mod data;
mod element;
mod environment;
mod item;
mod reference;

pub use asset::{AssetDescription, MigrationAsset};
pub use component::MigrationComponent;
pub use data::{MigrationData, SnapshotValidationError};
pub use element::{ElementKind, MigrationElement, UrlSlugMode};
pub use environment::{
    AssetFolder, Collection, EnvironmentData, FlattenedContentType, FlattenedElement, Language,
    MultipleChoiceOption, TaxonomyGroup, TaxonomyTerm, Workflow, WorkflowStep,
    ARCHIVED_STEP_CODENAME, PUBLISHED_STEP_CODENAME, SCHEDULED_STEP_CODENAME,
};
pub use item::{MigrationItem, MigrationItemSystem, MigrationItemVersion, MigrationSchedule};
pub use reference::CodenameReference;
