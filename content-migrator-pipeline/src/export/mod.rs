//! Export pipeline: environment/context fetching and snapshot production.

pub mod context;
pub mod manager;

pub use context::{
    build_export_context, load_environment_data, AssetSourceState, ExportConfig, ExportContext,
    ExportItem, ExportRequest, ExportVersion, ItemSourceState, ReferencedData,
};
pub use manager::{export, export_migration_data};
