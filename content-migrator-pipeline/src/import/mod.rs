//! Import pipeline: target probing, item and asset reconciliation, and the
//! language variant workflow driver.
//!
//! Stages run strictly in order — item shells, then assets, then language
//! variants — so every codename a variant references is resolvable in the
//! target by the time its elements are upserted.

pub mod assets;
pub mod context;
pub mod items;
pub mod variants;

pub use context::{
    build_import_context, AssetTargetState, CodenameExternalIds, ExternalIdGenerator,
    ImportContext, ItemTargetState, ScheduledState, TargetVariant, VariantTargetState,
    WorkflowState,
};

use tracing::{info, instrument};

use content_migrator_api::ManagementApi;
use content_migrator_shared::types::MigrationData;

use crate::errors::ImportError;
use crate::harness::CancellationFlag;

/// Configuration of one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Abort the run on the first per-item failure.
    pub fail_on_error: bool,
    /// Reconcile into a target that already contains snapshot items.
    /// Without this the import refuses to mutate such a target.
    pub force: bool,
    pub cancellation: Option<CancellationFlag>,
}

/// Counters reported after a completed import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub items_imported: usize,
    pub assets_uploaded: usize,
    pub assets_updated: usize,
    pub variants_imported: usize,
}

/// Runs the full import: snapshot validation, target probing, item shells,
/// assets, language variants.
#[instrument(skip_all, fields(item_count = data.items.len(), asset_count = data.assets.len()))]
pub async fn import(
    api: &dyn ManagementApi,
    data: &MigrationData,
    external_ids: &dyn ExternalIdGenerator,
    config: &ImportConfig,
) -> Result<ImportSummary, ImportError> {
    data.validate()?;

    let mut context = build_import_context(api, data, external_ids).await?;

    if !config.force {
        let existing = context.existing_snapshot_items(data);
        if let Some(first) = existing.first() {
            return Err(ImportError::TargetNotEmpty {
                count: existing.len(),
                first: first.clone(),
            });
        }
    }

    let created_items = items::import_content_items(api, data, &context, config).await?;
    let items_imported = created_items.len();
    for item in created_items {
        context.record_created_item(item);
    }

    let asset_outcome = assets::import_assets(api, data, &context, config).await?;
    let assets_uploaded = asset_outcome.uploaded.len();
    let assets_updated = asset_outcome.updated.len();
    for asset in asset_outcome.uploaded.into_iter().chain(asset_outcome.updated) {
        context.record_created_asset(asset);
    }

    let variants_imported = variants::import_language_variants(api, data, &context, config).await?;

    let summary = ImportSummary {
        items_imported,
        assets_uploaded,
        assets_updated,
        variants_imported,
    };
    info!(
        items = summary.items_imported,
        assets_uploaded = summary.assets_uploaded,
        assets_updated = summary.assets_updated,
        variants = summary.variants_imported,
        "import complete"
    );
    Ok(summary)
}
