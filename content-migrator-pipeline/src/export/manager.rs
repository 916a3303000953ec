//! Export manager: maps export items into the migration snapshot and
//! downloads referenced asset binaries.

use std::collections::BTreeMap;

use tracing::{error, info, instrument};

use content_migrator_api::models::Asset;
use content_migrator_api::ManagementApi;
use content_migrator_shared::types::{
    AssetDescription, CodenameReference, EnvironmentData, MigrationAsset, MigrationData,
    MigrationItem, MigrationItemSystem, MigrationItemVersion, MigrationSchedule,
};

use crate::errors::{ExportError, TransformError};
use crate::export::context::{
    build_export_context, AssetSourceState, ExportConfig, ExportContext, ExportItem,
    ExportRequest,
};
use crate::harness::{process_items, ItemResult, ProcessConfig};
use crate::transform::{describe_reference, export_element};

/// Concurrent asset binary downloads.
const ASSET_DOWNLOAD_PARALLELISM: usize = 5;

/// Runs the full export: context fetch, element mapping, asset download,
/// snapshot validation.
pub async fn export(
    api: &dyn ManagementApi,
    requests: &[ExportRequest],
    config: &ExportConfig,
) -> Result<MigrationData, ExportError> {
    let context = build_export_context(api, requests, config).await?;
    export_migration_data(api, &context, config).await
}

/// Maps a prepared [`ExportContext`] into a validated [`MigrationData`].
#[instrument(skip_all, fields(item_count = context.items.len()))]
pub async fn export_migration_data(
    api: &dyn ManagementApi,
    context: &ExportContext,
    config: &ExportConfig,
) -> Result<MigrationData, ExportError> {
    let mut items = Vec::new();
    for export_item in &context.items {
        match map_migration_item(export_item, context) {
            Ok(item) => items.push(item),
            Err(err) if config.fail_on_error => return Err(err),
            Err(err) => {
                error!(
                    item = %export_item.item.codename,
                    language = %export_item.language.codename,
                    error = %err,
                    "failed to map item, omitting it from the snapshot"
                );
            }
        }
    }

    let assets = download_assets(api, context, config).await?;

    let data = MigrationData { items, assets };
    data.validate()?;
    info!(
        item_count = data.items.len(),
        asset_count = data.assets.len(),
        "export complete"
    );
    Ok(data)
}

fn map_migration_item(
    export_item: &ExportItem,
    context: &ExportContext,
) -> Result<MigrationItem, ExportError> {
    let system = MigrationItemSystem {
        name: export_item.item.name.clone(),
        codename: export_item.item.codename.clone(),
        language: CodenameReference::new(export_item.language.codename.clone()),
        item_type: CodenameReference::new(export_item.content_type.codename.clone()),
        collection: CodenameReference::new(export_item.collection.codename.clone()),
        workflow: CodenameReference::new(export_item.workflow.codename.clone()),
    };

    let mut versions = Vec::new();
    for version in &export_item.versions {
        let mut elements = BTreeMap::new();
        for wire in &version.variant.elements {
            let descriptor = wire
                .element
                .id
                .as_ref()
                .and_then(|id| export_item.content_type.element_by_id(id))
                .or_else(|| {
                    wire.element
                        .codename
                        .as_deref()
                        .and_then(|codename| {
                            export_item.content_type.element_by_codename(codename)
                        })
                })
                .ok_or_else(|| TransformError::UnknownElement {
                    element: describe_reference(&wire.element),
                    content_type: export_item.content_type.codename.clone(),
                })?;
            elements.insert(
                descriptor.codename.clone(),
                export_element(wire, descriptor, context)?,
            );
        }

        let schedule = version
            .variant
            .schedule
            .as_ref()
            .map(|wire| MigrationSchedule {
                publish_time: wire.publish_time,
                publish_display_timezone: wire.publish_display_timezone.clone(),
                unpublish_time: wire.unpublish_time,
                unpublish_display_timezone: wire.unpublish_display_timezone.clone(),
            })
            .filter(|schedule| !schedule.is_empty());

        versions.push(MigrationItemVersion {
            elements,
            schedule,
            workflow_step: CodenameReference::new(version.step_codename.clone()),
        });
    }

    Ok(MigrationItem { system, versions })
}

async fn download_assets(
    api: &dyn ManagementApi,
    context: &ExportContext,
    config: &ExportConfig,
) -> Result<Vec<MigrationAsset>, ExportError> {
    let mut assets: Vec<&Asset> = context
        .referenced
        .assets
        .values()
        .filter_map(|state| match state {
            AssetSourceState::Found(asset) => Some(asset),
            AssetSourceState::NotFound => None,
        })
        .collect();
    assets.sort_by(|a, b| a.codename.cmp(&b.codename));

    let harness = ProcessConfig {
        parallel_limit: ASSET_DOWNLOAD_PARALLELISM,
        fail_on_error: config.fail_on_error,
        cancellation: config.cancellation.clone(),
    };
    let results = process_items(
        "asset downloads",
        assets,
        &harness,
        |asset| asset.codename.clone(),
        |asset| async move {
            let binary = api.download_binary(&asset.url).await?;
            Ok::<_, ExportError>(map_migration_asset(asset, binary, &context.environment))
        },
    )
    .await?;

    Ok(results
        .into_iter()
        .filter_map(ItemResult::into_valid)
        .collect())
}

fn map_migration_asset(
    asset: &Asset,
    binary_data: Vec<u8>,
    environment: &EnvironmentData,
) -> MigrationAsset {
    let collection = asset.collection.as_ref().and_then(|reference| {
        reference
            .id
            .as_ref()
            .and_then(|id| environment.collection_by_id(id))
            .map(|c| CodenameReference::new(c.codename.clone()))
            .or_else(|| reference.codename.clone().map(CodenameReference::new))
    });
    let folder = asset.folder.as_ref().and_then(|reference| {
        reference
            .id
            .as_ref()
            .and_then(|id| environment.asset_folder_by_id(id))
            .map(|f| CodenameReference::new(f.codename.clone()))
            .or_else(|| reference.codename.clone().map(CodenameReference::new))
    });

    let descriptions = asset
        .descriptions
        .iter()
        .filter_map(|description| {
            let language = description
                .language
                .id
                .as_ref()
                .and_then(|id| environment.language_by_id(id))
                .map(|l| l.codename.clone())
                .or_else(|| description.language.codename.clone())?;
            Some(AssetDescription {
                language: CodenameReference::new(language),
                description: description.description.clone(),
            })
        })
        .collect();

    MigrationAsset {
        codename: asset.codename.clone(),
        filename: asset.file_name.clone(),
        title: asset
            .title
            .clone()
            .unwrap_or_else(|| asset.file_name.clone()),
        binary_data,
        collection,
        folder,
        descriptions,
    }
}
