//! Asset importer.
//!
//! Derives two queues from the snapshot — uploads for assets the target
//! does not have, metadata edits for assets whose metadata diverged — and
//! processes them with their own parallelism limits. The binary is only
//! re-uploaded when the replacement predicate says the stored file differs.

use std::collections::HashMap;

use tracing::info;

use content_migrator_api::models::{
    Asset, AssetAdd, AssetUpsert, BinaryFileUpload, FileReference, Reference,
    WireAssetDescription,
};
use content_migrator_api::ManagementApi;
use content_migrator_shared::types::{EnvironmentData, MigrationAsset, MigrationData};

use crate::errors::ImportError;
use crate::harness::{process_items, ItemResult, ProcessConfig};
use crate::import::context::{AssetTargetState, ImportContext};
use crate::import::ImportConfig;

/// Concurrent asset binary uploads.
const ASSET_UPLOAD_PARALLELISM: usize = 3;

/// Concurrent asset metadata edits.
const ASSET_EDIT_PARALLELISM: usize = 1;

/// Assets touched by one import run.
#[derive(Debug, Default)]
pub struct AssetImportOutcome {
    pub uploaded: Vec<Asset>,
    pub updated: Vec<Asset>,
}

/// Imports the snapshot's assets into the target environment.
pub async fn import_assets(
    api: &dyn ManagementApi,
    data: &MigrationData,
    context: &ImportContext,
    config: &ImportConfig,
) -> Result<AssetImportOutcome, ImportError> {
    let mut to_upload: Vec<(&MigrationAsset, String)> = Vec::new();
    let mut to_edit: Vec<(&MigrationAsset, &Asset)> = Vec::new();

    for asset in &data.assets {
        match context.assets.get(&asset.codename) {
            Some(AssetTargetState::Missing { external_id }) => {
                to_upload.push((asset, external_id.clone()));
            }
            Some(AssetTargetState::Exists(target)) => {
                if should_update_asset(asset, target, &context.environment) {
                    to_edit.push((asset, target));
                }
            }
            None => return Err(ImportError::lookup("asset state", &asset.codename)),
        }
    }

    info!(
        upload_count = to_upload.len(),
        edit_count = to_edit.len(),
        "importing assets"
    );

    let upload_harness = ProcessConfig {
        parallel_limit: ASSET_UPLOAD_PARALLELISM,
        fail_on_error: config.fail_on_error,
        cancellation: config.cancellation.clone(),
    };
    let uploaded = process_items(
        "asset uploads",
        to_upload,
        &upload_harness,
        |(asset, _)| asset.codename.clone(),
        |(asset, external_id)| async move { upload_asset(api, context, asset, external_id).await },
    )
    .await?;

    let edit_harness = ProcessConfig {
        parallel_limit: ASSET_EDIT_PARALLELISM,
        fail_on_error: config.fail_on_error,
        cancellation: config.cancellation.clone(),
    };
    let updated = process_items(
        "asset edits",
        to_edit,
        &edit_harness,
        |(asset, _)| asset.codename.clone(),
        |(asset, target)| async move { edit_asset(api, context, asset, target).await },
    )
    .await?;

    Ok(AssetImportOutcome {
        uploaded: uploaded
            .into_iter()
            .filter_map(ItemResult::into_valid)
            .collect(),
        updated: updated
            .into_iter()
            .filter_map(ItemResult::into_valid)
            .collect(),
    })
}

async fn upload_asset(
    api: &dyn ManagementApi,
    context: &ImportContext,
    asset: &MigrationAsset,
    external_id: String,
) -> Result<Asset, ImportError> {
    let file_reference = upload_binary(api, asset).await?;
    let payload = AssetAdd {
        codename: asset.codename.clone(),
        external_id: Some(external_id),
        file_reference,
        title: asset.title.clone(),
        collection: asset
            .collection
            .as_ref()
            .map(|c| Reference::by_codename(&c.codename)),
        folder: asset
            .folder
            .as_ref()
            .map(|f| Reference::by_codename(&f.codename)),
        descriptions: wire_descriptions(asset, &context.environment),
    };
    Ok(api.add_asset(&payload).await?)
}

async fn edit_asset(
    api: &dyn ManagementApi,
    context: &ImportContext,
    asset: &MigrationAsset,
    target: &Asset,
) -> Result<Asset, ImportError> {
    let file_reference = if should_replace_binary_file(asset, target) {
        Some(upload_binary(api, asset).await?)
    } else {
        None
    };
    let payload = AssetUpsert {
        title: asset.title.clone(),
        collection: asset
            .collection
            .as_ref()
            .map(|c| Reference::by_codename(&c.codename)),
        folder: asset
            .folder
            .as_ref()
            .map(|f| Reference::by_codename(&f.codename)),
        descriptions: wire_descriptions(asset, &context.environment),
        file_reference,
    };
    Ok(api.upsert_asset(&asset.codename, &payload).await?)
}

async fn upload_binary(
    api: &dyn ManagementApi,
    asset: &MigrationAsset,
) -> Result<FileReference, ImportError> {
    let upload = BinaryFileUpload {
        filename: asset.filename.clone(),
        content_type: content_type_for_filename(&asset.filename).to_string(),
        data: asset.binary_data.clone(),
    };
    Ok(api.upload_binary_file(&upload).await?)
}

/// Descriptions restricted to languages the target actually has; others are
/// silently filtered out.
fn wire_descriptions(
    asset: &MigrationAsset,
    environment: &EnvironmentData,
) -> Vec<WireAssetDescription> {
    asset
        .descriptions
        .iter()
        .filter(|d| environment.language_by_codename(&d.language.codename).is_some())
        .map(|d| WireAssetDescription {
            language: Reference::by_codename(&d.language.codename),
            description: d.description.clone(),
        })
        .collect()
}

/// True when the target asset's metadata diverges from the snapshot:
/// title, collection codename, folder codename, or per-language
/// descriptions.
pub(crate) fn should_update_asset(
    asset: &MigrationAsset,
    target: &Asset,
    environment: &EnvironmentData,
) -> bool {
    if target.title.as_deref() != Some(asset.title.as_str()) {
        return true;
    }

    let target_collection = target.collection.as_ref().and_then(|reference| {
        reference
            .id
            .as_ref()
            .and_then(|id| environment.collection_by_id(id))
            .map(|c| c.codename.clone())
            .or_else(|| reference.codename.clone())
    });
    if target_collection.as_deref() != asset.collection.as_ref().map(|c| c.codename.as_str()) {
        return true;
    }

    let target_folder = target.folder.as_ref().and_then(|reference| {
        reference
            .id
            .as_ref()
            .and_then(|id| environment.asset_folder_by_id(id))
            .map(|f| f.codename.clone())
            .or_else(|| reference.codename.clone())
    });
    if target_folder.as_deref() != asset.folder.as_ref().map(|f| f.codename.as_str()) {
        return true;
    }

    let target_descriptions: HashMap<String, Option<String>> = target
        .descriptions
        .iter()
        .filter_map(|d| {
            let language = d
                .language
                .id
                .as_ref()
                .and_then(|id| environment.language_by_id(id))
                .map(|l| l.codename.clone())
                .or_else(|| d.language.codename.clone())?;
            Some((language, d.description.clone()))
        })
        .collect();
    let wanted_descriptions: HashMap<String, Option<String>> = asset
        .descriptions
        .iter()
        .filter(|d| environment.language_by_codename(&d.language.codename).is_some())
        .map(|d| (d.language.codename.clone(), d.description.clone()))
        .collect();

    target_descriptions != wanted_descriptions
}

/// True when the stored binary must be replaced: filename, size or MIME
/// type differ from the snapshot's file.
pub(crate) fn should_replace_binary_file(asset: &MigrationAsset, target: &Asset) -> bool {
    asset.filename != target.file_name
        || asset.binary_data.len() as u64 != target.size
        || content_type_for_filename(&asset.filename) != target.content_type
}

/// MIME type derived from the filename extension.
pub(crate) fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
