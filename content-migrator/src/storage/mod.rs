//! Snapshot file storage.
//!
//! The snapshot is persisted as two JSON documents: `items.json` with the
//! migration items and `assets.json` with asset metadata plus
//! base64-encoded binaries. Both are schema-validated on read before any
//! network call happens.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use content_migrator_shared::types::{
    MigrationAsset, MigrationData, MigrationItem, SnapshotValidationError,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot validation failed: {0}")]
    Validation(#[from] SnapshotValidationError),
}

#[derive(Serialize, Deserialize)]
struct ItemsDocument {
    items: Vec<MigrationItem>,
}

#[derive(Serialize, Deserialize)]
struct AssetsDocument {
    assets: Vec<MigrationAsset>,
}

/// Writes a snapshot to the given item and asset files.
pub fn write_snapshot(
    data: &MigrationData,
    items_path: &Path,
    assets_path: &Path,
) -> Result<(), SnapshotError> {
    let items = serde_json::to_vec_pretty(&ItemsDocument {
        items: data.items.clone(),
    })?;
    fs::write(items_path, items)?;

    let assets = serde_json::to_vec_pretty(&AssetsDocument {
        assets: data.assets.clone(),
    })?;
    fs::write(assets_path, assets)?;

    info!(
        items_file = %items_path.display(),
        assets_file = %assets_path.display(),
        item_count = data.items.len(),
        asset_count = data.assets.len(),
        "snapshot written"
    );
    Ok(())
}

/// Reads and validates a snapshot. A missing assets file is tolerated (the
/// snapshot then carries items only).
pub fn read_snapshot(items_path: &Path, assets_path: &Path) -> Result<MigrationData, SnapshotError> {
    let items: ItemsDocument = serde_json::from_slice(&fs::read(items_path)?)?;

    let assets = if assets_path.exists() {
        let document: AssetsDocument = serde_json::from_slice(&fs::read(assets_path)?)?;
        document.assets
    } else {
        warn!(
            assets_file = %assets_path.display(),
            "assets snapshot not found, importing items only"
        );
        Vec::new()
    };

    let data = MigrationData {
        items: items.items,
        assets,
    };
    data.validate()?;
    Ok(data)
}
