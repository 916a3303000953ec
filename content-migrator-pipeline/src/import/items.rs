//! Content item importer.
//!
//! Creates or renames the language-agnostic item shells. Runs strictly
//! serially and dedupes twice: locally by codename (several snapshot items
//! are language variants of one shell) and via the target probe, so
//! re-runs and concurrent variants never race to create duplicates.

use std::collections::HashSet;

use tracing::info;

use content_migrator_api::models::{ContentItem, ContentItemAdd, ContentItemUpsert, Reference};
use content_migrator_api::ManagementApi;
use content_migrator_shared::types::{MigrationData, MigrationItem};

use crate::errors::ImportError;
use crate::harness::{process_items, ItemResult, ProcessConfig};
use crate::import::context::{ImportContext, ItemTargetState};
use crate::import::ImportConfig;

/// Imports every unique item shell of the snapshot, returning the created
/// or fetched items.
pub async fn import_content_items(
    api: &dyn ManagementApi,
    data: &MigrationData,
    context: &ImportContext,
    config: &ImportConfig,
) -> Result<Vec<ContentItem>, ImportError> {
    let mut seen = HashSet::new();
    let shells: Vec<&MigrationItem> = data
        .items
        .iter()
        .filter(|item| seen.insert(item.system.codename.as_str()))
        .collect();

    let harness = ProcessConfig {
        parallel_limit: 1,
        fail_on_error: config.fail_on_error,
        cancellation: config.cancellation.clone(),
    };
    let results = process_items(
        "content items",
        shells,
        &harness,
        |item| item.system.codename.clone(),
        |item| async move { import_content_item(api, context, item).await },
    )
    .await?;

    Ok(results
        .into_iter()
        .filter_map(ItemResult::into_valid)
        .collect())
}

async fn import_content_item(
    api: &dyn ManagementApi,
    context: &ImportContext,
    item: &MigrationItem,
) -> Result<ContentItem, ImportError> {
    let system = &item.system;

    match context.items.get(&system.codename) {
        Some(ItemTargetState::Exists(existing)) => {
            let existing_collection = context.collection_codename(&existing.collection);
            let differs = existing.name != system.name
                || existing_collection.as_deref() != Some(system.collection.codename.as_str());
            if !differs {
                return Ok(existing.clone());
            }

            // Name and collection are the only updatable shell fields.
            let payload = ContentItemUpsert {
                name: system.name.clone(),
                collection: Reference::by_codename(&system.collection.codename),
            };
            info!(item = %system.codename, "updating content item shell");
            Ok(api.upsert_content_item(&system.codename, &payload).await?)
        }
        Some(ItemTargetState::Missing { external_id }) => {
            let payload = ContentItemAdd {
                name: system.name.clone(),
                item_type: Reference::by_codename(&system.item_type.codename),
                codename: system.codename.clone(),
                collection: Reference::by_codename(&system.collection.codename),
                external_id: Some(external_id.clone()),
            };
            info!(item = %system.codename, "creating content item");
            Ok(api.add_content_item(&payload).await?)
        }
        None => Err(ImportError::lookup("content item state", &system.codename)),
    }
}
