use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::asset::MigrationAsset;
use super::element::MigrationElement;
use super::environment::PUBLISHED_STEP_CODENAME;
use super::item::MigrationItem;

/// The complete codename-addressed migration snapshot.
///
/// Built exclusively by the export manager, consumed exclusively by the
/// import pipeline; the only permitted mutation in between is one
/// user-supplied mapping pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationData {
    pub items: Vec<MigrationItem>,
    #[serde(default)]
    pub assets: Vec<MigrationAsset>,
}

/// Shape violations detected by [`MigrationData::validate`].
#[derive(Debug, Error)]
pub enum SnapshotValidationError {
    #[error("item '{item}' ({language}) has more than one published version")]
    MultiplePublishedVersions { item: String, language: String },

    #[error("item '{item}' ({language}) has more than one draft version")]
    MultipleDraftVersions { item: String, language: String },

    #[error("item '{item}' ({language}) has no versions")]
    NoVersions { item: String, language: String },

    #[error("snapshot contains an item with an empty codename")]
    EmptyItemCodename,

    #[error("asset '{asset}' has an empty {field}")]
    EmptyAssetField { asset: String, field: &'static str },

    #[error("item '{item}' element '{element}' declares duplicate component id {id}")]
    DuplicateComponentId {
        item: String,
        element: String,
        id: uuid::Uuid,
    },

    #[error("snapshot contains duplicate asset codename '{codename}'")]
    DuplicateAssetCodename { codename: String },
}

impl MigrationData {
    /// Validates the snapshot shape before it is consumed.
    ///
    /// Checks the per-item version invariant (at most one published and one
    /// draft version), codename presence, component id uniqueness within an
    /// element, and asset codename uniqueness.
    pub fn validate(&self) -> Result<(), SnapshotValidationError> {
        for item in &self.items {
            if item.system.codename.is_empty() {
                return Err(SnapshotValidationError::EmptyItemCodename);
            }
            if item.versions.is_empty() {
                return Err(SnapshotValidationError::NoVersions {
                    item: item.system.codename.clone(),
                    language: item.system.language.codename.clone(),
                });
            }

            let published = item
                .versions
                .iter()
                .filter(|v| v.workflow_step.codename == PUBLISHED_STEP_CODENAME)
                .count();
            if published > 1 {
                return Err(SnapshotValidationError::MultiplePublishedVersions {
                    item: item.system.codename.clone(),
                    language: item.system.language.codename.clone(),
                });
            }
            if item.versions.len() - published > 1 {
                return Err(SnapshotValidationError::MultipleDraftVersions {
                    item: item.system.codename.clone(),
                    language: item.system.language.codename.clone(),
                });
            }

            for version in &item.versions {
                for (element_codename, element) in &version.elements {
                    if let MigrationElement::RichText { components, .. } = element {
                        let mut seen = HashSet::new();
                        for component in components {
                            if !seen.insert(component.id) {
                                return Err(SnapshotValidationError::DuplicateComponentId {
                                    item: item.system.codename.clone(),
                                    element: element_codename.clone(),
                                    id: component.id,
                                });
                            }
                        }
                    }
                }
            }
        }

        let mut asset_codenames = HashSet::new();
        for asset in &self.assets {
            if asset.codename.is_empty() {
                return Err(SnapshotValidationError::EmptyAssetField {
                    asset: asset.filename.clone(),
                    field: "codename",
                });
            }
            if asset.filename.is_empty() {
                return Err(SnapshotValidationError::EmptyAssetField {
                    asset: asset.codename.clone(),
                    field: "filename",
                });
            }
            if !asset_codenames.insert(asset.codename.as_str()) {
                return Err(SnapshotValidationError::DuplicateAssetCodename {
                    codename: asset.codename.clone(),
                });
            }
        }

        Ok(())
    }

    /// Finds an item by its codename and language codename.
    pub fn item(&self, codename: &str, language: &str) -> Option<&MigrationItem> {
        self.items.iter().find(|i| {
            i.system.codename == codename && i.system.language.codename == language
        })
    }

    /// Finds an asset by codename.
    pub fn asset(&self, codename: &str) -> Option<&MigrationAsset> {
        self.assets.iter().find(|a| a.codename == codename)
    }
}
