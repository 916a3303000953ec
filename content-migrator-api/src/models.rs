//! Wire contracts of the management API.
//!
//! Everything here is id-addressed the way the platform serves it. Element
//! values are carried as raw [`serde_json::Value`]; the transform layer
//! parses them per element kind so a malformed shape surfaces as a
//! transform error for that item instead of a decode failure for the whole
//! response.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reference to a platform entity by exactly one of its addressing modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl Reference {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_codename(codename: impl Into<String>) -> Self {
        Self {
            codename: Some(codename.into()),
            ..Self::default()
        }
    }

    pub fn by_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Self::default()
        }
    }
}

/// Language-agnostic content item shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub name: String,
    pub codename: String,
    #[serde(rename = "type")]
    pub item_type: Reference,
    pub collection: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Payload for creating a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItemAdd {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: Reference,
    pub codename: String,
    pub collection: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Payload for updating an existing content item shell.
///
/// Name and collection are the only fields of a shell the platform lets a
/// client change after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItemUpsert {
    pub name: String,
    pub collection: Reference,
}

/// One language variant of a content item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageVariant {
    pub item: Reference,
    pub language: Reference,
    pub workflow: WorkflowAssignment,
    pub elements: Vec<WireElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<WireSchedule>,
}

/// Workflow position of a language variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAssignment {
    pub workflow_identifier: Reference,
    pub step_identifier: Reference,
}

/// One element value on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireElement {
    pub element: Reference,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<WireComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_timezone: Option<String>,
}

/// Inline component carried alongside a rich-text element value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireComponent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub component_type: Reference,
    pub elements: Vec<WireElement>,
}

/// Scheduled publish/unpublish times reported for a variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_display_timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublish_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublish_display_timezone: Option<String>,
}

/// Payload for upserting a language variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageVariantUpsert {
    pub elements: Vec<WireElement>,
    pub workflow: WorkflowAssignment,
}

/// Optional scheduling attached to publish/unpublish calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePayload {
    pub scheduled_to: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_timezone: Option<String>,
}

/// One binary asset with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub codename: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub size: u64,
    /// MIME type of the stored binary.
    #[serde(rename = "type")]
    pub content_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<WireAssetDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Asset description for one language, id-addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAssetDescription {
    pub language: Reference,
    pub description: Option<String>,
}

/// Payload for creating an asset from an uploaded binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetAdd {
    pub codename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub file_reference: FileReference,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<WireAssetDescription>,
}

/// Payload for updating an existing asset's metadata, optionally swapping
/// its binary for a freshly uploaded one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetUpsert {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<WireAssetDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_reference: Option<FileReference>,
}

/// Handle returned by a binary upload, consumed by asset create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub reference_type: String,
}

impl FileReference {
    pub fn internal(id: Uuid) -> Self {
        Self {
            id,
            reference_type: "internal".to_string(),
        }
    }
}

/// Binary payload handed to the upload endpoint.
#[derive(Debug, Clone)]
pub struct BinaryFileUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}
