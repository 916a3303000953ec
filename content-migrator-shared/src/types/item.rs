use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::element::MigrationElement;
use super::reference::CodenameReference;

/// One content item within one language, as stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationItem {
    pub system: MigrationItemSystem,
    pub versions: Vec<MigrationItemVersion>,
}

/// The language-agnostic system metadata of a migration item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationItemSystem {
    pub name: String,
    pub codename: String,
    pub language: CodenameReference,
    #[serde(rename = "type")]
    pub item_type: CodenameReference,
    pub collection: CodenameReference,
    pub workflow: CodenameReference,
}

/// One workflow version of an item.
///
/// Element entries are keyed by element codename; the `BTreeMap` keeps the
/// serialized order codename-ascending so equal input yields a
/// byte-identical snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationItemVersion {
    pub elements: BTreeMap<String, MigrationElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<MigrationSchedule>,
    pub workflow_step: CodenameReference,
}

/// Scheduled publish/unpublish times attached to a version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MigrationSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_display_timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublish_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublish_display_timezone: Option<String>,
}

impl MigrationSchedule {
    /// True when neither a publish nor an unpublish time is set.
    pub fn is_empty(&self) -> bool {
        self.publish_time.is_none() && self.unpublish_time.is_none()
    }
}
