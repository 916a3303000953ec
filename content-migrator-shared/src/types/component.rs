use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::element::MigrationElement;
use super::reference::CodenameReference;

/// Inline content nested inside a rich-text element.
///
/// Components are addressed by a local UUID, not a codename; the id is
/// either the component's own wire id or the deterministic hash of its
/// codename (see [`crate::codename::uuid_for_codename`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationComponent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub component_type: CodenameReference,
    pub elements: BTreeMap<String, MigrationElement>,
}
