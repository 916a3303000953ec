//! Rich-text HTML rewriting.
//!
//! The platform serializes rich text as a constrained HTML subset, so all
//! rewriting here operates on narrowly delimited attribute patterns with
//! regular expressions; nothing parses the markup as a tree.
//!
//! The export pass rewrites id-addressed references (`data-item-id`,
//! `data-asset-id`, object `data-id`) into codename form and captures inline
//! components; the import pass is the symmetric inverse plus the attribute
//! normalizations the management API demands.

mod export;
mod import;

pub use export::{export_rich_text, RichTextExport};
pub use import::{import_rich_text, RichTextImport};

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

/// Marker `type` attribute of platform object tags.
pub(crate) const OBJECT_MARKER: &str = "application/kenticocloud";

/// Anchor attribute carrying an item id on the wire.
pub(crate) static ITEM_ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-item-id="([^"]+)""#).unwrap());

/// Asset id attribute, used by both figures and links.
pub(crate) static ASSET_ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-asset-id="([^"]+)""#).unwrap());

/// Anchor attribute carrying an item codename in the snapshot.
pub(crate) static MANAGER_LINK_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-manager-link-codename="([^"]+)""#).unwrap());

/// Asset codename attribute in the snapshot.
pub(crate) static ASSET_CODENAME_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-asset-codename="([^"]+)""#).unwrap());

/// A whole object tag, optionally with its immediate closing tag.
pub(crate) static OBJECT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<object\b[^>]*>(?:\s*</object>)?"#).unwrap());

/// One attribute inside a tag.
pub(crate) static TAG_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([a-zA-Z][a-zA-Z0-9-]*)="([^"]*)""#).unwrap());

/// Parses the attributes of a single tag into a name → value map.
pub(crate) fn parse_attributes(tag: &str) -> HashMap<String, String> {
    TAG_ATTR
        .captures_iter(tag)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Scans an HTML fragment for id-addressed item and asset references.
///
/// Used by the reference extractor to seed the closure fetch; malformed ids
/// are skipped.
pub(crate) fn scan_html_references(html: &str) -> (HashSet<Uuid>, HashSet<Uuid>) {
    let mut item_ids: HashSet<Uuid> = ITEM_ID_ATTR
        .captures_iter(html)
        .filter_map(|caps| caps[1].parse().ok())
        .collect();
    let asset_ids = ASSET_ID_ATTR
        .captures_iter(html)
        .filter_map(|caps| caps[1].parse().ok())
        .collect();

    for object in OBJECT_TAG.find_iter(html) {
        let attrs = parse_attributes(object.as_str());
        if attrs.get("type").map(String::as_str) != Some(OBJECT_MARKER) {
            continue;
        }
        if attrs.get("data-type").map(String::as_str) == Some("item")
            && attrs.get("data-rel").map(String::as_str) != Some("component")
        {
            if let Some(id) = attrs.get("data-id").and_then(|v| v.parse().ok()) {
                item_ids.insert(id);
            }
        }
    }

    (item_ids, asset_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_finds_links_objects_and_assets() {
        let item = Uuid::new_v4();
        let linked = Uuid::new_v4();
        let asset = Uuid::new_v4();
        let html = format!(
            r#"<p><a data-item-id="{item}">read</a></p>
               <object type="application/kenticocloud" data-type="item" data-id="{linked}"></object>
               <figure data-asset-id="{asset}"></figure>"#
        );

        let (item_ids, asset_ids) = scan_html_references(&html);
        assert_eq!(item_ids, HashSet::from([item, linked]));
        assert_eq!(asset_ids, HashSet::from([asset]));
    }

    #[test]
    fn test_scan_skips_components_and_foreign_objects() {
        let id = Uuid::new_v4();
        let html = format!(
            r#"<object type="application/kenticocloud" data-type="component" data-id="{id}"></object>
               <object type="image/svg+xml" data-type="item" data-id="{id}"></object>"#
        );

        let (item_ids, asset_ids) = scan_html_references(&html);
        assert!(item_ids.is_empty());
        assert!(asset_ids.is_empty());
    }

    #[test]
    fn test_scan_tolerates_malformed_ids() {
        let html = r#"<a data-item-id="not-a-uuid">x</a>"#;
        let (item_ids, asset_ids) = scan_html_references(html);
        assert!(item_ids.is_empty());
        assert!(asset_ids.is_empty());
    }
}
