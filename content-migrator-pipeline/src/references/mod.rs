//! Reference closure extraction.
//!
//! Walks wire elements and collects every content item id and asset id they
//! reference, recursing through rich-text HTML and inline components. The
//! result seeds the export context's fetch of referenced entities, so the
//! walk is deliberately lenient: malformed values and unknown elements are
//! skipped rather than failed (strictness belongs to the transforms).

use std::collections::HashSet;

use serde_json::Value;
use uuid::Uuid;

use content_migrator_api::models::WireElement;
use content_migrator_shared::types::{ElementKind, EnvironmentData, FlattenedContentType};

use crate::richtext;
use crate::transform::resolve_content_type;

/// Ids referenced anywhere in a set of elements.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReferencedIds {
    pub item_ids: HashSet<Uuid>,
    pub asset_ids: HashSet<Uuid>,
}

impl ReferencedIds {
    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty() && self.asset_ids.is_empty()
    }
}

/// Extracts the closure of referenced item and asset ids from a list of
/// `(content type id, elements)` pairs.
pub fn extract_references<'a, I>(inputs: I, environment: &EnvironmentData) -> ReferencedIds
where
    I: IntoIterator<Item = (Uuid, &'a [WireElement])>,
{
    let mut referenced = ReferencedIds::default();
    for (content_type_id, elements) in inputs {
        let Some(content_type) = environment.content_type_by_id(&content_type_id) else {
            continue;
        };
        collect(content_type, elements, environment, &mut referenced);
    }
    referenced
}

fn collect(
    content_type: &FlattenedContentType,
    elements: &[WireElement],
    environment: &EnvironmentData,
    out: &mut ReferencedIds,
) {
    for element in elements {
        let descriptor = element
            .element
            .id
            .as_ref()
            .and_then(|id| content_type.element_by_id(id))
            .or_else(|| {
                element
                    .element
                    .codename
                    .as_deref()
                    .and_then(|codename| content_type.element_by_codename(codename))
            });
        let Some(descriptor) = descriptor else {
            continue;
        };

        match descriptor.kind {
            ElementKind::ModularContent | ElementKind::Subpages => {
                out.item_ids.extend(lenient_ids(&element.value));
            }
            ElementKind::Asset => {
                out.asset_ids.extend(lenient_ids(&element.value));
            }
            ElementKind::RichText => {
                if let Some(html) = element.value.as_str() {
                    let (item_ids, asset_ids) = richtext::scan_html_references(html);
                    out.item_ids.extend(item_ids);
                    out.asset_ids.extend(asset_ids);
                }
                for component in &element.components {
                    if let Some(component_type) =
                        resolve_content_type(environment, &component.component_type)
                    {
                        collect(component_type, &component.elements, environment, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn lenient_ids(value: &Value) -> Vec<Uuid> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("id")?.as_str()?.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_migrator_api::models::{Reference, WireComponent};
    use content_migrator_shared::types::FlattenedElement;
    use serde_json::json;

    fn element_descriptor(id: Uuid, codename: &str, kind: ElementKind) -> FlattenedElement {
        FlattenedElement {
            id,
            codename: codename.to_string(),
            kind,
            taxonomy_group: None,
            options: Vec::new(),
        }
    }

    fn wire_element(id: Uuid, value: Value) -> WireElement {
        WireElement {
            element: Reference::by_id(id),
            value,
            components: Vec::new(),
            mode: None,
            display_timezone: None,
        }
    }

    fn make_environment() -> (EnvironmentData, Uuid, Uuid, Uuid, Uuid) {
        let type_id = Uuid::new_v4();
        let modular_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();
        let body_id = Uuid::new_v4();
        let environment = EnvironmentData {
            content_types: vec![FlattenedContentType {
                id: type_id,
                codename: "page".to_string(),
                elements: vec![
                    element_descriptor(modular_id, "related", ElementKind::ModularContent),
                    element_descriptor(asset_id, "gallery", ElementKind::Asset),
                    element_descriptor(body_id, "body", ElementKind::RichText),
                ],
            }],
            ..EnvironmentData::default()
        };
        (environment, type_id, modular_id, asset_id, body_id)
    }

    #[test]
    fn test_collects_modular_and_asset_ids() {
        let (environment, type_id, modular_id, asset_id, _) = make_environment();
        let linked = Uuid::new_v4();
        let image = Uuid::new_v4();

        let elements = vec![
            wire_element(modular_id, json!([{ "id": linked.to_string() }])),
            wire_element(asset_id, json!([{ "id": image.to_string() }])),
        ];

        let referenced = extract_references([(type_id, elements.as_slice())], &environment);
        assert_eq!(referenced.item_ids, HashSet::from([linked]));
        assert_eq!(referenced.asset_ids, HashSet::from([image]));
    }

    #[test]
    fn test_collects_from_rich_text_html_and_components() {
        let (environment, type_id, modular_id, _, body_id) = make_environment();
        let linked_in_html = Uuid::new_v4();
        let linked_in_component = Uuid::new_v4();

        let component = WireComponent {
            id: Uuid::new_v4(),
            component_type: Reference::by_id(type_id),
            elements: vec![wire_element(
                modular_id,
                json!([{ "id": linked_in_component.to_string() }]),
            )],
        };
        let mut body = wire_element(
            body_id,
            json!(format!(
                r#"<p><a data-item-id="{linked_in_html}">see</a></p>"#
            )),
        );
        body.components = vec![component];

        let elements = vec![body];
        let referenced = extract_references([(type_id, elements.as_slice())], &environment);
        assert_eq!(
            referenced.item_ids,
            HashSet::from([linked_in_html, linked_in_component])
        );
    }

    #[test]
    fn test_unknown_types_and_malformed_values_are_skipped() {
        let (environment, _, modular_id, _, _) = make_environment();
        let elements = vec![wire_element(modular_id, json!("not-an-array"))];

        // Unknown content type id: nothing collected.
        let referenced = extract_references([(Uuid::new_v4(), elements.as_slice())], &environment);
        assert!(referenced.is_empty());
    }
}
