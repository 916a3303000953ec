//! Import pass: snapshot HTML → wire HTML for the target environment.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use content_migrator_api::models::{Reference, WireComponent};
use content_migrator_shared::types::MigrationComponent;

use crate::errors::TransformError;
use crate::import::context::ImportContext;

use super::{parse_attributes, ASSET_CODENAME_ATTR, MANAGER_LINK_ATTR, OBJECT_MARKER, OBJECT_TAG};

static TARGET_BLANK_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*target="_blank""#).unwrap());

static REL_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\s*rel="[^"]*""#).unwrap());

static EMPTY_HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\s*href="""#).unwrap());

// Rendered artifacts the management API refuses on upsert.
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<img\b[^>]*/?>"#).unwrap());

static DATA_IMAGE_ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*data-image-id="[^"]*""#).unwrap());

/// Result of the import pass over one rich-text value.
#[derive(Debug, Default, PartialEq)]
pub struct RichTextImport {
    pub value: Option<String>,
    pub components: Vec<WireComponent>,
}

/// Rewrites one snapshot rich-text fragment back into wire form: codenames
/// become target ids, captured components are re-embedded, and link
/// attributes are normalized to what the management API accepts.
pub fn import_rich_text(
    element: &str,
    value: Option<&str>,
    components: &[MigrationComponent],
    ctx: &ImportContext,
) -> Result<RichTextImport, TransformError> {
    let wire_components = components
        .iter()
        .map(|component| convert_component(component, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let Some(html) = value else {
        return Ok(RichTextImport {
            value: None,
            components: wire_components,
        });
    };

    // Item links inside anchors.
    let html = MANAGER_LINK_ATTR.replace_all(html, |caps: &regex::Captures| {
        let codename = &caps[1];
        match ctx.item_id(codename) {
            Some(id) => format!(r#"data-item-id="{id}""#),
            None => {
                warn!(
                    element = %element,
                    item = %codename,
                    "rich text links an item missing from the target, leaving the link untouched"
                );
                caps[0].to_string()
            }
        }
    });

    // Linked-item objects; components stay addressed by their local id.
    let html = OBJECT_TAG.replace_all(&html, |caps: &regex::Captures| {
        let tag = caps[0].to_string();
        let attrs = parse_attributes(&tag);
        if attrs.get("type").map(String::as_str) != Some(OBJECT_MARKER)
            || attrs.get("data-type").map(String::as_str) != Some("item")
        {
            return tag;
        }
        let Some(codename) = attrs.get("data-codename") else {
            return tag;
        };
        match ctx.item_id(codename) {
            Some(id) => format!(
                r#"<object type="{OBJECT_MARKER}" data-type="item" data-id="{id}"></object>"#
            ),
            None => {
                warn!(
                    element = %element,
                    item = %codename,
                    "rich text embeds an item missing from the target, dropping the reference"
                );
                String::new()
            }
        }
    });

    // Asset references.
    let html = ASSET_CODENAME_ATTR.replace_all(&html, |caps: &regex::Captures| {
        let codename = &caps[1];
        match ctx.asset_id(codename) {
            Some(id) => format!(r#"data-asset-id="{id}""#),
            None => {
                warn!(
                    element = %element,
                    asset = %codename,
                    "rich text references an asset missing from the target, leaving the reference"
                );
                caps[0].to_string()
            }
        }
    });

    // Attribute normalizations.
    let html = TARGET_BLANK_ATTR.replace_all(&html, r#" data-new-window="true""#);
    let html = REL_ATTR.replace_all(&html, "");
    let html = EMPTY_HREF_ATTR.replace_all(&html, "");
    let html = IMG_TAG.replace_all(&html, "");
    let html = DATA_IMAGE_ID_ATTR.replace_all(&html, "");

    Ok(RichTextImport {
        value: Some(html.into_owned()),
        components: wire_components,
    })
}

/// Converts one migration component into its wire form, translating every
/// element through the import transforms.
fn convert_component(
    component: &MigrationComponent,
    ctx: &ImportContext,
) -> Result<WireComponent, TransformError> {
    let content_type = ctx
        .environment
        .content_type_by_codename(&component.component_type.codename)
        .ok_or_else(|| TransformError::UnresolvedCodename {
            kind: "content type",
            codename: component.component_type.codename.clone(),
            element: "component".to_string(),
        })?;

    let elements = component
        .elements
        .iter()
        .map(|(codename, element)| {
            let descriptor = content_type.element_by_codename(codename).ok_or_else(|| {
                TransformError::UnknownElement {
                    element: codename.clone(),
                    content_type: content_type.codename.clone(),
                }
            })?;
            crate::transform::import_element(codename, element, descriptor, ctx)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WireComponent {
        id: component.id,
        component_type: Reference::by_codename(&component.component_type.codename),
        elements,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::import::context::{AssetTargetState, ImportContext, ItemTargetState};
    use content_migrator_api::models::{Asset, ContentItem};
    use content_migrator_shared::types::{
        CodenameReference, ElementKind, EnvironmentData, FlattenedContentType, FlattenedElement,
        MigrationElement,
    };
    use serde_json::json;
    use uuid::Uuid;

    fn make_context() -> (ImportContext, Uuid, Uuid, Uuid) {
        let faq_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();
        let text_element_id = Uuid::new_v4();

        let mut items = HashMap::new();
        items.insert(
            "faq".to_string(),
            ItemTargetState::Exists(ContentItem {
                id: faq_id,
                name: "FAQ".to_string(),
                codename: "faq".to_string(),
                item_type: Reference::default(),
                collection: Reference::default(),
                external_id: None,
            }),
        );

        let mut assets = HashMap::new();
        assets.insert(
            "logo".to_string(),
            AssetTargetState::Exists(Asset {
                id: asset_id,
                codename: "logo".to_string(),
                file_name: "logo.png".to_string(),
                title: None,
                size: 4,
                content_type: "image/png".to_string(),
                url: "https://assets.invalid/logo".to_string(),
                collection: None,
                folder: None,
                descriptions: vec![],
                external_id: None,
            }),
        );

        let context = ImportContext {
            environment: EnvironmentData {
                content_types: vec![FlattenedContentType {
                    id: Uuid::new_v4(),
                    codename: "quote".to_string(),
                    elements: vec![FlattenedElement {
                        id: text_element_id,
                        codename: "text".to_string(),
                        kind: ElementKind::Text,
                        taxonomy_group: None,
                        options: vec![],
                    }],
                }],
                ..EnvironmentData::default()
            },
            items,
            variants: HashMap::new(),
            assets,
        };
        (context, faq_id, asset_id, text_element_id)
    }

    #[test]
    fn test_manager_link_codenames_become_target_item_ids() {
        let (context, faq_id, _, _) = make_context();
        let html = r#"<a data-manager-link-codename="faq">X</a>"#;

        let imported = import_rich_text("body", Some(html), &[], &context).unwrap();
        assert_eq!(
            imported.value.as_deref(),
            Some(format!(r#"<a data-item-id="{faq_id}">X</a>"#).as_str())
        );
    }

    #[test]
    fn test_item_objects_are_rewritten_to_target_ids() {
        let (context, faq_id, _, _) = make_context();
        let html = r#"<object type="application/kenticocloud" data-type="item" data-codename="faq"></object>"#;

        let imported = import_rich_text("body", Some(html), &[], &context).unwrap();
        assert_eq!(
            imported.value.as_deref(),
            Some(
                format!(
                    r#"<object type="application/kenticocloud" data-type="item" data-id="{faq_id}"></object>"#
                )
                .as_str()
            )
        );
    }

    #[test]
    fn test_item_objects_missing_from_target_are_dropped() {
        let (context, _, _, _) = make_context();
        let html = r#"<p></p><object type="application/kenticocloud" data-type="item" data-codename="gone"></object>"#;

        let imported = import_rich_text("body", Some(html), &[], &context).unwrap();
        assert_eq!(imported.value.as_deref(), Some("<p></p>"));
    }

    #[test]
    fn test_asset_codenames_become_target_asset_ids() {
        let (context, _, asset_id, _) = make_context();
        let html = r#"<figure data-asset-codename="logo"></figure>"#;

        let imported = import_rich_text("body", Some(html), &[], &context).unwrap();
        assert_eq!(
            imported.value.as_deref(),
            Some(format!(r#"<figure data-asset-id="{asset_id}"></figure>"#).as_str())
        );
    }

    #[test]
    fn test_link_attributes_are_normalized() {
        let (context, _, _, _) = make_context();
        let html = r#"<a href="" target="_blank" rel="noopener">X</a><img src="render.png"><p data-image-id="abc">Y</p>"#;

        let imported = import_rich_text("body", Some(html), &[], &context).unwrap();
        assert_eq!(
            imported.value.as_deref(),
            Some(r#"<a data-new-window="true">X</a><p>Y</p>"#)
        );
    }

    #[test]
    fn test_components_are_reembedded_as_wire_components() {
        let (context, _, _, _) = make_context();
        let component_id = Uuid::new_v4();
        let mut elements = BTreeMap::new();
        elements.insert(
            "text".to_string(),
            MigrationElement::Text {
                value: Some("Inline quote".to_string()),
            },
        );
        let components = vec![MigrationComponent {
            id: component_id,
            component_type: CodenameReference::new("quote"),
            elements,
        }];
        let html = format!(
            r#"<object type="application/kenticocloud" data-type="component" data-id="{component_id}"></object>"#
        );

        let imported = import_rich_text("body", Some(&html), &components, &context).unwrap();
        assert_eq!(imported.value.as_deref(), Some(html.as_str()));
        assert_eq!(imported.components.len(), 1);
        let component = &imported.components[0];
        assert_eq!(component.id, component_id);
        assert_eq!(component.elements.len(), 1);
        assert_eq!(component.elements[0].value, json!("Inline quote"));
    }

    #[test]
    fn test_component_with_unknown_type_is_an_error() {
        let (context, _, _, _) = make_context();
        let components = vec![MigrationComponent {
            id: Uuid::new_v4(),
            component_type: CodenameReference::new("unknown"),
            elements: BTreeMap::new(),
        }];

        let result = import_rich_text("body", Some("<p></p>"), &components, &context);
        assert!(matches!(
            result,
            Err(TransformError::UnresolvedCodename {
                kind: "content type",
                ..
            })
        ));
    }
}
