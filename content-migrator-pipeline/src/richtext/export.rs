//! Export pass: wire HTML → codename-addressed snapshot HTML.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use content_migrator_api::models::WireComponent;
use content_migrator_shared::codename::uuid_for_codename;
use content_migrator_shared::types::{CodenameReference, MigrationComponent};

use crate::errors::TransformError;
use crate::export::context::ExportContext;
use crate::transform::{describe_reference, resolve_content_type};

use super::{parse_attributes, ASSET_ID_ATTR, ITEM_ID_ATTR, OBJECT_MARKER, OBJECT_TAG};

/// Result of the export pass over one rich-text value.
#[derive(Debug, Default, PartialEq)]
pub struct RichTextExport {
    pub value: Option<String>,
    pub components: Vec<MigrationComponent>,
}

/// Rewrites one rich-text HTML fragment into its codename-addressed form
/// and captures the inline components it references.
///
/// Link targets that cannot be resolved are stripped down to their text
/// when `ctx.replace_invalid_links` is set and left untouched (with a
/// warning) otherwise. Unresolvable asset references are a hard error.
pub fn export_rich_text(
    element: &str,
    value: Option<&str>,
    wire_components: &[WireComponent],
    ctx: &ExportContext,
) -> Result<RichTextExport, TransformError> {
    let Some(html) = value else {
        return Ok(RichTextExport::default());
    };

    let mut error: Option<TransformError> = None;
    let mut components: Vec<MigrationComponent> = Vec::new();
    let mut captured: HashSet<Uuid> = HashSet::new();

    // Item links inside anchors.
    let mut unresolved_links: Vec<String> = Vec::new();
    let mut html = ITEM_ID_ATTR
        .replace_all(html, |caps: &regex::Captures| {
            let raw = caps[1].to_string();
            match raw
                .parse::<Uuid>()
                .ok()
                .and_then(|id| ctx.item_codename(&id))
            {
                Some(codename) => format!(r#"data-manager-link-codename="{codename}""#),
                None => {
                    unresolved_links.push(raw);
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    for raw in unresolved_links {
        if ctx.replace_invalid_links {
            let pattern = format!(
                r#"(?s)<a\b[^>]*data-item-id="{}"[^>]*>(.*?)</a>"#,
                regex::escape(&raw)
            );
            if let Ok(anchor) = Regex::new(&pattern) {
                html = anchor.replace_all(&html, "$1").into_owned();
            }
        } else {
            warn!(
                element = %element,
                item_id = %raw,
                "rich text links an unresolvable item, leaving the link untouched"
            );
        }
    }

    // Linked-item and component objects.
    let mut capture = |id: Uuid, components: &mut Vec<MigrationComponent>,
                       error: &mut Option<TransformError>| {
        if !captured.insert(id) {
            return;
        }
        match wire_components.iter().find(|c| c.id == id) {
            Some(wire) => match convert_component(wire, ctx) {
                Ok(component) => components.push(component),
                Err(err) => {
                    error.get_or_insert(err);
                }
            },
            None => warn!(
                element = %element,
                component_id = %id,
                "component body not present on the wire"
            ),
        }
    };

    let html = OBJECT_TAG
        .replace_all(&html, |caps: &regex::Captures| {
            let tag = caps[0].to_string();
            let attrs = parse_attributes(&tag);
            if attrs.get("type").map(String::as_str) != Some(OBJECT_MARKER) {
                return tag;
            }

            match attrs.get("data-type").map(String::as_str) {
                Some("component") => {
                    if let Some(id) = attrs.get("data-id").and_then(|v| v.parse().ok()) {
                        capture(id, &mut components, &mut error);
                    }
                    tag
                }
                Some("item") => {
                    if attrs.get("data-rel").map(String::as_str) == Some("component") {
                        // Component serialized as an item reference: re-type
                        // it and address it by the codename-derived UUID.
                        let Some(codename) = attrs.get("data-codename") else {
                            return tag;
                        };
                        let id = uuid_for_codename(codename);
                        capture(id, &mut components, &mut error);
                        format!(
                            r#"<object type="{OBJECT_MARKER}" data-type="component" data-id="{id}"></object>"#
                        )
                    } else if let Some(raw) = attrs.get("data-id") {
                        match raw
                            .parse::<Uuid>()
                            .ok()
                            .and_then(|id| ctx.item_codename(&id))
                        {
                            Some(codename) => format!(
                                r#"<object type="{OBJECT_MARKER}" data-type="item" data-codename="{codename}"></object>"#
                            ),
                            None => {
                                warn!(
                                    element = %element,
                                    item_id = %raw,
                                    "rich text embeds an unresolvable item, leaving the object untouched"
                                );
                                tag
                            }
                        }
                    } else {
                        tag
                    }
                }
                _ => tag,
            }
        })
        .into_owned();

    // Asset references, in figures and links alike.
    let html = ASSET_ID_ATTR
        .replace_all(&html, |caps: &regex::Captures| {
            let raw = caps[1].to_string();
            match raw
                .parse::<Uuid>()
                .ok()
                .and_then(|id| ctx.asset_codename(&id))
            {
                Some(codename) => format!(r#"data-asset-codename="{codename}""#),
                None => {
                    error.get_or_insert(TransformError::UnresolvedId {
                        kind: "asset",
                        id: raw.parse().unwrap_or(Uuid::nil()),
                        element: element.to_string(),
                    });
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    if let Some(err) = error {
        return Err(err);
    }

    Ok(RichTextExport {
        value: Some(html),
        components,
    })
}

/// Converts one wire component into its migration form, translating every
/// element through the export transforms.
fn convert_component(
    wire: &WireComponent,
    ctx: &ExportContext,
) -> Result<MigrationComponent, TransformError> {
    let content_type = resolve_content_type(&ctx.environment, &wire.component_type)
        .ok_or_else(|| TransformError::UnresolvedCodename {
            kind: "content type",
            codename: describe_reference(&wire.component_type),
            element: "component".to_string(),
        })?;

    let mut elements = BTreeMap::new();
    for wire_element in &wire.elements {
        let descriptor = wire_element
            .element
            .id
            .as_ref()
            .and_then(|id| content_type.element_by_id(id))
            .or_else(|| {
                wire_element
                    .element
                    .codename
                    .as_deref()
                    .and_then(|codename| content_type.element_by_codename(codename))
            })
            .ok_or_else(|| TransformError::UnknownElement {
                element: describe_reference(&wire_element.element),
                content_type: content_type.codename.clone(),
            })?;
        elements.insert(
            descriptor.codename.clone(),
            crate::transform::export_element(wire_element, descriptor, ctx)?,
        );
    }

    Ok(MigrationComponent {
        id: wire.id,
        component_type: CodenameReference::new(content_type.codename.clone()),
        elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::context::{
        AssetSourceState, ExportContext, ItemSourceState, ReferencedData,
    };
    use content_migrator_api::models::{Asset, ContentItem, Reference, WireElement};
    use content_migrator_shared::types::{
        ElementKind, EnvironmentData, FlattenedContentType, FlattenedElement, MigrationElement,
    };
    use serde_json::json;

    fn quote_type(text_element_id: Uuid) -> FlattenedContentType {
        FlattenedContentType {
            id: Uuid::new_v4(),
            codename: "quote".to_string(),
            elements: vec![FlattenedElement {
                id: text_element_id,
                codename: "text".to_string(),
                kind: ElementKind::Text,
                taxonomy_group: None,
                options: vec![],
            }],
        }
    }

    fn make_context(text_element_id: Uuid) -> (ExportContext, Uuid, Uuid) {
        let faq_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();

        let mut referenced = ReferencedData::default();
        referenced.items.insert(
            faq_id,
            ItemSourceState::Found(ContentItem {
                id: faq_id,
                name: "FAQ".to_string(),
                codename: "faq".to_string(),
                item_type: Reference::default(),
                collection: Reference::default(),
                external_id: None,
            }),
        );
        referenced.assets.insert(
            asset_id,
            AssetSourceState::Found(Asset {
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

        let context = ExportContext {
            environment: EnvironmentData {
                content_types: vec![quote_type(text_element_id)],
                ..EnvironmentData::default()
            },
            items: vec![],
            referenced,
            replace_invalid_links: false,
        };
        (context, faq_id, asset_id)
    }

    #[test]
    fn test_item_links_are_rewritten_to_manager_link_codenames() {
        let (context, faq_id, _) = make_context(Uuid::new_v4());
        let html = format!(r#"<p><a data-item-id="{faq_id}">X</a></p>"#);

        let exported = export_rich_text("body", Some(&html), &[], &context).unwrap();
        assert_eq!(
            exported.value.as_deref(),
            Some(r#"<p><a data-manager-link-codename="faq">X</a></p>"#)
        );
    }

    #[test]
    fn test_unresolvable_link_is_left_untouched_by_default() {
        let (context, _, _) = make_context(Uuid::new_v4());
        let html = format!(r#"<a data-item-id="{}">X</a>"#, Uuid::new_v4());

        let exported = export_rich_text("body", Some(&html), &[], &context).unwrap();
        assert_eq!(exported.value.as_deref(), Some(html.as_str()));
    }

    #[test]
    fn test_unresolvable_link_is_stripped_when_configured() {
        let (mut context, _, _) = make_context(Uuid::new_v4());
        context.replace_invalid_links = true;
        let html = format!(r#"<p><a data-item-id="{}">keep me</a></p>"#, Uuid::new_v4());

        let exported = export_rich_text("body", Some(&html), &[], &context).unwrap();
        assert_eq!(exported.value.as_deref(), Some("<p>keep me</p>"));
    }

    #[test]
    fn test_item_objects_are_rewritten_to_codenames() {
        let (context, faq_id, _) = make_context(Uuid::new_v4());
        let html = format!(
            r#"<object type="application/kenticocloud" data-type="item" data-id="{faq_id}"></object>"#
        );

        let exported = export_rich_text("body", Some(&html), &[], &context).unwrap();
        assert_eq!(
            exported.value.as_deref(),
            Some(
                r#"<object type="application/kenticocloud" data-type="item" data-codename="faq"></object>"#
            )
        );
    }

    #[test]
    fn test_component_objects_are_captured_with_their_body() {
        let text_element_id = Uuid::new_v4();
        let (context, _, _) = make_context(text_element_id);
        let component_id = Uuid::new_v4();
        let html = format!(
            r#"<object type="application/kenticocloud" data-type="component" data-id="{component_id}"></object>"#
        );
        let wire_components = vec![WireComponent {
            id: component_id,
            component_type: Reference::by_codename("quote"),
            elements: vec![WireElement {
                element: Reference::by_id(text_element_id),
                value: json!("Inline quote"),
                components: vec![],
                mode: None,
                display_timezone: None,
            }],
        }];

        let exported =
            export_rich_text("body", Some(&html), &wire_components, &context).unwrap();
        assert_eq!(exported.value.as_deref(), Some(html.as_str()));
        assert_eq!(exported.components.len(), 1);
        let component = &exported.components[0];
        assert_eq!(component.id, component_id);
        assert_eq!(component.component_type.codename, "quote");
        assert_eq!(
            component.elements.get("text"),
            Some(&MigrationElement::Text {
                value: Some("Inline quote".to_string())
            })
        );
    }

    #[test]
    fn test_item_rel_component_objects_are_retyped_and_addressed_by_hash() {
        let text_element_id = Uuid::new_v4();
        let (context, _, _) = make_context(text_element_id);
        let derived = uuid_for_codename("hero_banner");
        let html = r#"<object type="application/kenticocloud" data-type="item" data-rel="component" data-codename="hero_banner"></object>"#;
        let wire_components = vec![WireComponent {
            id: derived,
            component_type: Reference::by_codename("quote"),
            elements: vec![WireElement {
                element: Reference::by_id(text_element_id),
                value: json!("Hero"),
                components: vec![],
                mode: None,
                display_timezone: None,
            }],
        }];

        let exported = export_rich_text("body", Some(html), &wire_components, &context).unwrap();
        assert_eq!(
            exported.value.as_deref(),
            Some(
                format!(
                    r#"<object type="application/kenticocloud" data-type="component" data-id="{derived}"></object>"#
                )
                .as_str()
            )
        );
        assert_eq!(exported.components.len(), 1);
        assert_eq!(exported.components[0].id, derived);
    }

    #[test]
    fn test_asset_references_are_rewritten_to_codenames() {
        let (context, _, asset_id) = make_context(Uuid::new_v4());
        let html = format!(r#"<figure data-asset-id="{asset_id}"></figure>"#);

        let exported = export_rich_text("body", Some(&html), &[], &context).unwrap();
        assert_eq!(
            exported.value.as_deref(),
            Some(r#"<figure data-asset-codename="logo"></figure>"#)
        );
    }

    #[test]
    fn test_unresolvable_asset_reference_is_a_hard_error() {
        let (context, _, _) = make_context(Uuid::new_v4());
        let html = format!(r#"<figure data-asset-id="{}"></figure>"#, Uuid::new_v4());

        let result = export_rich_text("body", Some(&html), &[], &context);
        assert!(matches!(
            result,
            Err(TransformError::UnresolvedId { kind: "asset", .. })
        ));
    }

    #[test]
    fn test_missing_value_exports_as_empty() {
        let (context, _, _) = make_context(Uuid::new_v4());
        let exported = export_rich_text("body", None, &[], &context).unwrap();
        assert_eq!(exported, RichTextExport::default());
    }
}
