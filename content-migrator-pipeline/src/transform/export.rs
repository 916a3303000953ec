//! Export direction: wire element values → codename-addressed migration
//! values.

use tracing::debug;

use content_migrator_api::models::WireElement;
use content_migrator_shared::types::{
    CodenameReference, ElementKind, FlattenedElement, MigrationElement, UrlSlugMode,
};

use crate::errors::TransformError;
use crate::export::context::ExportContext;
use crate::richtext;

use super::{number_value, reference_ids, string_value};

/// Translates one wire element into its migration form.
///
/// Resolution strictness varies per type: `modular_content` silently drops
/// ids missing from the source (they may have been deleted), while `asset`,
/// `taxonomy`, `multiple_choice` and `subpages` hard-error on anything
/// unresolved.
pub fn export_element(
    wire: &WireElement,
    descriptor: &FlattenedElement,
    ctx: &ExportContext,
) -> Result<MigrationElement, TransformError> {
    let codename = descriptor.codename.as_str();

    match descriptor.kind {
        ElementKind::Text => Ok(MigrationElement::Text {
            value: string_value(codename, &wire.value)?,
        }),

        ElementKind::Custom => Ok(MigrationElement::Custom {
            value: string_value(codename, &wire.value)?,
        }),

        ElementKind::Number => Ok(MigrationElement::Number {
            value: number_value(codename, &wire.value)?,
        }),

        ElementKind::DateTime => Ok(MigrationElement::DateTime {
            value: string_value(codename, &wire.value)?,
            display_timezone: wire.display_timezone.clone(),
        }),

        ElementKind::UrlSlug => Ok(MigrationElement::UrlSlug {
            value: string_value(codename, &wire.value)?,
            mode: match wire.mode.as_deref() {
                Some("custom") => UrlSlugMode::Custom,
                _ => UrlSlugMode::Autogenerated,
            },
        }),

        ElementKind::Asset => {
            let value = reference_ids(codename, &wire.value)?
                .into_iter()
                .map(|id| {
                    ctx.asset_codename(&id)
                        .map(CodenameReference::new)
                        .ok_or(TransformError::UnresolvedId {
                            kind: "asset",
                            id,
                            element: codename.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MigrationElement::Asset { value })
        }

        ElementKind::Taxonomy => {
            let group_id = descriptor
                .taxonomy_group
                .ok_or_else(|| TransformError::MissingTaxonomyGroup {
                    element: codename.to_string(),
                })?;
            let group = ctx.environment.taxonomy_by_id(&group_id).ok_or_else(|| {
                TransformError::MissingTaxonomyGroup {
                    element: codename.to_string(),
                }
            })?;
            let value = reference_ids(codename, &wire.value)?
                .into_iter()
                .map(|id| {
                    group
                        .term_by_id(&id)
                        .map(|term| CodenameReference::new(term.codename.clone()))
                        .ok_or(TransformError::UnresolvedId {
                            kind: "taxonomy term",
                            id,
                            element: codename.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MigrationElement::Taxonomy { value })
        }

        ElementKind::MultipleChoice => {
            let value = reference_ids(codename, &wire.value)?
                .into_iter()
                .map(|id| {
                    descriptor
                        .options
                        .iter()
                        .find(|option| option.id == id)
                        .map(|option| CodenameReference::new(option.codename.clone()))
                        .ok_or(TransformError::UnresolvedId {
                            kind: "choice option",
                            id,
                            element: codename.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MigrationElement::MultipleChoice { value })
        }

        ElementKind::ModularContent => {
            let mut value = Vec::new();
            for id in reference_ids(codename, &wire.value)? {
                match ctx.item_codename(&id) {
                    Some(item) => value.push(CodenameReference::new(item)),
                    // The linked item may have been deleted in the source.
                    None => debug!(
                        element = %codename,
                        item_id = %id,
                        "dropping reference to an item missing from the source"
                    ),
                }
            }
            Ok(MigrationElement::ModularContent { value })
        }

        ElementKind::Subpages => {
            let value = reference_ids(codename, &wire.value)?
                .into_iter()
                .map(|id| {
                    ctx.item_codename(&id)
                        .map(CodenameReference::new)
                        .ok_or(TransformError::UnresolvedId {
                            kind: "content item",
                            id,
                            element: codename.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MigrationElement::Subpages { value })
        }

        ElementKind::RichText => {
            let html = match &wire.value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.as_str()),
                _ => {
                    return Err(TransformError::InvalidValue {
                        element: codename.to_string(),
                        expected: "an HTML string",
                    })
                }
            };
            let exported =
                richtext::export_rich_text(codename, html, &wire.components, ctx)?;
            Ok(MigrationElement::RichText {
                value: exported.value,
                components: exported.components,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::context::{
        AssetSourceState, ExportContext, ItemSourceState, ReferencedData,
    };
    use content_migrator_api::models::{Asset, ContentItem, Reference};
    use content_migrator_shared::types::{
        EnvironmentData, MultipleChoiceOption, TaxonomyGroup, TaxonomyTerm,
    };
    use serde_json::json;
    use uuid::Uuid;

    fn make_item(id: Uuid, codename: &str) -> ContentItem {
        ContentItem {
            id,
            name: codename.to_string(),
            codename: codename.to_string(),
            item_type: Reference::default(),
            collection: Reference::default(),
            external_id: None,
        }
    }

    fn make_asset(id: Uuid, codename: &str) -> Asset {
        Asset {
            id,
            codename: codename.to_string(),
            file_name: format!("{codename}.png"),
            title: None,
            size: 4,
            content_type: "image/png".to_string(),
            url: format!("https://assets.invalid/{codename}"),
            collection: None,
            folder: None,
            descriptions: vec![],
            external_id: None,
        }
    }

    fn make_context() -> (ExportContext, Uuid, Uuid) {
        let item_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();
        let mut referenced = ReferencedData::default();
        referenced
            .items
            .insert(item_id, ItemSourceState::Found(make_item(item_id, "faq")));
        referenced
            .assets
            .insert(asset_id, AssetSourceState::Found(make_asset(asset_id, "logo")));
        let context = ExportContext {
            environment: EnvironmentData::default(),
            items: vec![],
            referenced,
            replace_invalid_links: false,
        };
        (context, item_id, asset_id)
    }

    fn descriptor(kind: ElementKind) -> FlattenedElement {
        FlattenedElement {
            id: Uuid::new_v4(),
            codename: "element".to_string(),
            kind,
            taxonomy_group: None,
            options: vec![],
        }
    }

    fn wire(value: serde_json::Value) -> WireElement {
        WireElement {
            element: Reference::default(),
            value,
            components: vec![],
            mode: None,
            display_timezone: None,
        }
    }

    #[test]
    fn test_asset_ids_become_codenames() {
        let (context, _, asset_id) = make_context();
        let element = export_element(
            &wire(json!([{ "id": asset_id.to_string() }])),
            &descriptor(ElementKind::Asset),
            &context,
        )
        .unwrap();
        assert_eq!(
            element,
            MigrationElement::Asset {
                value: vec![CodenameReference::new("logo")]
            }
        );
    }

    #[test]
    fn test_unresolved_asset_is_a_hard_error() {
        let (context, _, _) = make_context();
        let result = export_element(
            &wire(json!([{ "id": Uuid::new_v4().to_string() }])),
            &descriptor(ElementKind::Asset),
            &context,
        );
        assert!(matches!(
            result,
            Err(TransformError::UnresolvedId { kind: "asset", .. })
        ));
    }

    #[test]
    fn test_modular_content_drops_missing_references_silently() {
        let (context, item_id, _) = make_context();
        let deleted = Uuid::new_v4();
        let element = export_element(
            &wire(json!([
                { "id": item_id.to_string() },
                { "id": deleted.to_string() },
            ])),
            &descriptor(ElementKind::ModularContent),
            &context,
        )
        .unwrap();
        assert_eq!(
            element,
            MigrationElement::ModularContent {
                value: vec![CodenameReference::new("faq")]
            }
        );
    }

    #[test]
    fn test_missing_subpage_is_a_hard_error() {
        let (context, _, _) = make_context();
        let result = export_element(
            &wire(json!([{ "id": Uuid::new_v4().to_string() }])),
            &descriptor(ElementKind::Subpages),
            &context,
        );
        assert!(matches!(
            result,
            Err(TransformError::UnresolvedId {
                kind: "content item",
                ..
            })
        ));
    }

    #[test]
    fn test_taxonomy_terms_resolved_through_nested_groups() {
        let (mut context, _, _) = make_context();
        let group_id = Uuid::new_v4();
        let leaf_id = Uuid::new_v4();
        context.environment.taxonomies = vec![TaxonomyGroup {
            id: group_id,
            codename: "topics".to_string(),
            name: "Topics".to_string(),
            terms: vec![TaxonomyTerm {
                id: Uuid::new_v4(),
                codename: "tech".to_string(),
                name: "Tech".to_string(),
                terms: vec![TaxonomyTerm {
                    id: leaf_id,
                    codename: "rust".to_string(),
                    name: "Rust".to_string(),
                    terms: vec![],
                }],
            }],
        }];
        let mut element_descriptor = descriptor(ElementKind::Taxonomy);
        element_descriptor.taxonomy_group = Some(group_id);

        let element = export_element(
            &wire(json!([{ "id": leaf_id.to_string() }])),
            &element_descriptor,
            &context,
        )
        .unwrap();
        assert_eq!(
            element,
            MigrationElement::Taxonomy {
                value: vec![CodenameReference::new("rust")]
            }
        );

        let result = export_element(
            &wire(json!([{ "id": Uuid::new_v4().to_string() }])),
            &element_descriptor,
            &context,
        );
        assert!(matches!(
            result,
            Err(TransformError::UnresolvedId {
                kind: "taxonomy term",
                ..
            })
        ));
    }

    #[test]
    fn test_multiple_choice_resolved_from_declared_options() {
        let (context, _, _) = make_context();
        let option_id = Uuid::new_v4();
        let mut element_descriptor = descriptor(ElementKind::MultipleChoice);
        element_descriptor.options = vec![MultipleChoiceOption {
            id: option_id,
            codename: "yes".to_string(),
        }];

        let element = export_element(
            &wire(json!([{ "id": option_id.to_string() }])),
            &element_descriptor,
            &context,
        )
        .unwrap();
        assert_eq!(
            element,
            MigrationElement::MultipleChoice {
                value: vec![CodenameReference::new("yes")]
            }
        );
    }

    #[test]
    fn test_url_slug_mode_defaults_to_autogenerated() {
        let (context, _, _) = make_context();
        let mut slug = wire(json!("about-us"));
        let element =
            export_element(&slug, &descriptor(ElementKind::UrlSlug), &context).unwrap();
        assert_eq!(
            element,
            MigrationElement::UrlSlug {
                value: Some("about-us".to_string()),
                mode: UrlSlugMode::Autogenerated,
            }
        );

        slug.mode = Some("custom".to_string());
        let element =
            export_element(&slug, &descriptor(ElementKind::UrlSlug), &context).unwrap();
        assert_eq!(
            element,
            MigrationElement::UrlSlug {
                value: Some("about-us".to_string()),
                mode: UrlSlugMode::Custom,
            }
        );
    }

    #[test]
    fn test_malformed_value_is_a_transform_error() {
        let (context, _, _) = make_context();
        let result = export_element(
            &wire(json!("not-an-array")),
            &descriptor(ElementKind::ModularContent),
            &context,
        );
        assert!(matches!(result, Err(TransformError::InvalidValue { .. })));
    }
}
