//! Import direction: migration values → wire contracts for the target
//! environment.

use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use content_migrator_api::models::{Reference, WireElement};
use content_migrator_shared::types::{CodenameReference, FlattenedElement, MigrationElement};

use crate::errors::TransformError;
use crate::import::context::ImportContext;
use crate::richtext;

fn id_array(ids: impl IntoIterator<Item = Uuid>) -> Value {
    Value::Array(
        ids.into_iter()
            .map(|id| json!({ "id": id.to_string() }))
            .collect(),
    )
}

fn optional_string(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}

/// Translates one migration element into the wire contract the management
/// API expects, resolving codenames against the target environment.
///
/// Missing target assets and linked items are dropped with a warning;
/// missing subpages, taxonomy terms and choice options are hard errors.
pub fn import_element(
    codename: &str,
    element: &MigrationElement,
    descriptor: &FlattenedElement,
    ctx: &ImportContext,
) -> Result<WireElement, TransformError> {
    let reference = Reference::by_codename(codename);
    let wire = |value: Value| WireElement {
        element: reference.clone(),
        value,
        components: Vec::new(),
        mode: None,
        display_timezone: None,
    };

    match element {
        MigrationElement::Text { value } | MigrationElement::Custom { value } => {
            Ok(wire(optional_string(value)))
        }

        MigrationElement::Number { value } => {
            let value = match value {
                Some(number) => serde_json::Number::from_f64(*number)
                    .map(Value::Number)
                    .ok_or(TransformError::InvalidValue {
                        element: codename.to_string(),
                        expected: "a finite number",
                    })?,
                None => Value::Null,
            };
            Ok(wire(value))
        }

        MigrationElement::DateTime {
            value,
            display_timezone,
        } => {
            let mut element = wire(optional_string(value));
            element.display_timezone = display_timezone.clone();
            Ok(element)
        }

        MigrationElement::UrlSlug { value, mode: _ } => {
            let mut element = wire(optional_string(value));
            // The exported slug must survive as-is in the target, so the
            // import always writes it in custom mode.
            element.mode = Some("custom".to_string());
            Ok(element)
        }

        MigrationElement::Asset { value } => {
            let ids = resolve_lenient(codename, value, "asset", |c| ctx.asset_id(c));
            Ok(wire(id_array(ids)))
        }

        MigrationElement::Taxonomy { value } => {
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
            let ids = value
                .iter()
                .map(|term| {
                    group
                        .term_by_codename(&term.codename)
                        .map(|t| t.id)
                        .ok_or_else(|| TransformError::UnresolvedCodename {
                            kind: "taxonomy term",
                            codename: term.codename.clone(),
                            element: codename.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(wire(id_array(ids)))
        }

        MigrationElement::MultipleChoice { value } => {
            let ids = value
                .iter()
                .map(|option| {
                    descriptor
                        .options
                        .iter()
                        .find(|o| o.codename == option.codename)
                        .map(|o| o.id)
                        .ok_or_else(|| TransformError::UnresolvedCodename {
                            kind: "choice option",
                            codename: option.codename.clone(),
                            element: codename.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(wire(id_array(ids)))
        }

        MigrationElement::ModularContent { value } => {
            let ids = resolve_lenient(codename, value, "content item", |c| ctx.item_id(c));
            Ok(wire(id_array(ids)))
        }

        MigrationElement::Subpages { value } => {
            let ids = value
                .iter()
                .map(|item| {
                    ctx.item_id(&item.codename).ok_or_else(|| {
                        TransformError::UnresolvedCodename {
                            kind: "content item",
                            codename: item.codename.clone(),
                            element: codename.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(wire(id_array(ids)))
        }

        MigrationElement::RichText { value, components } => {
            let imported =
                richtext::import_rich_text(codename, value.as_deref(), components, ctx)?;
            let mut element = wire(optional_string(&imported.value));
            element.components = imported.components;
            Ok(element)
        }
    }
}

/// Resolves codenames against the target, dropping (with a warning) the
/// ones that do not exist there.
fn resolve_lenient(
    element: &str,
    references: &[CodenameReference],
    kind: &'static str,
    resolve: impl Fn(&str) -> Option<Uuid>,
) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for reference in references {
        match resolve(&reference.codename) {
            Some(id) => ids.push(id),
            None => warn!(
                element = %element,
                codename = %reference.codename,
                "dropping {kind} reference missing from the target"
            ),
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::import::context::{
        AssetTargetState, ImportContext, ItemTargetState,
    };
    use content_migrator_api::models::{Asset, ContentItem};
    use content_migrator_shared::types::{
        ElementKind, EnvironmentData, MultipleChoiceOption, TaxonomyGroup, TaxonomyTerm,
    };

    fn make_context() -> (ImportContext, Uuid, Uuid) {
        let item_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();

        let mut items = HashMap::new();
        items.insert(
            "faq".to_string(),
            ItemTargetState::Exists(ContentItem {
                id: item_id,
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
            environment: EnvironmentData::default(),
            items,
            variants: HashMap::new(),
            assets,
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

    #[test]
    fn test_asset_codenames_become_target_ids() {
        let (context, _, asset_id) = make_context();
        let element = MigrationElement::Asset {
            value: vec![
                CodenameReference::new("logo"),
                CodenameReference::new("missing"),
            ],
        };
        let wire = import_element(
            "gallery",
            &element,
            &descriptor(ElementKind::Asset),
            &context,
        )
        .unwrap();
        // The missing asset is skipped, not failed.
        assert_eq!(wire.value, json!([{ "id": asset_id.to_string() }]));
    }

    #[test]
    fn test_modular_content_drops_missing_target_items() {
        let (context, item_id, _) = make_context();
        let element = MigrationElement::ModularContent {
            value: vec![
                CodenameReference::new("faq"),
                CodenameReference::new("gone"),
            ],
        };
        let wire = import_element(
            "related",
            &element,
            &descriptor(ElementKind::ModularContent),
            &context,
        )
        .unwrap();
        assert_eq!(wire.value, json!([{ "id": item_id.to_string() }]));
    }

    #[test]
    fn test_missing_subpage_is_a_hard_error() {
        let (context, _, _) = make_context();
        let element = MigrationElement::Subpages {
            value: vec![CodenameReference::new("gone")],
        };
        let result = import_element(
            "subpages",
            &element,
            &descriptor(ElementKind::Subpages),
            &context,
        );
        assert!(matches!(
            result,
            Err(TransformError::UnresolvedCodename {
                kind: "content item",
                ..
            })
        ));
    }

    #[test]
    fn test_taxonomy_codenames_resolve_to_target_ids() {
        let (mut context, _, _) = make_context();
        let group_id = Uuid::new_v4();
        let term_id = Uuid::new_v4();
        context.environment.taxonomies = vec![TaxonomyGroup {
            id: group_id,
            codename: "topics".to_string(),
            name: "Topics".to_string(),
            terms: vec![TaxonomyTerm {
                id: term_id,
                codename: "rust".to_string(),
                name: "Rust".to_string(),
                terms: vec![],
            }],
        }];
        let mut element_descriptor = descriptor(ElementKind::Taxonomy);
        element_descriptor.taxonomy_group = Some(group_id);

        let element = MigrationElement::Taxonomy {
            value: vec![CodenameReference::new("rust")],
        };
        let wire = import_element("topics", &element, &element_descriptor, &context).unwrap();
        assert_eq!(wire.value, json!([{ "id": term_id.to_string() }]));

        let element = MigrationElement::Taxonomy {
            value: vec![CodenameReference::new("cooking")],
        };
        assert!(import_element("topics", &element, &element_descriptor, &context).is_err());
    }

    #[test]
    fn test_multiple_choice_codenames_resolve_against_options() {
        let (context, _, _) = make_context();
        let option_id = Uuid::new_v4();
        let mut element_descriptor = descriptor(ElementKind::MultipleChoice);
        element_descriptor.options = vec![MultipleChoiceOption {
            id: option_id,
            codename: "yes".to_string(),
        }];

        let element = MigrationElement::MultipleChoice {
            value: vec![CodenameReference::new("yes")],
        };
        let wire = import_element("choice", &element, &element_descriptor, &context).unwrap();
        assert_eq!(wire.value, json!([{ "id": option_id.to_string() }]));
    }

    #[test]
    fn test_url_slug_imports_in_custom_mode() {
        let (context, _, _) = make_context();
        let element = MigrationElement::UrlSlug {
            value: Some("about-us".to_string()),
            mode: Default::default(),
        };
        let wire = import_element(
            "slug",
            &element,
            &descriptor(ElementKind::UrlSlug),
            &context,
        )
        .unwrap();
        assert_eq!(wire.mode.as_deref(), Some("custom"));
        assert_eq!(wire.value, json!("about-us"));
    }

    #[test]
    fn test_number_zero_survives_import() {
        let (context, _, _) = make_context();
        let element = MigrationElement::Number { value: Some(0.0) };
        let wire = import_element(
            "count",
            &element,
            &descriptor(ElementKind::Number),
            &context,
        )
        .unwrap();
        assert_eq!(wire.value, json!(0.0));
    }
}
