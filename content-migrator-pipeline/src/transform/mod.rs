//! Element value translation between wire form and migration form.
//!
//! One export and one import function per element type, dispatched on the
//! closed [`ElementKind`] enum. Wire values arrive as raw JSON and are
//! parsed here, so a value that does not match its declared element type
//! surfaces as a per-item transform error.

mod export;
mod import;

pub use export::export_element;
pub use import::import_element;

use serde_json::Value;
use uuid::Uuid;

use content_migrator_api::models::Reference;
use content_migrator_shared::types::{
    Collection, EnvironmentData, FlattenedContentType, Workflow, WorkflowStep,
};

use crate::errors::TransformError;

/// Resolves a content type reference (id or codename) in environment data.
pub(crate) fn resolve_content_type<'a>(
    environment: &'a EnvironmentData,
    reference: &Reference,
) -> Option<&'a FlattenedContentType> {
    if let Some(id) = &reference.id {
        return environment.content_type_by_id(id);
    }
    reference
        .codename
        .as_deref()
        .and_then(|codename| environment.content_type_by_codename(codename))
}

/// Resolves a collection reference (id or codename) in environment data.
pub(crate) fn resolve_collection<'a>(
    environment: &'a EnvironmentData,
    reference: &Reference,
) -> Option<&'a Collection> {
    if let Some(id) = &reference.id {
        return environment.collection_by_id(id);
    }
    reference
        .codename
        .as_deref()
        .and_then(|codename| environment.collection_by_codename(codename))
}

/// Resolves a workflow reference (id or codename) in environment data.
pub(crate) fn resolve_workflow<'a>(
    environment: &'a EnvironmentData,
    reference: &Reference,
) -> Option<&'a Workflow> {
    if let Some(id) = &reference.id {
        return environment.workflow_by_id(id);
    }
    reference
        .codename
        .as_deref()
        .and_then(|codename| environment.workflow_by_codename(codename))
}

/// Resolves a step reference (id or codename) within one workflow.
pub(crate) fn resolve_step<'a>(
    workflow: &'a Workflow,
    reference: &Reference,
) -> Option<&'a WorkflowStep> {
    if let Some(id) = &reference.id {
        return workflow.all_steps().find(|s| &s.id == id);
    }
    reference
        .codename
        .as_deref()
        .and_then(|codename| workflow.all_steps().find(|s| s.codename == codename))
}

/// Renders a reference for error messages.
pub(crate) fn describe_reference(reference: &Reference) -> String {
    if let Some(id) = &reference.id {
        return id.to_string();
    }
    if let Some(codename) = &reference.codename {
        return codename.clone();
    }
    reference
        .external_id
        .clone()
        .unwrap_or_else(|| "<empty reference>".to_string())
}

/// Parses a wire value expected to be an array of `{id}` references.
/// `null` is an empty array; anything else is a transform error.
pub(crate) fn reference_ids(element: &str, value: &Value) -> Result<Vec<Uuid>, TransformError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        _ => {
            return Err(TransformError::InvalidValue {
                element: element.to_string(),
                expected: "an array of references",
            })
        }
    };

    entries
        .iter()
        .map(|entry| {
            entry
                .get("id")
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| TransformError::InvalidValue {
                    element: element.to_string(),
                    expected: "an array of references",
                })
        })
        .collect()
}

/// Parses an optional string wire value.
pub(crate) fn string_value(element: &str, value: &Value) -> Result<Option<String>, TransformError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(TransformError::InvalidValue {
            element: element.to_string(),
            expected: "a string",
        }),
    }
}

/// Parses an optional numeric wire value. Zero is a value, not an absence.
pub(crate) fn number_value(element: &str, value: &Value) -> Result<Option<f64>, TransformError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        _ => Err(TransformError::InvalidValue {
            element: element.to_string(),
            expected: "a number",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_ids_parses_id_arrays() {
        let id = Uuid::new_v4();
        let value = json!([{ "id": id.to_string() }]);
        assert_eq!(reference_ids("tags", &value).unwrap(), vec![id]);
        assert_eq!(
            reference_ids("tags", &Value::Null).unwrap(),
            Vec::<Uuid>::new()
        );
    }

    #[test]
    fn test_reference_ids_rejects_non_arrays() {
        assert!(matches!(
            reference_ids("tags", &json!("oops")),
            Err(TransformError::InvalidValue { .. })
        ));
        assert!(matches!(
            reference_ids("tags", &json!([{ "codename": "x" }])),
            Err(TransformError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_number_value_preserves_zero() {
        assert_eq!(number_value("count", &json!(0)).unwrap(), Some(0.0));
        assert_eq!(number_value("count", &Value::Null).unwrap(), None);
        assert!(number_value("count", &json!("3")).is_err());
    }
}
