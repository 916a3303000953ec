//! Error types for the element transform layer.
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TransformError {
    /// The wire value does not have the shape its element type mandates.
    #[error("element '{element}' expected {expected}")]
    InvalidValue {
        element: String,
        expected: &'static str,
    },

    /// A referenced id could not be resolved in the source environment.
    #[error("{kind} {id} referenced by element '{element}' cannot be resolved")]
    UnresolvedId {
        kind: &'static str,
        id: Uuid,
        element: String,
    },

    /// A snapshot codename could not be resolved in the target environment.
    #[error("{kind} '{codename}' referenced by element '{element}' cannot be resolved in the target environment")]
    UnresolvedCodename {
        kind: &'static str,
        codename: String,
        element: String,
    },

    /// The variant carries an element its content type does not declare.
    #[error("element {element} is not declared by content type '{content_type}'")]
    UnknownElement {
        element: String,
        content_type: String,
    },

    /// A taxonomy element without a declared taxonomy group, or a group
    /// missing from the environment.
    #[error("element '{element}' has no usable taxonomy group")]
    MissingTaxonomyGroup { element: String },
}
