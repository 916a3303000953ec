use serde::{Deserialize, Serialize};

use super::component::MigrationComponent;
use super::reference::CodenameReference;

/// The closed set of element types the platform defines.
///
/// The transform registry dispatches on this enum; there is no open
/// polymorphism anywhere in the element layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Text,
    Number,
    DateTime,
    RichText,
    Asset,
    Taxonomy,
    ModularContent,
    Custom,
    UrlSlug,
    MultipleChoice,
    Subpages,
}

impl ElementKind {
    /// Returns the element type name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Number => "number",
            ElementKind::DateTime => "date_time",
            ElementKind::RichText => "rich_text",
            ElementKind::Asset => "asset",
            ElementKind::Taxonomy => "taxonomy",
            ElementKind::ModularContent => "modular_content",
            ElementKind::Custom => "custom",
            ElementKind::UrlSlug => "url_slug",
            ElementKind::MultipleChoice => "multiple_choice",
            ElementKind::Subpages => "subpages",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generation mode of a `url_slug` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlSlugMode {
    #[default]
    Autogenerated,
    Custom,
}

/// One element value in its codename-addressed migration form.
///
/// The variant tag doubles as the element type on disk
/// (`{"type": "text", "value": ...}`), so the snapshot stays self-describing
/// without a separate type registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MigrationElement {
    Text {
        value: Option<String>,
    },
    Custom {
        value: Option<String>,
    },
    Number {
        value: Option<f64>,
    },
    DateTime {
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_timezone: Option<String>,
    },
    UrlSlug {
        value: Option<String>,
        #[serde(default)]
        mode: UrlSlugMode,
    },
    Asset {
        value: Vec<CodenameReference>,
    },
    Taxonomy {
        value: Vec<CodenameReference>,
    },
    MultipleChoice {
        value: Vec<CodenameReference>,
    },
    ModularContent {
        value: Vec<CodenameReference>,
    },
    Subpages {
        value: Vec<CodenameReference>,
    },
    RichText {
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        components: Vec<MigrationComponent>,
    },
}

impl MigrationElement {
    /// The element type this value belongs to.
    pub fn kind(&self) -> ElementKind {
        match self {
            MigrationElement::Text { .. } => ElementKind::Text,
            MigrationElement::Custom { .. } => ElementKind::Custom,
            MigrationElement::Number { .. } => ElementKind::Number,
            MigrationElement::DateTime { .. } => ElementKind::DateTime,
            MigrationElement::UrlSlug { .. } => ElementKind::UrlSlug,
            MigrationElement::Asset { .. } => ElementKind::Asset,
            MigrationElement::Taxonomy { .. } => ElementKind::Taxonomy,
            MigrationElement::MultipleChoice { .. } => ElementKind::MultipleChoice,
            MigrationElement::ModularContent { .. } => ElementKind::ModularContent,
            MigrationElement::Subpages { .. } => ElementKind::Subpages,
            MigrationElement::RichText { .. } => ElementKind::RichText,
        }
    }
}
