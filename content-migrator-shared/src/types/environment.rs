//! Models of one environment's content model.
//!
//! These are loaded once per pipeline run (collections, languages,
//! workflows, taxonomies, flattened content types, asset folders) and used
//! for every id⇄codename translation afterwards. They carry both ids and
//! codenames; only the environment side of the system ever sees ids.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::element::ElementKind;

/// Codename of the published pseudo-step every workflow carries.
pub const PUBLISHED_STEP_CODENAME: &str = "published";
/// Codename of the archived pseudo-step every workflow carries.
pub const ARCHIVED_STEP_CODENAME: &str = "archived";
/// Codename of the scheduled pseudo-step every workflow carries.
pub const SCHEDULED_STEP_CODENAME: &str = "scheduled";

/// Everything the pipelines need to know about one environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentData {
    pub collections: Vec<Collection>,
    pub languages: Vec<Language>,
    pub workflows: Vec<Workflow>,
    pub taxonomies: Vec<TaxonomyGroup>,
    pub content_types: Vec<FlattenedContentType>,
    pub asset_folders: Vec<AssetFolder>,
}

impl EnvironmentData {
    pub fn collection_by_id(&self, id: &Uuid) -> Option<&Collection> {
        self.collections.iter().find(|c| &c.id == id)
    }

    pub fn collection_by_codename(&self, codename: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.codename == codename)
    }

    pub fn language_by_id(&self, id: &Uuid) -> Option<&Language> {
        self.languages.iter().find(|l| &l.id == id)
    }

    pub fn language_by_codename(&self, codename: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.codename == codename)
    }

    pub fn workflow_by_id(&self, id: &Uuid) -> Option<&Workflow> {
        self.workflows.iter().find(|w| &w.id == id)
    }

    pub fn workflow_by_codename(&self, codename: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.codename == codename)
    }

    pub fn content_type_by_id(&self, id: &Uuid) -> Option<&FlattenedContentType> {
        self.content_types.iter().find(|t| &t.id == id)
    }

    pub fn content_type_by_codename(&self, codename: &str) -> Option<&FlattenedContentType> {
        self.content_types.iter().find(|t| t.codename == codename)
    }

    pub fn taxonomy_by_id(&self, id: &Uuid) -> Option<&TaxonomyGroup> {
        self.taxonomies.iter().find(|t| &t.id == id)
    }

    pub fn taxonomy_by_codename(&self, codename: &str) -> Option<&TaxonomyGroup> {
        self.taxonomies.iter().find(|t| t.codename == codename)
    }

    pub fn asset_folder_by_id(&self, id: &Uuid) -> Option<&AssetFolder> {
        self.asset_folders.iter().find(|f| &f.id == id)
    }

    pub fn asset_folder_by_codename(&self, codename: &str) -> Option<&AssetFolder> {
        self.asset_folders.iter().find(|f| f.codename == codename)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub codename: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: Uuid,
    pub codename: String,
    pub name: String,
}

/// A workflow definition: the ordered custom steps plus the three
/// pseudo-steps every workflow carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub codename: String,
    pub name: String,
    pub steps: Vec<WorkflowStep>,
    pub published_step: WorkflowStep,
    pub archived_step: WorkflowStep,
    pub scheduled_step: WorkflowStep,
}

impl Workflow {
    /// The first (entry) step of the workflow.
    pub fn first_step(&self) -> Option<&WorkflowStep> {
        self.steps.first()
    }

    /// Iterates the custom steps followed by the pseudo-steps, in the order
    /// the environment declares them.
    pub fn all_steps(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.steps.iter().chain([
            &self.published_step,
            &self.archived_step,
            &self.scheduled_step,
        ])
    }
}

/// One step in a workflow's directed transition graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: Uuid,
    pub codename: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions_to: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyGroup {
    pub id: Uuid,
    pub codename: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<TaxonomyTerm>,
}

impl TaxonomyGroup {
    /// Depth-first search for a term by id anywhere in the group.
    pub fn term_by_id(&self, id: &Uuid) -> Option<&TaxonomyTerm> {
        find_term(&self.terms, &|t| &t.id == id)
    }

    /// Depth-first search for a term by codename anywhere in the group.
    pub fn term_by_codename(&self, codename: &str) -> Option<&TaxonomyTerm> {
        find_term(&self.terms, &|t| t.codename == codename)
    }
}

fn find_term<'a>(
    terms: &'a [TaxonomyTerm],
    matches: &dyn Fn(&TaxonomyTerm) -> bool,
) -> Option<&'a TaxonomyTerm> {
    for term in terms {
        if matches(term) {
            return Some(term);
        }
        if let Some(found) = find_term(&term.terms, matches) {
            return Some(found);
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub id: Uuid,
    pub codename: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<TaxonomyTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFolder {
    pub id: Uuid,
    pub codename: String,
    pub name: String,
}

/// The content model flattened into a list of element descriptors.
///
/// Snippet indirection is resolved by the client before the model reaches
/// the pipelines, so element lookups are a flat scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedContentType {
    pub id: Uuid,
    pub codename: String,
    pub elements: Vec<FlattenedElement>,
}

impl FlattenedContentType {
    pub fn element_by_id(&self, id: &Uuid) -> Option<&FlattenedElement> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn element_by_codename(&self, codename: &str) -> Option<&FlattenedElement> {
        self.elements.iter().find(|e| e.codename == codename)
    }
}

/// One element descriptor of a flattened content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedElement {
    pub id: Uuid,
    pub codename: String,
    pub kind: ElementKind,
    /// Taxonomy group this element draws terms from; only for `taxonomy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_group: Option<Uuid>,
    /// Declared options; only for `multiple_choice`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<MultipleChoiceOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceOption {
    pub id: Uuid,
    pub codename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(id: Uuid, codename: &str, children: Vec<TaxonomyTerm>) -> TaxonomyTerm {
        TaxonomyTerm {
            id,
            codename: codename.to_string(),
            name: codename.to_string(),
            terms: children,
        }
    }

    #[test]
    fn test_term_lookup_descends_into_nested_terms() {
        let leaf_id = Uuid::new_v4();
        let group = TaxonomyGroup {
            id: Uuid::new_v4(),
            codename: "topics".to_string(),
            name: "Topics".to_string(),
            terms: vec![term(
                Uuid::new_v4(),
                "tech",
                vec![term(leaf_id, "rust", vec![])],
            )],
        };

        assert_eq!(group.term_by_id(&leaf_id).unwrap().codename, "rust");
        assert_eq!(group.term_by_codename("rust").unwrap().id, leaf_id);
        assert!(group.term_by_codename("cooking").is_none());
    }
}
