//! Import context building.
//!
//! Probes the target environment for every codename in the snapshot and
//! decides an external-id strategy for the entities that do not exist yet,
//! so an interrupted import can be re-run without creating duplicates.

use std::collections::{HashMap, HashSet};

use tracing::{info, instrument};
use uuid::Uuid;

use content_migrator_api::models::{Asset, ContentItem, LanguageVariant, Reference};
use content_migrator_api::ManagementApi;
use content_migrator_shared::types::{EnvironmentData, MigrationData};

use crate::errors::ImportError;
use crate::export::context::load_environment_data;
use crate::harness::{process_items, ItemResult, ProcessConfig};
use crate::transform::{describe_reference, resolve_collection, resolve_step, resolve_workflow};
use crate::workflow;

/// Supplies the idempotency keys used when creating missing entities.
///
/// The platform deduplicates creates by external id even before a codename
/// is assigned, so a stable generator makes interrupted imports safely
/// re-runnable. The default strategy is the source codename itself.
pub trait ExternalIdGenerator: Send + Sync {
    fn content_item_external_id(&self, codename: &str) -> String {
        codename.to_string()
    }

    fn asset_external_id(&self, codename: &str) -> String {
        codename.to_string()
    }
}

/// The default external-id strategy: codenames as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodenameExternalIds;

impl ExternalIdGenerator for CodenameExternalIds {}

/// Target-side state of one content item codename.
#[derive(Debug, Clone)]
pub enum ItemTargetState {
    Exists(ContentItem),
    Missing { external_id: String },
}

/// Target-side state of one asset codename.
#[derive(Debug, Clone)]
pub enum AssetTargetState {
    Exists(Asset),
    Missing { external_id: String },
}

/// Workflow position of a probed target variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Draft,
    Published,
    Archived,
}

/// Scheduling reported for a probed target variant. The published-variant
/// probe can report this stale or inverted, so it is treated as a hint:
/// whatever is observed gets cancelled tolerantly before import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledState {
    Publish,
    Unpublish,
    None,
}

/// One probed variant with its classification.
#[derive(Debug, Clone)]
pub struct TargetVariant {
    pub variant: LanguageVariant,
    pub workflow_state: WorkflowState,
    pub scheduled_state: ScheduledState,
}

/// Target-side state of one (item, language) pair.
#[derive(Debug, Clone, Default)]
pub struct VariantTargetState {
    pub draft: Option<TargetVariant>,
    pub published: Option<TargetVariant>,
}

impl VariantTargetState {
    /// The variant currently addressed by the latest endpoint: the draft
    /// when one exists, the published variant otherwise.
    pub fn latest(&self) -> Option<&TargetVariant> {
        self.draft.as_ref().or(self.published.as_ref())
    }
}

/// The complete view of the target the import stages run against.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub environment: EnvironmentData,
    pub items: HashMap<String, ItemTargetState>,
    pub variants: HashMap<(String, String), VariantTargetState>,
    pub assets: HashMap<String, AssetTargetState>,
}

impl ImportContext {
    pub fn item_id(&self, codename: &str) -> Option<Uuid> {
        match self.items.get(codename) {
            Some(ItemTargetState::Exists(item)) => Some(item.id),
            _ => None,
        }
    }

    pub fn asset_id(&self, codename: &str) -> Option<Uuid> {
        self.target_asset(codename).map(|asset| asset.id)
    }

    pub fn target_asset(&self, codename: &str) -> Option<&Asset> {
        match self.assets.get(codename) {
            Some(AssetTargetState::Exists(asset)) => Some(asset),
            _ => None,
        }
    }

    pub fn variant_state(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Option<&VariantTargetState> {
        self.variants
            .get(&(item_codename.to_string(), language_codename.to_string()))
    }

    /// Records an item created (or refreshed) by the item importer so later
    /// stages resolve its id. Written at most once per codename per run.
    pub fn record_created_item(&mut self, item: ContentItem) {
        self.items
            .insert(item.codename.clone(), ItemTargetState::Exists(item));
    }

    pub fn record_created_asset(&mut self, asset: Asset) {
        self.assets
            .insert(asset.codename.clone(), AssetTargetState::Exists(asset));
    }

    /// Resolves a collection reference from the target into its codename.
    pub fn collection_codename(&self, reference: &Reference) -> Option<String> {
        resolve_collection(&self.environment, reference).map(|c| c.codename.clone())
    }

    /// Snapshot item codenames that already exist in the target.
    pub fn existing_snapshot_items(&self, data: &MigrationData) -> Vec<String> {
        let mut seen = HashSet::new();
        data.items
            .iter()
            .filter(|item| seen.insert(item.system.codename.as_str()))
            .filter(|item| {
                matches!(
                    self.items.get(&item.system.codename),
                    Some(ItemTargetState::Exists(_))
                )
            })
            .map(|item| item.system.codename.clone())
            .collect()
    }
}

/// Probes the target environment for every codename in the snapshot.
#[instrument(skip_all)]
pub async fn build_import_context(
    api: &dyn ManagementApi,
    data: &MigrationData,
    external_ids: &dyn ExternalIdGenerator,
) -> Result<ImportContext, ImportError> {
    let environment = load_environment_data(api).await?;
    info!(
        language_count = environment.languages.len(),
        workflow_count = environment.workflows.len(),
        "loaded target environment data"
    );

    let harness = ProcessConfig::serial(false);

    // Item shells.
    let mut item_codenames: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for item in &data.items {
        if seen.insert(item.system.codename.as_str()) {
            item_codenames.push(item.system.codename.clone());
        }
    }
    let results = process_items(
        "target item probes",
        item_codenames.clone(),
        &harness,
        |codename| codename.clone(),
        |codename| async move {
            api.view_content_item_by_codename(&codename)
                .await
                .map_err(ImportError::from)
        },
    )
    .await?;
    let mut items = HashMap::new();
    for (codename, result) in item_codenames.into_iter().zip(results) {
        let state = match result {
            ItemResult::Valid(item) => ItemTargetState::Exists(item),
            ItemResult::NotFound => ItemTargetState::Missing {
                external_id: external_ids.content_item_external_id(&codename),
            },
            ItemResult::Cancelled => return Err(ImportError::Cancelled),
            ItemResult::Failed(err) => return Err(err),
        };
        items.insert(codename, state);
    }

    // Language variants, one probe per snapshot (item, language) pair.
    let pairs: Vec<(String, String)> = data
        .items
        .iter()
        .map(|item| {
            (
                item.system.codename.clone(),
                item.system.language.codename.clone(),
            )
        })
        .collect();
    let results = process_items(
        "target variant probes",
        pairs.clone(),
        &harness,
        |(item, language)| format!("{item} ({language})"),
        |(item, language)| {
            let environment = &environment;
            async move { probe_variant(api, environment, &item, &language).await }
        },
    )
    .await?;
    let mut variants = HashMap::new();
    for (pair, result) in pairs.into_iter().zip(results) {
        match result {
            ItemResult::Valid(state) => {
                variants.insert(pair, state);
            }
            ItemResult::NotFound => {
                variants.insert(pair, VariantTargetState::default());
            }
            ItemResult::Cancelled => return Err(ImportError::Cancelled),
            ItemResult::Failed(err) => return Err(err),
        }
    }

    // Assets.
    let asset_codenames: Vec<String> = data.assets.iter().map(|a| a.codename.clone()).collect();
    let results = process_items(
        "target asset probes",
        asset_codenames.clone(),
        &harness,
        |codename| codename.clone(),
        |codename| async move {
            api.view_asset_by_codename(&codename)
                .await
                .map_err(ImportError::from)
        },
    )
    .await?;
    let mut assets = HashMap::new();
    for (codename, result) in asset_codenames.into_iter().zip(results) {
        let state = match result {
            ItemResult::Valid(asset) => AssetTargetState::Exists(asset),
            ItemResult::NotFound => AssetTargetState::Missing {
                external_id: external_ids.asset_external_id(&codename),
            },
            ItemResult::Cancelled => return Err(ImportError::Cancelled),
            ItemResult::Failed(err) => return Err(err),
        };
        assets.insert(codename, state);
    }

    Ok(ImportContext {
        environment,
        items,
        variants,
        assets,
    })
}

async fn probe_variant(
    api: &dyn ManagementApi,
    environment: &EnvironmentData,
    item_codename: &str,
    language_codename: &str,
) -> Result<VariantTargetState, ImportError> {
    let latest = match api
        .view_language_variant(item_codename, language_codename)
        .await
    {
        Ok(variant) => variant,
        Err(err) if err.is_not_found() => return Ok(VariantTargetState::default()),
        Err(err) => return Err(err.into()),
    };

    let workflow = resolve_workflow(environment, &latest.workflow.workflow_identifier)
        .ok_or_else(|| {
            ImportError::lookup(
                "workflow",
                describe_reference(&latest.workflow.workflow_identifier),
            )
        })?;
    let step = resolve_step(workflow, &latest.workflow.step_identifier).ok_or_else(|| {
        ImportError::lookup(
            "workflow step",
            describe_reference(&latest.workflow.step_identifier),
        )
    })?;

    let mut state = VariantTargetState::default();

    if workflow::is_published_step(&step.codename) {
        let scheduled_state = match &latest.schedule {
            Some(schedule) if schedule.unpublish_time.is_some() => ScheduledState::Unpublish,
            _ => ScheduledState::None,
        };
        state.published = Some(TargetVariant {
            variant: latest,
            workflow_state: WorkflowState::Published,
            scheduled_state,
        });
        return Ok(state);
    }

    let (workflow_state, scheduled_state) = if workflow::is_archived_step(&step.codename) {
        (WorkflowState::Archived, ScheduledState::None)
    } else if workflow::is_scheduled_step(&step.codename) {
        (WorkflowState::Draft, ScheduledState::Publish)
    } else {
        (WorkflowState::Draft, ScheduledState::None)
    };
    state.draft = Some(TargetVariant {
        variant: latest,
        workflow_state,
        scheduled_state,
    });

    match api
        .view_published_language_variant(item_codename, language_codename)
        .await
    {
        Ok(published) => {
            let scheduled_state = match &published.schedule {
                Some(schedule) if schedule.unpublish_time.is_some() => ScheduledState::Unpublish,
                _ => ScheduledState::None,
            };
            state.published = Some(TargetVariant {
                variant: published,
                workflow_state: WorkflowState::Published,
                scheduled_state,
            });
        }
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err.into()),
    }

    Ok(state)
}
