//! Export context fetching.
//!
//! Builds the transient view the export transforms resolve against: the
//! source environment's model, the requested items with their latest and
//! published variants, and the fetched closure of referenced items and
//! assets.

use std::collections::HashMap;

use tracing::{info, instrument};
use uuid::Uuid;

use content_migrator_api::models::{Asset, ContentItem, LanguageVariant};
use content_migrator_api::ManagementApi;
use content_migrator_shared::types::{
    Collection, EnvironmentData, FlattenedContentType, Language, Workflow,
    PUBLISHED_STEP_CODENAME,
};

use crate::errors::ExportError;
use crate::harness::{process_items, CancellationFlag, ItemResult, ProcessConfig};
use crate::references::extract_references;
use crate::transform::{
    describe_reference, resolve_collection, resolve_content_type, resolve_step, resolve_workflow,
};
use crate::workflow;

/// One (item, language) pair requested for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub item_codename: String,
    pub language_codename: String,
}

impl ExportRequest {
    pub fn new(item_codename: impl Into<String>, language_codename: impl Into<String>) -> Self {
        Self {
            item_codename: item_codename.into(),
            language_codename: language_codename.into(),
        }
    }
}

/// Configuration of one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// Replace links to unresolvable items with their plain-text content
    /// instead of leaving them untouched.
    pub replace_invalid_links: bool,
    /// Abort the run on the first per-item failure.
    pub fail_on_error: bool,
    pub cancellation: Option<CancellationFlag>,
}

/// One requested item with its resolved environment references and the
/// variant versions to export.
#[derive(Debug, Clone)]
pub struct ExportItem {
    pub item: ContentItem,
    pub content_type: FlattenedContentType,
    pub collection: Collection,
    pub language: Language,
    pub workflow: Workflow,
    pub versions: Vec<ExportVersion>,
}

/// One workflow version of a variant, with its step already resolved to a
/// codename.
#[derive(Debug, Clone)]
pub struct ExportVersion {
    pub variant: LanguageVariant,
    pub step_codename: String,
}

/// Source-side state of a referenced content item.
#[derive(Debug, Clone)]
pub enum ItemSourceState {
    Found(ContentItem),
    NotFound,
}

/// Source-side state of a referenced asset.
#[derive(Debug, Clone)]
pub enum AssetSourceState {
    Found(Asset),
    NotFound,
}

/// Fetched closure of everything the export items reference.
#[derive(Debug, Clone, Default)]
pub struct ReferencedData {
    pub items: HashMap<Uuid, ItemSourceState>,
    pub assets: HashMap<Uuid, AssetSourceState>,
}

/// The complete context the export transforms run against.
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub environment: EnvironmentData,
    pub items: Vec<ExportItem>,
    pub referenced: ReferencedData,
    pub replace_invalid_links: bool,
}

impl ExportContext {
    /// Resolves a content item id to its codename, looking at the export
    /// items first and the referenced closure second.
    pub fn item_codename(&self, id: &Uuid) -> Option<String> {
        if let Some(item) = self.items.iter().find(|i| &i.item.id == id) {
            return Some(item.item.codename.clone());
        }
        match self.referenced.items.get(id) {
            Some(ItemSourceState::Found(item)) => Some(item.codename.clone()),
            _ => None,
        }
    }

    pub fn asset_codename(&self, id: &Uuid) -> Option<String> {
        self.asset(id).map(|asset| asset.codename.clone())
    }

    pub fn asset(&self, id: &Uuid) -> Option<&Asset> {
        match self.referenced.assets.get(id) {
            Some(AssetSourceState::Found(asset)) => Some(asset),
            _ => None,
        }
    }
}

/// Loads the environment model in one pass. A failure here aborts the whole
/// pipeline; there is no per-item recovery without environment data.
pub async fn load_environment_data(
    api: &dyn ManagementApi,
) -> Result<EnvironmentData, content_migrator_api::ApiError> {
    let (collections, languages, workflows, taxonomies, content_types, asset_folders) = tokio::try_join!(
        api.list_collections(),
        api.list_languages(),
        api.list_workflows(),
        api.list_taxonomies(),
        api.list_content_types(),
        api.list_asset_folders(),
    )?;

    Ok(EnvironmentData {
        collections,
        languages,
        workflows,
        taxonomies,
        content_types,
        asset_folders,
    })
}

/// Builds the [`ExportContext`] for a set of requests.
#[instrument(skip_all, fields(request_count = requests.len()))]
pub async fn build_export_context(
    api: &dyn ManagementApi,
    requests: &[ExportRequest],
    config: &ExportConfig,
) -> Result<ExportContext, ExportError> {
    let environment = load_environment_data(api).await?;
    info!(
        collection_count = environment.collections.len(),
        language_count = environment.languages.len(),
        workflow_count = environment.workflows.len(),
        content_type_count = environment.content_types.len(),
        "loaded source environment data"
    );

    let items = prepare_export_items(api, &environment, requests, config).await?;
    let referenced = fetch_referenced_data(api, &environment, &items, config).await?;

    Ok(ExportContext {
        environment,
        items,
        referenced,
        replace_invalid_links: config.replace_invalid_links,
    })
}

async fn prepare_export_items(
    api: &dyn ManagementApi,
    environment: &EnvironmentData,
    requests: &[ExportRequest],
    config: &ExportConfig,
) -> Result<Vec<ExportItem>, ExportError> {
    let harness = ProcessConfig {
        parallel_limit: 1,
        fail_on_error: config.fail_on_error,
        cancellation: config.cancellation.clone(),
    };
    let results = process_items(
        "export items",
        requests.to_vec(),
        &harness,
        |request| format!("{} ({})", request.item_codename, request.language_codename),
        |request| async move { prepare_export_item(api, environment, &request).await },
    )
    .await?;

    Ok(results
        .into_iter()
        .filter_map(ItemResult::into_valid)
        .collect())
}

async fn prepare_export_item(
    api: &dyn ManagementApi,
    environment: &EnvironmentData,
    request: &ExportRequest,
) -> Result<ExportItem, ExportError> {
    let language = environment
        .language_by_codename(&request.language_codename)
        .ok_or_else(|| ExportError::lookup("language", &request.language_codename))?
        .clone();

    let item = api
        .view_content_item_by_codename(&request.item_codename)
        .await?;
    let latest = api
        .view_language_variant(&item.codename, &language.codename)
        .await?;

    let content_type = resolve_content_type(environment, &item.item_type)
        .ok_or_else(|| ExportError::lookup("content type", describe_reference(&item.item_type)))?
        .clone();
    let collection = resolve_collection(environment, &item.collection)
        .ok_or_else(|| ExportError::lookup("collection", describe_reference(&item.collection)))?
        .clone();
    let workflow = resolve_workflow(environment, &latest.workflow.workflow_identifier)
        .ok_or_else(|| {
            ExportError::lookup(
                "workflow",
                describe_reference(&latest.workflow.workflow_identifier),
            )
        })?
        .clone();
    let step = resolve_step(&workflow, &latest.workflow.step_identifier).ok_or_else(|| {
        ExportError::lookup(
            "workflow step",
            describe_reference(&latest.workflow.step_identifier),
        )
    })?;
    let step_codename = step.codename.clone();

    let mut versions = Vec::new();
    if !workflow::is_published_step(&step_codename) {
        // The latest variant is a draft; the published version, when one
        // exists, is exported alongside it.
        match api
            .view_published_language_variant(&item.codename, &language.codename)
            .await
        {
            Ok(published) => versions.push(ExportVersion {
                variant: published,
                step_codename: PUBLISHED_STEP_CODENAME.to_string(),
            }),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err.into()),
        }
    }
    versions.push(ExportVersion {
        variant: latest,
        step_codename,
    });

    Ok(ExportItem {
        item,
        content_type,
        collection,
        language,
        workflow,
        versions,
    })
}

async fn fetch_referenced_data(
    api: &dyn ManagementApi,
    environment: &EnvironmentData,
    items: &[ExportItem],
    config: &ExportConfig,
) -> Result<ReferencedData, ExportError> {
    let inputs = items.iter().flat_map(|item| {
        item.versions
            .iter()
            .map(move |version| (item.content_type.id, version.variant.elements.as_slice()))
    });
    let referenced_ids = extract_references(inputs, environment);

    let mut referenced = ReferencedData::default();
    for item in items {
        referenced
            .items
            .insert(item.item.id, ItemSourceState::Found(item.item.clone()));
    }

    let mut item_ids: Vec<Uuid> = referenced_ids
        .item_ids
        .into_iter()
        .filter(|id| !referenced.items.contains_key(id))
        .collect();
    item_ids.sort();

    let harness = ProcessConfig {
        parallel_limit: 1,
        fail_on_error: false,
        cancellation: config.cancellation.clone(),
    };
    let results = process_items(
        "referenced items",
        item_ids.clone(),
        &harness,
        |id| id.to_string(),
        |id| async move {
            api.view_content_item_by_id(&id)
                .await
                .map_err(ExportError::from)
        },
    )
    .await?;
    for (id, result) in item_ids.into_iter().zip(results) {
        match result {
            ItemResult::Valid(item) => {
                referenced.items.insert(id, ItemSourceState::Found(item));
            }
            ItemResult::NotFound => {
                referenced.items.insert(id, ItemSourceState::NotFound);
            }
            ItemResult::Cancelled => return Err(ExportError::Cancelled),
            ItemResult::Failed(err) => return Err(err),
        }
    }

    let mut asset_ids: Vec<Uuid> = referenced_ids.asset_ids.into_iter().collect();
    asset_ids.sort();
    let results = process_items(
        "referenced assets",
        asset_ids.clone(),
        &harness,
        |id| id.to_string(),
        |id| async move { api.view_asset_by_id(&id).await.map_err(ExportError::from) },
    )
    .await?;
    for (id, result) in asset_ids.into_iter().zip(results) {
        match result {
            ItemResult::Valid(asset) => {
                referenced.assets.insert(id, AssetSourceState::Found(asset));
            }
            ItemResult::NotFound => {
                referenced.assets.insert(id, AssetSourceState::NotFound);
            }
            ItemResult::Cancelled => return Err(ExportError::Cancelled),
            ItemResult::Failed(err) => return Err(err),
        }
    }

    info!(
        referenced_item_count = referenced.items.len(),
        referenced_asset_count = referenced.assets.len(),
        "fetched reference closure"
    );
    Ok(referenced)
}

