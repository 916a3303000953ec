//! In-memory [`ManagementApi`] implementation for tests.
//!
//! The mock keeps just enough variant state to exercise the import-side
//! workflow driver: publish/unpublish/new-version/change-workflow mutate the
//! stored variants the way the platform would, and every mutating call is
//! appended to an operation log tests can assert against.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use content_migrator_shared::types::{
    AssetFolder, Collection, EnvironmentData, FlattenedContentType, Language, TaxonomyGroup,
    Workflow,
};

use crate::error::{ApiError, NOTHING_SCHEDULED_ERROR_CODE};
use crate::models::{
    Asset, AssetAdd, AssetUpsert, BinaryFileUpload, ContentItem, ContentItemAdd,
    ContentItemUpsert, FileReference, LanguageVariant, LanguageVariantUpsert, Reference,
    SchedulePayload, WorkflowAssignment,
};
use crate::ManagementApi;

#[derive(Default)]
struct MockVariant {
    latest: LanguageVariant,
    published: Option<LanguageVariant>,
}

#[derive(Default)]
struct MockState {
    environment: EnvironmentData,
    items: Vec<ContentItem>,
    variants: HashMap<(String, String), MockVariant>,
    assets: Vec<Asset>,
    binaries: HashMap<String, Vec<u8>>,
    uploads: HashMap<Uuid, BinaryFileUpload>,
    operations: Vec<String>,
    publish_failures: HashSet<(String, String)>,
}

/// Configurable in-memory management API.
#[derive(Default)]
pub struct MockManagementApi {
    state: Mutex<MockState>,
}

impl MockManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_environment(&self, environment: EnvironmentData) {
        self.state.lock().unwrap().environment = environment;
    }

    pub fn insert_content_item(&self, item: ContentItem) {
        self.state.lock().unwrap().items.push(item);
    }

    pub fn insert_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        latest: LanguageVariant,
        published: Option<LanguageVariant>,
    ) {
        self.state.lock().unwrap().variants.insert(
            (item_codename.to_string(), language_codename.to_string()),
            MockVariant { latest, published },
        );
    }

    pub fn insert_asset(&self, asset: Asset) {
        self.state.lock().unwrap().assets.push(asset);
    }

    pub fn insert_binary(&self, url: &str, data: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .binaries
            .insert(url.to_string(), data);
    }

    /// Makes the next publish of the given variant fail with a server-side
    /// validation error.
    pub fn fail_publish(&self, item_codename: &str, language_codename: &str) {
        self.state
            .lock()
            .unwrap()
            .publish_failures
            .insert((item_codename.to_string(), language_codename.to_string()));
    }

    /// All mutating operations performed so far, in call order.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().unwrap().operations.clone()
    }

    pub fn content_item(&self, codename: &str) -> Option<ContentItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|i| i.codename == codename)
            .cloned()
    }

    pub fn latest_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Option<LanguageVariant> {
        self.state
            .lock()
            .unwrap()
            .variants
            .get(&(item_codename.to_string(), language_codename.to_string()))
            .map(|v| v.latest.clone())
    }

    pub fn published_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Option<LanguageVariant> {
        self.state
            .lock()
            .unwrap()
            .variants
            .get(&(item_codename.to_string(), language_codename.to_string()))
            .and_then(|v| v.published.clone())
    }

    pub fn asset(&self, codename: &str) -> Option<Asset> {
        self.state
            .lock()
            .unwrap()
            .assets
            .iter()
            .find(|a| a.codename == codename)
            .cloned()
    }
}

fn workflow_of<'a>(
    environment: &'a EnvironmentData,
    assignment: &WorkflowAssignment,
) -> Option<&'a Workflow> {
    if let Some(id) = assignment.workflow_identifier.id {
        return environment.workflow_by_id(&id);
    }
    assignment
        .workflow_identifier
        .codename
        .as_deref()
        .and_then(|codename| environment.workflow_by_codename(codename))
}

fn step_reference(workflow: &Workflow, codename: &str) -> Option<Reference> {
    workflow.all_steps().find(|s| s.codename == codename).map(|s| Reference {
        id: Some(s.id),
        codename: Some(s.codename.clone()),
        external_id: None,
    })
}

fn step_codename_of(workflow: &Workflow, reference: &Reference) -> Option<String> {
    if let Some(codename) = &reference.codename {
        return Some(codename.clone());
    }
    let id = reference.id?;
    workflow
        .all_steps()
        .find(|s| s.id == id)
        .map(|s| s.codename.clone())
}

#[async_trait]
impl ManagementApi for MockManagementApi {
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        Ok(self.state.lock().unwrap().environment.collections.clone())
    }

    async fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        Ok(self.state.lock().unwrap().environment.languages.clone())
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        Ok(self.state.lock().unwrap().environment.workflows.clone())
    }

    async fn list_taxonomies(&self) -> Result<Vec<TaxonomyGroup>, ApiError> {
        Ok(self.state.lock().unwrap().environment.taxonomies.clone())
    }

    async fn list_content_types(&self) -> Result<Vec<FlattenedContentType>, ApiError> {
        Ok(self.state.lock().unwrap().environment.content_types.clone())
    }

    async fn list_asset_folders(&self) -> Result<Vec<AssetFolder>, ApiError> {
        Ok(self.state.lock().unwrap().environment.asset_folders.clone())
    }

    async fn view_content_item_by_codename(
        &self,
        codename: &str,
    ) -> Result<ContentItem, ApiError> {
        self.content_item(codename)
            .ok_or_else(|| ApiError::not_found(format!("content item '{codename}'")))
    }

    async fn view_content_item_by_id(&self, id: &Uuid) -> Result<ContentItem, ApiError> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|i| &i.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("content item {id}")))
    }

    async fn add_content_item(&self, data: &ContentItemAdd) -> Result<ContentItem, ApiError> {
        let mut state = self.state.lock().unwrap();
        let item = ContentItem {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            codename: data.codename.clone(),
            item_type: data.item_type.clone(),
            collection: data.collection.clone(),
            external_id: data.external_id.clone(),
        };
        state.operations.push(format!("add_item:{}", data.codename));
        state.items.push(item.clone());
        Ok(item)
    }

    async fn upsert_content_item(
        &self,
        codename: &str,
        data: &ContentItemUpsert,
    ) -> Result<ContentItem, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(format!("upsert_item:{codename}"));
        if let Some(item) = state.items.iter_mut().find(|i| i.codename == codename) {
            item.name = data.name.clone();
            item.collection = data.collection.clone();
            return Ok(item.clone());
        }
        let item = ContentItem {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            codename: codename.to_string(),
            item_type: Reference::default(),
            collection: data.collection.clone(),
            external_id: None,
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn view_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<LanguageVariant, ApiError> {
        self.latest_variant(item_codename, language_codename)
            .ok_or_else(|| {
                ApiError::not_found(format!("variant '{item_codename}' ({language_codename})"))
            })
    }

    async fn view_published_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<LanguageVariant, ApiError> {
        self.published_variant(item_codename, language_codename)
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "published variant '{item_codename}' ({language_codename})"
                ))
            })
    }

    async fn upsert_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        data: &LanguageVariantUpsert,
    ) -> Result<LanguageVariant, ApiError> {
        let mut state = self.state.lock().unwrap();
        state
            .operations
            .push(format!("upsert_variant:{item_codename}:{language_codename}"));
        let variant = LanguageVariant {
            item: Reference::by_codename(item_codename),
            language: Reference::by_codename(language_codename),
            workflow: data.workflow.clone(),
            elements: data.elements.clone(),
            schedule: None,
        };
        let entry = state
            .variants
            .entry((item_codename.to_string(), language_codename.to_string()))
            .or_default();
        entry.latest = variant.clone();
        Ok(variant)
    }

    async fn create_new_version(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state
            .operations
            .push(format!("new_version:{item_codename}:{language_codename}"));
        let environment = state.environment.clone();
        let variant = state
            .variants
            .get_mut(&(item_codename.to_string(), language_codename.to_string()))
            .ok_or_else(|| {
                ApiError::not_found(format!("variant '{item_codename}' ({language_codename})"))
            })?;
        let workflow = workflow_of(&environment, &variant.latest.workflow)
            .ok_or_else(|| ApiError::decode("mock variant has unknown workflow".to_string()))?;
        let step = step_codename_of(workflow, &variant.latest.workflow.step_identifier);
        if step.as_deref() == Some(workflow.published_step.codename.as_str()) {
            variant.published = Some(variant.latest.clone());
        }
        if let Some(first) = workflow.first_step() {
            variant.latest.workflow.step_identifier = Reference {
                id: Some(first.id),
                codename: Some(first.codename.clone()),
                external_id: None,
            };
        }
        Ok(())
    }

    async fn change_workflow_of_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        workflow_codename: &str,
        step_codename: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(format!(
            "change_workflow:{item_codename}:{language_codename}:{step_codename}"
        ));
        let environment = state.environment.clone();
        let workflow = environment
            .workflow_by_codename(workflow_codename)
            .ok_or_else(|| ApiError::not_found(format!("workflow '{workflow_codename}'")))?;
        let step = step_reference(workflow, step_codename)
            .ok_or_else(|| ApiError::not_found(format!("step '{step_codename}'")))?;
        let variant = state
            .variants
            .get_mut(&(item_codename.to_string(), language_codename.to_string()))
            .ok_or_else(|| {
                ApiError::not_found(format!("variant '{item_codename}' ({language_codename})"))
            })?;
        variant.latest.workflow = WorkflowAssignment {
            workflow_identifier: Reference::by_codename(workflow_codename),
            step_identifier: step,
        };
        Ok(())
    }

    async fn publish_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        schedule: Option<&SchedulePayload>,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let key = (item_codename.to_string(), language_codename.to_string());
        if state.publish_failures.remove(&key) {
            return Err(ApiError::Platform {
                code: 219,
                message: "elements do not pass validation".to_string(),
            });
        }
        let environment = state.environment.clone();
        if schedule.is_some() {
            state
                .operations
                .push(format!("schedule_publish:{item_codename}:{language_codename}"));
        } else {
            state
                .operations
                .push(format!("publish:{item_codename}:{language_codename}"));
        }
        let variant = state.variants.get_mut(&key).ok_or_else(|| {
            ApiError::not_found(format!("variant '{item_codename}' ({language_codename})"))
        })?;
        let workflow = workflow_of(&environment, &variant.latest.workflow)
            .ok_or_else(|| ApiError::decode("mock variant has unknown workflow".to_string()))?;
        let target = if schedule.is_some() {
            &workflow.scheduled_step
        } else {
            &workflow.published_step
        };
        variant.latest.workflow.step_identifier = Reference {
            id: Some(target.id),
            codename: Some(target.codename.clone()),
            external_id: None,
        };
        if schedule.is_none() {
            variant.published = Some(variant.latest.clone());
        }
        Ok(())
    }

    async fn unpublish_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        schedule: Option<&SchedulePayload>,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let environment = state.environment.clone();
        if schedule.is_some() {
            state.operations.push(format!(
                "schedule_unpublish:{item_codename}:{language_codename}"
            ));
            return Ok(());
        }
        state
            .operations
            .push(format!("unpublish:{item_codename}:{language_codename}"));
        let variant = state
            .variants
            .get_mut(&(item_codename.to_string(), language_codename.to_string()))
            .ok_or_else(|| {
                ApiError::not_found(format!("variant '{item_codename}' ({language_codename})"))
            })?;
        let workflow = workflow_of(&environment, &variant.latest.workflow)
            .ok_or_else(|| ApiError::decode("mock variant has unknown workflow".to_string()))?;
        variant.published = None;
        // Only a variant that is itself published moves back to the first
        // step; a coexisting draft stays where it is.
        let step = step_codename_of(workflow, &variant.latest.workflow.step_identifier);
        if step.as_deref() == Some(workflow.published_step.codename.as_str()) {
            if let Some(first) = workflow.first_step() {
                variant.latest.workflow.step_identifier = Reference {
                    id: Some(first.id),
                    codename: Some(first.codename.clone()),
                    external_id: None,
                };
            }
        }
        Ok(())
    }

    async fn cancel_scheduled_publish(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let environment = state.environment.clone();
        let variant = state
            .variants
            .get_mut(&(item_codename.to_string(), language_codename.to_string()))
            .ok_or_else(|| {
                ApiError::not_found(format!("variant '{item_codename}' ({language_codename})"))
            })?;
        let workflow = workflow_of(&environment, &variant.latest.workflow)
            .ok_or_else(|| ApiError::decode("mock variant has unknown workflow".to_string()))?;
        let step = step_codename_of(workflow, &variant.latest.workflow.step_identifier);
        if step.as_deref() != Some(workflow.scheduled_step.codename.as_str()) {
            return Err(ApiError::Platform {
                code: NOTHING_SCHEDULED_ERROR_CODE,
                message: "variant is not scheduled to be published".to_string(),
            });
        }
        if let Some(first) = workflow.first_step() {
            variant.latest.workflow.step_identifier = Reference {
                id: Some(first.id),
                codename: Some(first.codename.clone()),
                external_id: None,
            };
        }
        state.operations.push(format!(
            "cancel_scheduled_publish:{item_codename}:{language_codename}"
        ));
        Ok(())
    }

    async fn cancel_scheduled_unpublish(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let variant = state
            .variants
            .get_mut(&(item_codename.to_string(), language_codename.to_string()))
            .ok_or_else(|| {
                ApiError::not_found(format!("variant '{item_codename}' ({language_codename})"))
            })?;
        let scheduled = variant
            .published
            .as_ref()
            .and_then(|p| p.schedule.as_ref())
            .map(|s| s.unpublish_time.is_some())
            .unwrap_or(false);
        if !scheduled {
            return Err(ApiError::Platform {
                code: NOTHING_SCHEDULED_ERROR_CODE,
                message: "variant is not scheduled to be unpublished".to_string(),
            });
        }
        if let Some(published) = variant.published.as_mut() {
            published.schedule = None;
        }
        state.operations.push(format!(
            "cancel_scheduled_unpublish:{item_codename}:{language_codename}"
        ));
        Ok(())
    }

    async fn view_asset_by_id(&self, id: &Uuid) -> Result<Asset, ApiError> {
        self.state
            .lock()
            .unwrap()
            .assets
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("asset {id}")))
    }

    async fn view_asset_by_codename(&self, codename: &str) -> Result<Asset, ApiError> {
        self.asset(codename)
            .ok_or_else(|| ApiError::not_found(format!("asset '{codename}'")))
    }

    async fn add_asset(&self, data: &AssetAdd) -> Result<Asset, ApiError> {
        let mut state = self.state.lock().unwrap();
        let upload = state
            .uploads
            .get(&data.file_reference.id)
            .ok_or_else(|| {
                ApiError::not_found(format!("file reference {}", data.file_reference.id))
            })?
            .clone();
        let asset = Asset {
            id: Uuid::new_v4(),
            codename: data.codename.clone(),
            file_name: upload.filename.clone(),
            title: Some(data.title.clone()),
            size: upload.data.len() as u64,
            content_type: upload.content_type.clone(),
            url: format!("https://assets.invalid/{}/{}", data.codename, upload.filename),
            collection: data.collection.clone(),
            folder: data.folder.clone(),
            descriptions: data.descriptions.clone(),
            external_id: data.external_id.clone(),
        };
        state.operations.push(format!("add_asset:{}", data.codename));
        state.assets.push(asset.clone());
        Ok(asset)
    }

    async fn upsert_asset(&self, codename: &str, data: &AssetUpsert) -> Result<Asset, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(format!("upsert_asset:{codename}"));
        let upload = data
            .file_reference
            .as_ref()
            .and_then(|r| state.uploads.get(&r.id).cloned());
        let asset = state
            .assets
            .iter_mut()
            .find(|a| a.codename == codename)
            .ok_or_else(|| ApiError::not_found(format!("asset '{codename}'")))?;
        asset.title = Some(data.title.clone());
        asset.collection = data.collection.clone();
        asset.folder = data.folder.clone();
        asset.descriptions = data.descriptions.clone();
        if let Some(upload) = upload {
            asset.file_name = upload.filename.clone();
            asset.size = upload.data.len() as u64;
            asset.content_type = upload.content_type.clone();
        }
        Ok(asset.clone())
    }

    async fn upload_binary_file(
        &self,
        upload: &BinaryFileUpload,
    ) -> Result<FileReference, ApiError> {
        let mut state = self.state.lock().unwrap();
        let reference = FileReference::internal(Uuid::new_v4());
        state
            .operations
            .push(format!("upload_binary:{}", upload.filename));
        state.uploads.insert(reference.id, upload.clone());
        Ok(reference)
    }

    async fn download_binary(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.state
            .lock()
            .unwrap()
            .binaries
            .get(url)
            .cloned()
            .ok_or_else(|| ApiError::not_found(url))
    }
}
