//! Production management API client.
//!
//! Thin reqwest wrapper: every call is classified into [`ApiError`] and run
//! through the standard retry policy. Listing endpoints are drained across
//! continuation pages before typed decoding, and the content-type listing
//! inlines snippet elements so consumers always see the flattened model.

use reqwest::{header, Client as ReqwestClient, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use async_trait::async_trait;

use content_migrator_shared::types::{
    AssetFolder, Collection, ElementKind, FlattenedContentType, FlattenedElement, Language,
    MultipleChoiceOption, TaxonomyGroup, Workflow, WorkflowStep,
};

use crate::error::ApiError;
use crate::models::{
    Asset, AssetAdd, AssetUpsert, BinaryFileUpload, ContentItem, ContentItemAdd,
    ContentItemUpsert, FileReference, LanguageVariant, LanguageVariantUpsert, SchedulePayload,
};
use crate::retry::with_backoff;
use crate::ManagementApi;

/// Default management API endpoint.
const DEFAULT_BASE_URL: &str = "https://manage.kontent.ai/v2";

/// Continuation header used by paginated listings.
const CONTINUATION_HEADER: &str = "x-continuation";

/// Management API client for one environment.
pub struct ManagementClient {
    http: ReqwestClient,
    base_url: String,
    environment_id: String,
    api_key: String,
}

impl ManagementClient {
    pub fn new(
        environment_id: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            http: ReqwestClient::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            environment_id: environment_id.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}{}",
            self.base_url, self.environment_id, path
        )
    }

    /// Classifies a response into success JSON or an [`ApiError`].
    async fn classify(response: reqwest::Response, resource: &str) -> Result<Value, ApiError> {
        let status = response.status();
        if status.is_success() {
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            return response.json::<Value>().await.map_err(ApiError::from);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::not_found(resource));
        }

        #[derive(Deserialize)]
        struct PlatformErrorBody {
            error_code: i64,
            message: String,
        }

        match response.json::<PlatformErrorBody>().await {
            Ok(body) => Err(ApiError::Platform {
                code: body.error_code,
                message: body.message,
            }),
            Err(_) if status.is_server_error() => Err(ApiError::Server {
                status: status.as_u16(),
            }),
            Err(_) => Err(ApiError::decode(format!(
                "HTTP {} for {} without platform error body",
                status, resource
            ))),
        }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        resource: &str,
    ) -> Result<Value, ApiError> {
        with_backoff(|| async {
            let mut request = self
                .http
                .request(method.clone(), self.url(path))
                .bearer_auth(&self.api_key);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await?;
            Self::classify(response, resource).await
        })
        .await
    }

    async fn get_typed<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        resource: &str,
    ) -> Result<T, ApiError> {
        let value = self.request(Method::GET, path, None, resource).await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(format!("{resource}: {e}")))
    }

    async fn put_typed<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        resource: &str,
    ) -> Result<T, ApiError> {
        let value = self
            .request(Method::PUT, path, Some(body), resource)
            .await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(format!("{resource}: {e}")))
    }

    /// Drains a paginated listing, following continuation tokens.
    async fn list_pages(&self, path: &str, array_field: &str) -> Result<Vec<Value>, ApiError> {
        let mut results = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let token = continuation.clone();
            let page = with_backoff(|| async {
                let mut request = self
                    .http
                    .get(self.url(path))
                    .bearer_auth(&self.api_key);
                if let Some(token) = &token {
                    request = request.header(CONTINUATION_HEADER, token);
                }
                let response = request.send().await?;
                Self::classify(response, path).await
            })
            .await?;

            if let Some(items) = page.get(array_field).and_then(Value::as_array) {
                results.extend(items.iter().cloned());
            } else {
                return Err(ApiError::decode(format!(
                    "listing {path} is missing field '{array_field}'"
                )));
            }

            continuation = page
                .get("pagination")
                .and_then(|p| p.get("continuation_token"))
                .and_then(Value::as_str)
                .map(str::to_string);
            if continuation.is_none() {
                return Ok(results);
            }
        }
    }

    async fn list_typed<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        array_field: &str,
    ) -> Result<Vec<T>, ApiError> {
        self.list_pages(path, array_field)
            .await?
            .into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| ApiError::decode(format!("{array_field} entry: {e}")))
            })
            .collect()
    }
}

// Wire shapes that differ from the shared environment model.

#[derive(Deserialize)]
struct WireWorkflow {
    id: Uuid,
    codename: String,
    name: String,
    steps: Vec<WireWorkflowStep>,
    published_step: WirePseudoStep,
    archived_step: WirePseudoStep,
    scheduled_step: WirePseudoStep,
}

#[derive(Deserialize)]
struct WireWorkflowStep {
    id: Uuid,
    codename: String,
    name: String,
    #[serde(default)]
    transitions_to: Vec<WireTransition>,
}

#[derive(Deserialize)]
struct WireTransition {
    step: WireStepRef,
}

#[derive(Deserialize)]
struct WireStepRef {
    id: Uuid,
}

#[derive(Deserialize)]
struct WirePseudoStep {
    id: Uuid,
    codename: String,
    name: String,
}

impl From<WireWorkflow> for Workflow {
    fn from(wire: WireWorkflow) -> Self {
        let step = |s: WirePseudoStep| WorkflowStep {
            id: s.id,
            codename: s.codename,
            name: s.name,
            transitions_to: Vec::new(),
        };
        Workflow {
            id: wire.id,
            codename: wire.codename,
            name: wire.name,
            steps: wire
                .steps
                .into_iter()
                .map(|s| WorkflowStep {
                    id: s.id,
                    codename: s.codename,
                    name: s.name,
                    transitions_to: s.transitions_to.into_iter().map(|t| t.step.id).collect(),
                })
                .collect(),
            published_step: step(wire.published_step),
            archived_step: step(wire.archived_step),
            scheduled_step: step(wire.scheduled_step),
        }
    }
}

#[derive(Deserialize)]
struct WireContentType {
    id: Uuid,
    codename: String,
    elements: Vec<Value>,
}

#[derive(Deserialize)]
struct WireTypeElement {
    id: Uuid,
    #[serde(default)]
    codename: Option<String>,
    #[serde(rename = "type")]
    element_type: String,
    #[serde(default)]
    taxonomy_group: Option<WireStepRef>,
    #[serde(default)]
    options: Vec<MultipleChoiceOption>,
    #[serde(default)]
    snippet: Option<WireStepRef>,
}

/// Flattens a wire content type, inlining snippet elements and skipping
/// element kinds that carry no migratable value (guidelines and the snippet
/// markers themselves).
fn flatten_content_type(
    wire: WireContentType,
    snippets: &[WireContentType],
) -> Result<FlattenedContentType, ApiError> {
    let mut elements = Vec::new();
    flatten_elements(&wire.elements, snippets, &mut elements)?;
    Ok(FlattenedContentType {
        id: wire.id,
        codename: wire.codename,
        elements,
    })
}

fn flatten_elements(
    raw: &[Value],
    snippets: &[WireContentType],
    out: &mut Vec<FlattenedElement>,
) -> Result<(), ApiError> {
    for value in raw {
        let element: WireTypeElement = serde_json::from_value(value.clone())
            .map_err(|e| ApiError::decode(format!("content type element: {e}")))?;

        if element.element_type == "snippet" {
            let snippet_id = element
                .snippet
                .as_ref()
                .map(|s| s.id)
                .ok_or_else(|| ApiError::decode("snippet element without snippet id".to_string()))?;
            let snippet = snippets
                .iter()
                .find(|s| s.id == snippet_id)
                .ok_or_else(|| ApiError::decode(format!("unknown snippet {snippet_id}")))?;
            flatten_elements(&snippet.elements, snippets, out)?;
            continue;
        }

        let kind: ElementKind =
            match serde_json::from_value(Value::String(element.element_type.clone())) {
                Ok(kind) => kind,
                // Guidelines and other non-value element kinds.
                Err(_) => continue,
            };

        out.push(FlattenedElement {
            id: element.id,
            codename: element.codename.unwrap_or_default(),
            kind,
            taxonomy_group: element.taxonomy_group.map(|g| g.id),
            options: element.options,
        });
    }
    Ok(())
}

#[derive(Deserialize)]
struct WireAssetFolder {
    id: Uuid,
    codename: String,
    name: String,
    #[serde(default)]
    folders: Vec<WireAssetFolder>,
}

fn flatten_folders(folders: Vec<WireAssetFolder>, out: &mut Vec<AssetFolder>) {
    for folder in folders {
        out.push(AssetFolder {
            id: folder.id,
            codename: folder.codename,
            name: folder.name,
        });
        flatten_folders(folder.folders, out);
    }
}

#[async_trait]
impl ManagementApi for ManagementClient {
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        self.list_typed("/collections", "collections").await
    }

    async fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        self.list_typed("/languages", "languages").await
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        let wire: Vec<WireWorkflow> = self.list_typed("/workflows", "workflows").await?;
        Ok(wire.into_iter().map(Workflow::from).collect())
    }

    async fn list_taxonomies(&self) -> Result<Vec<TaxonomyGroup>, ApiError> {
        self.list_typed("/taxonomies", "taxonomies").await
    }

    async fn list_content_types(&self) -> Result<Vec<FlattenedContentType>, ApiError> {
        let snippets: Vec<WireContentType> = self.list_typed("/snippets", "snippets").await?;
        let types: Vec<WireContentType> = self.list_typed("/types", "types").await?;
        types
            .into_iter()
            .map(|wire| flatten_content_type(wire, &snippets))
            .collect()
    }

    async fn list_asset_folders(&self) -> Result<Vec<AssetFolder>, ApiError> {
        let value = self
            .request(Method::GET, "/folders", None, "asset folders")
            .await?;
        let wire: Vec<WireAssetFolder> = serde_json::from_value(
            value.get("folders").cloned().unwrap_or(Value::Array(vec![])),
        )
        .map_err(|e| ApiError::decode(format!("asset folders: {e}")))?;
        let mut flattened = Vec::new();
        flatten_folders(wire, &mut flattened);
        Ok(flattened)
    }

    async fn view_content_item_by_codename(
        &self,
        codename: &str,
    ) -> Result<ContentItem, ApiError> {
        self.get_typed(
            &format!("/items/codename/{codename}"),
            &format!("content item '{codename}'"),
        )
        .await
    }

    async fn view_content_item_by_id(&self, id: &Uuid) -> Result<ContentItem, ApiError> {
        self.get_typed(&format!("/items/{id}"), &format!("content item {id}"))
            .await
    }

    async fn add_content_item(&self, data: &ContentItemAdd) -> Result<ContentItem, ApiError> {
        let body = serde_json::to_value(data).map_err(|e| ApiError::decode(e.to_string()))?;
        let value = self
            .request(
                Method::POST,
                "/items",
                Some(&body),
                &format!("content item '{}'", data.codename),
            )
            .await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
    }

    async fn upsert_content_item(
        &self,
        codename: &str,
        data: &ContentItemUpsert,
    ) -> Result<ContentItem, ApiError> {
        let body = serde_json::to_value(data).map_err(|e| ApiError::decode(e.to_string()))?;
        self.put_typed(
            &format!("/items/codename/{codename}"),
            &body,
            &format!("content item '{codename}'"),
        )
        .await
    }

    async fn view_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<LanguageVariant, ApiError> {
        self.get_typed(
            &format!("/items/codename/{item_codename}/variants/codename/{language_codename}"),
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
    }

    async fn view_published_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<LanguageVariant, ApiError> {
        self.get_typed(
            &format!(
                "/items/codename/{item_codename}/variants/codename/{language_codename}/published"
            ),
            &format!("published variant '{item_codename}' ({language_codename})"),
        )
        .await
    }

    async fn upsert_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        data: &LanguageVariantUpsert,
    ) -> Result<LanguageVariant, ApiError> {
        let body = serde_json::to_value(data).map_err(|e| ApiError::decode(e.to_string()))?;
        self.put_typed(
            &format!("/items/codename/{item_codename}/variants/codename/{language_codename}"),
            &body,
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
    }

    async fn create_new_version(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError> {
        self.request(
            Method::PUT,
            &format!(
                "/items/codename/{item_codename}/variants/codename/{language_codename}/new-version"
            ),
            None,
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
        .map(|_| ())
    }

    async fn change_workflow_of_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        workflow_codename: &str,
        step_codename: &str,
    ) -> Result<(), ApiError> {
        self.request(
            Method::PUT,
            &format!(
                "/items/codename/{item_codename}/variants/codename/{language_codename}\
                 /change-workflow/workflow/codename/{workflow_codename}/step/codename/{step_codename}"
            ),
            None,
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
        .map(|_| ())
    }

    async fn publish_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        schedule: Option<&SchedulePayload>,
    ) -> Result<(), ApiError> {
        let body = match schedule {
            Some(schedule) => {
                Some(serde_json::to_value(schedule).map_err(|e| ApiError::decode(e.to_string()))?)
            }
            None => None,
        };
        self.request(
            Method::PUT,
            &format!(
                "/items/codename/{item_codename}/variants/codename/{language_codename}/publish"
            ),
            body.as_ref(),
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
        .map(|_| ())
    }

    async fn unpublish_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        schedule: Option<&SchedulePayload>,
    ) -> Result<(), ApiError> {
        let body = match schedule {
            Some(schedule) => {
                Some(serde_json::to_value(schedule).map_err(|e| ApiError::decode(e.to_string()))?)
            }
            None => None,
        };
        self.request(
            Method::PUT,
            &format!(
                "/items/codename/{item_codename}/variants/codename/{language_codename}/unpublish"
            ),
            body.as_ref(),
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
        .map(|_| ())
    }

    async fn cancel_scheduled_publish(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError> {
        self.request(
            Method::PUT,
            &format!(
                "/items/codename/{item_codename}/variants/codename/{language_codename}\
                 /cancel-scheduled-publish"
            ),
            None,
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
        .map(|_| ())
    }

    async fn cancel_scheduled_unpublish(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError> {
        self.request(
            Method::PUT,
            &format!(
                "/items/codename/{item_codename}/variants/codename/{language_codename}\
                 /cancel-scheduled-unpublish"
            ),
            None,
            &format!("variant '{item_codename}' ({language_codename})"),
        )
        .await
        .map(|_| ())
    }

    async fn view_asset_by_id(&self, id: &Uuid) -> Result<Asset, ApiError> {
        self.get_typed(&format!("/assets/{id}"), &format!("asset {id}"))
            .await
    }

    async fn view_asset_by_codename(&self, codename: &str) -> Result<Asset, ApiError> {
        self.get_typed(
            &format!("/assets/codename/{codename}"),
            &format!("asset '{codename}'"),
        )
        .await
    }

    async fn add_asset(&self, data: &AssetAdd) -> Result<Asset, ApiError> {
        let body = serde_json::to_value(data).map_err(|e| ApiError::decode(e.to_string()))?;
        let value = self
            .request(
                Method::POST,
                "/assets",
                Some(&body),
                &format!("asset '{}'", data.codename),
            )
            .await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
    }

    async fn upsert_asset(&self, codename: &str, data: &AssetUpsert) -> Result<Asset, ApiError> {
        let body = serde_json::to_value(data).map_err(|e| ApiError::decode(e.to_string()))?;
        self.put_typed(
            &format!("/assets/codename/{codename}"),
            &body,
            &format!("asset '{codename}'"),
        )
        .await
    }

    async fn upload_binary_file(
        &self,
        upload: &BinaryFileUpload,
    ) -> Result<FileReference, ApiError> {
        let value = with_backoff(|| async {
            let response = self
                .http
                .post(self.url(&format!("/files/{}", upload.filename)))
                .bearer_auth(&self.api_key)
                .header(header::CONTENT_TYPE, &upload.content_type)
                .header(header::CONTENT_LENGTH, upload.data.len())
                .body(upload.data.clone())
                .send()
                .await?;
            Self::classify(response, &format!("file '{}'", upload.filename)).await
        })
        .await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
    }

    async fn download_binary(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        with_backoff(|| async {
            let response = self.http.get(url).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response.bytes().await?.to_vec());
            }
            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::not_found(url));
            }
            Err(ApiError::Server {
                status: status.as_u16(),
            })
        })
        .await
    }
}
