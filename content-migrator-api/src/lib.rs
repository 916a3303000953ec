//! Management API capability for the content migrator.
//!
//! This crate provides:
//! - [`ManagementApi`] trait abstracting the platform's REST management API
//! - [`ManagementClient`] production client backed by reqwest with the
//!   standard retry policy applied per call
//! - [`MockManagementApi`] in-memory implementation for tests
//! - [`ApiError`] error taxonomy with retry classification
//!
//! ## Usage
//!
//! ```ignore
//! use content_migrator_api::{ManagementApi, ManagementClient};
//! use std::sync::Arc;
//!
//! let client = ManagementClient::new("env-id", "api-key", None);
//! let api: Arc<dyn ManagementApi> = Arc::new(client);
//! let item = api.view_content_item_by_codename("about").await?;
//! ```

mod client;
mod error;
mod mock;
pub mod models;
pub mod retry;

pub use client::ManagementClient;
pub use error::{ApiError, NOTHING_SCHEDULED_ERROR_CODE, RATE_LIMIT_ERROR_CODE};
pub use mock::MockManagementApi;

use async_trait::async_trait;
use uuid::Uuid;

use content_migrator_shared::types::{
    AssetFolder, Collection, FlattenedContentType, Language, TaxonomyGroup, Workflow,
};

use models::{
    Asset, AssetAdd, AssetUpsert, BinaryFileUpload, ContentItem, ContentItemAdd,
    ContentItemUpsert, FileReference, LanguageVariant, LanguageVariantUpsert, SchedulePayload,
};

/// The narrow view of the platform's management API the pipelines consume.
///
/// Implementations must be safe to share across the configured parallelism;
/// the pipelines hold them as `Arc<dyn ManagementApi>`. Listing operations
/// return fully depaginated results.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    // Environment model.

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;
    async fn list_languages(&self) -> Result<Vec<Language>, ApiError>;
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError>;
    async fn list_taxonomies(&self) -> Result<Vec<TaxonomyGroup>, ApiError>;
    /// Content types with snippet elements already inlined.
    async fn list_content_types(&self) -> Result<Vec<FlattenedContentType>, ApiError>;
    async fn list_asset_folders(&self) -> Result<Vec<AssetFolder>, ApiError>;

    // Content items.

    async fn view_content_item_by_codename(&self, codename: &str)
        -> Result<ContentItem, ApiError>;
    async fn view_content_item_by_id(&self, id: &Uuid) -> Result<ContentItem, ApiError>;
    async fn add_content_item(&self, data: &ContentItemAdd) -> Result<ContentItem, ApiError>;
    async fn upsert_content_item(
        &self,
        codename: &str,
        data: &ContentItemUpsert,
    ) -> Result<ContentItem, ApiError>;

    // Language variants.

    /// The latest (working) variant of an item in a language.
    async fn view_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<LanguageVariant, ApiError>;

    /// The currently published variant, when one exists.
    async fn view_published_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<LanguageVariant, ApiError>;

    async fn upsert_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        data: &LanguageVariantUpsert,
    ) -> Result<LanguageVariant, ApiError>;

    async fn create_new_version(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError>;

    async fn change_workflow_of_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        workflow_codename: &str,
        step_codename: &str,
    ) -> Result<(), ApiError>;

    /// Publishes immediately, or schedules the publish when a payload with
    /// `scheduled_to` is given.
    async fn publish_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        schedule: Option<&SchedulePayload>,
    ) -> Result<(), ApiError>;

    /// Unpublishes immediately, or schedules the unpublish when a payload
    /// with `scheduled_to` is given.
    async fn unpublish_language_variant(
        &self,
        item_codename: &str,
        language_codename: &str,
        schedule: Option<&SchedulePayload>,
    ) -> Result<(), ApiError>;

    async fn cancel_scheduled_publish(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError>;

    async fn cancel_scheduled_unpublish(
        &self,
        item_codename: &str,
        language_codename: &str,
    ) -> Result<(), ApiError>;

    // Assets.

    async fn view_asset_by_id(&self, id: &Uuid) -> Result<Asset, ApiError>;
    async fn view_asset_by_codename(&self, codename: &str) -> Result<Asset, ApiError>;
    async fn add_asset(&self, data: &AssetAdd) -> Result<Asset, ApiError>;
    async fn upsert_asset(&self, codename: &str, data: &AssetUpsert) -> Result<Asset, ApiError>;

    /// Uploads a binary and returns the file reference consumed by
    /// [`ManagementApi::add_asset`] / [`ManagementApi::upsert_asset`].
    async fn upload_binary_file(
        &self,
        upload: &BinaryFileUpload,
    ) -> Result<FileReference, ApiError>;

    /// Downloads an asset binary from its delivery URL.
    async fn download_binary(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}
