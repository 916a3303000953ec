//! # Content Migrator Pipeline
//! This crate implements the migration engine: the export pipeline that
//! turns an id-addressed source environment into a codename-addressed
//! `MigrationData` snapshot, and the import pipeline that reconciles such a
//! snapshot into a target environment while reproducing workflow state.
//!
//! The building blocks are exposed as modules so they can be exercised and
//! composed independently:
//! - [`harness`] — bounded-parallel processing with retry-aware error
//!   classification and progress reporting
//! - [`workflow`] — pure lookups and shortest-path search over workflow
//!   definitions
//! - [`transform`] — per-element-type id⇄codename translation
//! - [`richtext`] — rich-text HTML rewriting and component extraction
//! - [`references`] — reference closure extraction over wire elements
//! - [`export`] — context fetching and snapshot production
//! - [`import`] — target probing, item/asset import and the language
//!   variant workflow driver

pub mod errors;
pub mod export;
pub mod harness;
pub mod import;
pub mod references;
pub mod richtext;
pub mod transform;
pub mod workflow;

use content_migrator_shared::types::MigrationData;

/// Optional user-supplied transformation applied to the snapshot between
/// export and import. This is the only permitted mutation of a
/// `MigrationData` outside the export manager.
pub type MigrationDataMapper = dyn Fn(MigrationData) -> MigrationData + Send + Sync;
