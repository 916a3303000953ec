//! # Content Migrator Shared
//! This crate defines the shared data structures used across the content
//! migrator ecosystem: the codename-addressed migration snapshot
//! (`MigrationData` and its items, versions, elements, components and
//! assets) and the environment models (workflows, content types, languages,
//! collections, taxonomies, asset folders) both pipelines resolve against.
pub mod codename;
pub mod types;
