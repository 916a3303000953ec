//! Command line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Content migration toolkit for headless content platform environments.
#[derive(Parser)]
#[command(
    name = "content-migrator",
    version,
    about = "Migrates content items, language variants and assets between environments"
)]
pub struct Cli {
    /// Suppress per-item progress output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export items and their referenced assets into snapshot files
    Export {
        /// Source environment id
        #[arg(long)]
        source_environment_id: String,
        /// Management API key for the source environment
        #[arg(long)]
        source_api_key: String,
        /// Comma-separated content item codenames to export
        #[arg(long)]
        items: String,
        /// Language codename to export
        #[arg(long)]
        language: String,
        /// Management API base URL override
        #[arg(long)]
        base_url: Option<String>,
        /// Where to write the items snapshot
        #[arg(long, default_value = "items.json")]
        items_filename: PathBuf,
        /// Where to write the assets snapshot
        #[arg(long, default_value = "assets.json")]
        assets_filename: PathBuf,
        /// Replace links to unresolvable items with their text content
        #[arg(long)]
        replace_invalid_links: bool,
        /// Abort on the first per-item failure
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Import snapshot files into a target environment
    Import {
        /// Target environment id
        #[arg(long)]
        target_environment_id: String,
        /// Management API key for the target environment
        #[arg(long)]
        target_api_key: String,
        /// Management API base URL override
        #[arg(long)]
        base_url: Option<String>,
        /// Items snapshot to read
        #[arg(long, default_value = "items.json")]
        items_filename: PathBuf,
        /// Assets snapshot to read
        #[arg(long, default_value = "assets.json")]
        assets_filename: PathBuf,
        /// Reconcile into a target that already contains snapshot items
        #[arg(long)]
        force: bool,
        /// Abort on the first per-item failure
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Export from a source environment and import straight into a target
    Migrate {
        /// Source environment id
        #[arg(long)]
        source_environment_id: String,
        /// Management API key for the source environment
        #[arg(long)]
        source_api_key: String,
        /// Target environment id
        #[arg(long)]
        target_environment_id: String,
        /// Management API key for the target environment
        #[arg(long)]
        target_api_key: String,
        /// Comma-separated content item codenames to migrate
        #[arg(long)]
        items: String,
        /// Language codename to migrate
        #[arg(long)]
        language: String,
        /// Management API base URL override, applied to both environments
        #[arg(long)]
        base_url: Option<String>,
        /// Reconcile into a target that already contains snapshot items
        #[arg(long)]
        force: bool,
        /// Replace links to unresolvable items with their text content
        #[arg(long)]
        replace_invalid_links: bool,
        /// Abort on the first per-item failure
        #[arg(long)]
        fail_on_error: bool,
    },
}
