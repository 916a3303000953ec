//! Content migrator CLI.
//!
//! Three actions: `export` writes a snapshot from a source environment,
//! `import` replays a snapshot into a target environment, `migrate` chains
//! both without touching the filesystem. Exit code 0 on success, 1 on any
//! fatal error.

mod cli;
mod config;
mod storage;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use content_migrator_pipeline::export::{self, ExportConfig};
use content_migrator_pipeline::import::{self, CodenameExternalIds, ImportConfig};
use content_migrator_pipeline::MigrationDataMapper;

use cli::{Cli, Commands};
use config::EnvironmentConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(err) = run(cli).await {
        error!(error = %err, "migration failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Export {
            source_environment_id,
            source_api_key,
            items,
            language,
            base_url,
            items_filename,
            assets_filename,
            replace_invalid_links,
            fail_on_error,
        } => {
            let requests = config::export_requests(&items, &language);
            anyhow::ensure!(!requests.is_empty(), "no item codenames given");

            let api =
                EnvironmentConfig::new(source_environment_id, source_api_key, base_url).into_api();
            let export_config = ExportConfig {
                replace_invalid_links,
                fail_on_error,
                cancellation: None,
            };
            let data = export::export(api.as_ref(), &requests, &export_config).await?;
            storage::write_snapshot(&data, &items_filename, &assets_filename)?;
        }

        Commands::Import {
            target_environment_id,
            target_api_key,
            base_url,
            items_filename,
            assets_filename,
            force,
            fail_on_error,
        } => {
            let data = storage::read_snapshot(&items_filename, &assets_filename)?;
            let api =
                EnvironmentConfig::new(target_environment_id, target_api_key, base_url).into_api();
            let import_config = ImportConfig {
                fail_on_error,
                force,
                cancellation: None,
            };
            import::import(api.as_ref(), &data, &CodenameExternalIds, &import_config).await?;
        }

        Commands::Migrate {
            source_environment_id,
            source_api_key,
            target_environment_id,
            target_api_key,
            items,
            language,
            base_url,
            force,
            replace_invalid_links,
            fail_on_error,
        } => {
            let requests = config::export_requests(&items, &language);
            anyhow::ensure!(!requests.is_empty(), "no item codenames given");

            let source =
                EnvironmentConfig::new(source_environment_id, source_api_key, base_url.clone())
                    .into_api();
            let target =
                EnvironmentConfig::new(target_environment_id, target_api_key, base_url).into_api();

            let export_config = ExportConfig {
                replace_invalid_links,
                fail_on_error,
                cancellation: None,
            };
            let import_config = ImportConfig {
                fail_on_error,
                force,
                cancellation: None,
            };

            let mut data = export::export(source.as_ref(), &requests, &export_config).await?;
            // Hook for a user-supplied snapshot transformation; the CLI
            // itself passes none.
            let mapper: Option<&MigrationDataMapper> = None;
            if let Some(mapper) = mapper {
                data = mapper(data);
            }
            let summary =
                import::import(target.as_ref(), &data, &CodenameExternalIds, &import_config)
                    .await?;
            info!(
                items = summary.items_imported,
                variants = summary.variants_imported,
                "migration finished"
            );
        }
    }

    Ok(())
}
