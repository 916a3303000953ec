//! Language variant importer and workflow driver.
//!
//! For each snapshot item this reproduces the source's workflow state in
//! the target: the published version is imported and published first, then
//! a new version is opened for the draft, the draft is driven to its step,
//! scheduling is applied, and a published variant the snapshot no longer
//! has is unpublished.
//!
//! Everything runs strictly serially; the ordering invariants (published
//! before draft, shell before variant) do not survive reordering.

use tracing::{debug, info, instrument, warn};

use content_migrator_api::models::{
    LanguageVariantUpsert, Reference, SchedulePayload, WorkflowAssignment,
};
use content_migrator_api::{
    ApiError, ManagementApi, NOTHING_SCHEDULED_ERROR_CODE, RATE_LIMIT_ERROR_CODE,
};
use content_migrator_shared::types::{
    FlattenedContentType, MigrationData, MigrationItem, MigrationItemVersion, Workflow,
};

use crate::errors::{ImportError, TransformError, WorkflowError};
use crate::harness::{process_items, ProcessConfig};
use crate::import::context::{ImportContext, ScheduledState, WorkflowState};
use crate::import::ImportConfig;
use crate::transform::import_element;
use crate::workflow::{
    is_archived_step, is_published_step, is_scheduled_step, publish_predecessor, step_by_codename,
    workflow_by_codename,
};

/// Imports every snapshot item's language variant, returning the number of
/// successfully imported variants.
pub async fn import_language_variants(
    api: &dyn ManagementApi,
    data: &MigrationData,
    context: &ImportContext,
    config: &ImportConfig,
) -> Result<usize, ImportError> {
    let harness = ProcessConfig {
        parallel_limit: 1,
        fail_on_error: config.fail_on_error,
        cancellation: config.cancellation.clone(),
    };
    let results = process_items(
        "language variants",
        data.items.iter().collect::<Vec<_>>(),
        &harness,
        |item| {
            format!(
                "{} ({})",
                item.system.codename, item.system.language.codename
            )
        },
        |item| async move { import_item_variant(api, context, item).await },
    )
    .await?;

    Ok(results.iter().filter(|r| r.is_valid()).count())
}

#[instrument(skip_all, fields(item = %item.system.codename, language = %item.system.language.codename))]
async fn import_item_variant(
    api: &dyn ManagementApi,
    context: &ImportContext,
    item: &MigrationItem,
) -> Result<(), ImportError> {
    let system = &item.system;
    let workflow = workflow_by_codename(&context.environment.workflows, &system.workflow.codename)?;
    let content_type = context
        .environment
        .content_type_by_codename(&system.item_type.codename)
        .ok_or_else(|| ImportError::lookup("content type", &system.item_type.codename))?;

    let (published_version, draft_version) = categorize_versions(item)?;

    prepare_target_variant(api, context, item, workflow).await?;

    if let Some(version) = published_version {
        import_version(api, context, item, workflow, content_type, version).await?;
        if draft_version.is_some() {
            // Open a fresh version so the published and the draft coexist.
            api.create_new_version(&system.codename, &system.language.codename)
                .await?;
        }
    }

    if let Some(version) = draft_version {
        import_version(api, context, item, workflow, content_type, version).await?;
    }

    // A published variant the snapshot no longer carries is withdrawn.
    let had_published_target = context
        .variant_state(&system.codename, &system.language.codename)
        .map(|state| state.published.is_some())
        .unwrap_or(false);
    if had_published_target && published_version.is_none() {
        info!("snapshot has no published version, unpublishing the target variant");
        api.unpublish_language_variant(&system.codename, &system.language.codename, None)
            .await?;
    }

    Ok(())
}

/// Partitions the snapshot versions into at most one published and one
/// draft; anything more is a fatal per-item error.
fn categorize_versions(
    item: &MigrationItem,
) -> Result<(Option<&MigrationItemVersion>, Option<&MigrationItemVersion>), ImportError> {
    let mut published = None;
    let mut draft = None;
    for version in &item.versions {
        let slot = if is_published_step(&version.workflow_step.codename) {
            &mut published
        } else {
            &mut draft
        };
        if slot.replace(version).is_some() {
            return Err(ImportError::DuplicateVersion {
                item: item.system.codename.clone(),
                language: item.system.language.codename.clone(),
                kind: if is_published_step(&version.workflow_step.codename) {
                    "published"
                } else {
                    "draft"
                },
            });
        }
    }
    Ok((published, draft))
}

/// Brings the target variant into a state that accepts an upsert: observed
/// schedules are cancelled (tolerantly — the probe may report them stale or
/// inverted), a published variant gets a new version, an archived variant
/// moves back to the first step.
async fn prepare_target_variant(
    api: &dyn ManagementApi,
    context: &ImportContext,
    item: &MigrationItem,
    workflow: &Workflow,
) -> Result<(), ImportError> {
    let system = &item.system;
    let Some(state) = context.variant_state(&system.codename, &system.language.codename) else {
        return Ok(());
    };

    for target in [state.draft.as_ref(), state.published.as_ref()]
        .into_iter()
        .flatten()
    {
        match target.scheduled_state {
            ScheduledState::Publish => {
                cancel_tolerant(
                    api.cancel_scheduled_publish(&system.codename, &system.language.codename)
                        .await,
                    "publish",
                )?;
            }
            ScheduledState::Unpublish => {
                cancel_tolerant(
                    api.cancel_scheduled_unpublish(&system.codename, &system.language.codename)
                        .await,
                    "unpublish",
                )?;
            }
            ScheduledState::None => {}
        }
    }

    match state.latest() {
        Some(target) if target.workflow_state == WorkflowState::Published => {
            debug!("target variant is published, creating a new version");
            api.create_new_version(&system.codename, &system.language.codename)
                .await?;
        }
        Some(target) if target.workflow_state == WorkflowState::Archived => {
            let first = first_step(workflow)?;
            debug!("target variant is archived, moving it back to the first step");
            api.change_workflow_of_language_variant(
                &system.codename,
                &system.language.codename,
                &workflow.codename,
                &first,
            )
            .await?;
        }
        _ => {}
    }

    Ok(())
}

/// Swallows the platform's nothing-was-scheduled complaint (and a 404 for
/// a variant that vanished); the probe's scheduled state is only a hint.
/// Any other error, rate-limit included, propagates.
fn cancel_tolerant(result: Result<(), ApiError>, kind: &str) -> Result<(), ImportError> {
    match result {
        Ok(()) => Ok(()),
        Err(ApiError::NotFound(_))
        | Err(ApiError::Platform {
            code: NOTHING_SCHEDULED_ERROR_CODE,
            ..
        }) => {
            debug!(kind, "nothing scheduled to cancel");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Imports one version: upsert the elements at the first workflow step,
/// drive the step to the snapshot's step, apply scheduling.
async fn import_version(
    api: &dyn ManagementApi,
    context: &ImportContext,
    item: &MigrationItem,
    workflow: &Workflow,
    content_type: &FlattenedContentType,
    version: &MigrationItemVersion,
) -> Result<(), ImportError> {
    let system = &item.system;
    let first = first_step(workflow)?;

    let mut elements = Vec::with_capacity(version.elements.len());
    for (codename, element) in &version.elements {
        let descriptor = content_type.element_by_codename(codename).ok_or_else(|| {
            TransformError::UnknownElement {
                element: codename.clone(),
                content_type: content_type.codename.clone(),
            }
        })?;
        elements.push(import_element(codename, element, descriptor, context)?);
    }

    let payload = LanguageVariantUpsert {
        elements,
        workflow: WorkflowAssignment {
            workflow_identifier: Reference::by_codename(&workflow.codename),
            step_identifier: Reference::by_codename(&first),
        },
    };
    api.upsert_language_variant(&system.codename, &system.language.codename, &payload)
        .await?;

    drive_workflow_step(api, item, workflow, &first, &version.workflow_step.codename).await?;
    apply_schedule(api, item, version).await?;

    Ok(())
}

/// Moves the freshly upserted variant from the first step to the
/// snapshot's step.
async fn drive_workflow_step(
    api: &dyn ManagementApi,
    item: &MigrationItem,
    workflow: &Workflow,
    current_step: &str,
    target_step: &str,
) -> Result<(), ImportError> {
    let system = &item.system;

    if is_published_step(target_step) {
        // Publishing is only allowed from specific predecessor steps; walk
        // to the penultimate step on the path first.
        let predecessor = publish_predecessor(workflow, current_step)?;
        if predecessor.codename != current_step {
            api.change_workflow_of_language_variant(
                &system.codename,
                &system.language.codename,
                &workflow.codename,
                &predecessor.codename,
            )
            .await?;
        }
        match api
            .publish_language_variant(&system.codename, &system.language.codename, None)
            .await
        {
            Ok(()) => Ok(()),
            Err(ApiError::Platform { code, message }) if code != RATE_LIMIT_ERROR_CODE => {
                // Server-side publish validation failures are tolerated; the
                // variant stays at the predecessor step.
                warn!(publish_error = true, code, %message, "publish rejected by the platform");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    } else if is_archived_step(target_step) {
        api.change_workflow_of_language_variant(
            &system.codename,
            &system.language.codename,
            &workflow.codename,
            target_step,
        )
        .await?;
        Ok(())
    } else if is_scheduled_step(target_step) {
        // Scheduling is applied separately from the version's schedule.
        Ok(())
    } else if target_step != current_step {
        // Validate the step exists before issuing the call.
        step_by_codename(workflow, target_step)?;
        api.change_workflow_of_language_variant(
            &system.codename,
            &system.language.codename,
            &workflow.codename,
            target_step,
        )
        .await?;
        Ok(())
    } else {
        Ok(())
    }
}

async fn apply_schedule(
    api: &dyn ManagementApi,
    item: &MigrationItem,
    version: &MigrationItemVersion,
) -> Result<(), ImportError> {
    let Some(schedule) = &version.schedule else {
        return Ok(());
    };
    let system = &item.system;

    if let Some(publish_time) = schedule.publish_time {
        let payload = SchedulePayload {
            scheduled_to: publish_time,
            display_timezone: schedule.publish_display_timezone.clone(),
        };
        api.publish_language_variant(
            &system.codename,
            &system.language.codename,
            Some(&payload),
        )
        .await?;
    }
    if let Some(unpublish_time) = schedule.unpublish_time {
        let payload = SchedulePayload {
            scheduled_to: unpublish_time,
            display_timezone: schedule.unpublish_display_timezone.clone(),
        };
        api.unpublish_language_variant(
            &system.codename,
            &system.language.codename,
            Some(&payload),
        )
        .await?;
    }
    Ok(())
}

fn first_step(workflow: &Workflow) -> Result<String, ImportError> {
    workflow
        .first_step()
        .map(|s| s.codename.clone())
        .ok_or_else(|| {
            WorkflowError::StepNotFound {
                workflow: workflow.codename.clone(),
                step: "first".to_string(),
            }
            .into()
        })
}
