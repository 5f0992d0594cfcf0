//! Plan application against a packaging backend.
//!
//! Phases run in a fixed order regardless of plan order:
//! 1. group creations
//! 2. asset actions, in plan order
//! 3. group removals
//!
//! so an asset moving out of a stale group is moved before that group (and
//! whatever is left in it) disappears.

use std::collections::BTreeSet;

use super::backend::LayoutWriter;
use super::model::{ApplyReport, ReconcileAction, ReconcilePlan, SkippedAction};
use crate::config::ReconcilerConfig;
use crate::errors::{DatastoresError, Result};

/// Apply `plan` to `backend`.
///
/// A failing action is recorded in [`ApplyReport::skipped`] and the rest of
/// the plan still runs. Re-running the diff afterwards shows what is left.
///
/// # Errors
///
/// `ReconcileConflict` if the configured group template is missing; nothing
/// is applied in that case.
pub fn apply_plan(
    plan: &ReconcilePlan,
    backend: &mut dyn LayoutWriter,
    config: &ReconcilerConfig,
) -> Result<ApplyReport> {
    if !backend.has_template(&config.group_template) {
        return Err(DatastoresError::ReconcileConflict {
            name: config.group_template.clone(),
            reason: "packaging template not found; nothing applied".to_string(),
        });
    }

    let mut report = ApplyReport::default();

    for action in &plan.actions {
        if let ReconcileAction::AddGroup { group } = action {
            let outcome = backend.create_group(group, &config.group_template);
            record(&mut report, action, outcome);
        }
    }

    let groups: BTreeSet<String> = backend.list_groups().into_iter().collect();
    for action in plan.actions.iter().filter(|a| !a.is_group_action()) {
        let outcome = match action {
            ReconcileAction::RemoveAsset { content_id, .. } => {
                backend.remove_entry(content_id).map(|_| ())
            }
            ReconcileAction::AddAsset {
                content_id,
                address,
                group,
                labels,
            }
            | ReconcileAction::RenameAsset {
                content_id,
                address,
                group,
                labels,
                ..
            }
            | ReconcileAction::MoveAsset {
                content_id,
                address,
                group,
                labels,
                ..
            }
            | ReconcileAction::RelabelAsset {
                content_id,
                address,
                group,
                labels,
            } => {
                if !groups.contains(group) {
                    report.skipped.push(SkippedAction {
                        action: action.clone(),
                        reason: format!("target group '{group}' does not exist"),
                    });
                    tracing::warn!(
                        content_id = %content_id,
                        group = %group,
                        "apply skipped asset action; target group missing"
                    );
                    continue;
                }
                backend
                    .create_or_move_entry(content_id, group, address)
                    .and_then(|()| backend.set_labels(content_id, labels))
            }
            ReconcileAction::AddGroup { .. } | ReconcileAction::RemoveGroup { .. } => continue,
        };
        record(&mut report, action, outcome);
    }

    for action in &plan.actions {
        if let ReconcileAction::RemoveGroup { group } = action {
            let outcome = backend.remove_group(group);
            record(&mut report, action, outcome);
        }
    }

    Ok(report)
}

fn record(report: &mut ApplyReport, action: &ReconcileAction, outcome: Result<()>) {
    match outcome {
        Ok(()) => report.applied.push(action.clone()),
        Err(err) => {
            tracing::warn!(
                target_name = %action.target(),
                error = %err,
                "apply skipped action; backend rejected it"
            );
            report.skipped.push(SkippedAction {
                action: action.clone(),
                reason: err.to_string(),
            });
        }
    }
}
