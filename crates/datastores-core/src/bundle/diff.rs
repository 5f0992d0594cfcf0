//! Desired-vs-persisted layout diff.
//!
//! ## Guarantees
//!
//! - **Determinism**: actions follow desired group order, member order, and
//!   sorted names/content ids for everything read back from the backend.
//! - **One action per asset**: Add, then Rename, then Move, then RelabelOnly;
//!   the first case that matches wins.
//! - **Managed groups only**: groups without the managed prefix are never
//!   removed, and their entries are never removed either. A desired group
//!   whose name an unmanaged group already holds is reused, not re-created.

use std::collections::BTreeSet;

use super::backend::LayoutReader;
use super::model::{DesiredState, ReconcileAction, ReconcilePlan};
use crate::config::ReconcilerConfig;

/// Compare `desired` with the persisted layout and list the actions that
/// reconcile them.
///
/// Issues carried by `desired` are passed through to the plan.
pub fn compute_plan<R>(desired: &DesiredState, actual: &R, config: &ReconcilerConfig) -> ReconcilePlan
where
    R: LayoutReader + ?Sized,
{
    let mut actions = Vec::new();

    let present: BTreeSet<String> = actual.list_groups().into_iter().collect();
    let existing: BTreeSet<String> = actual
        .list_managed_groups(&config.group_prefix)
        .into_iter()
        .collect();
    let desired_names: BTreeSet<&str> = desired.groups.iter().map(|g| g.name.as_str()).collect();

    // 1. Group creations, in desired order
    for group in &desired.groups {
        if !present.contains(&group.name) {
            actions.push(ReconcileAction::AddGroup {
                group: group.name.clone(),
            });
        }
    }

    // 2. Stale managed groups, sorted
    for name in &existing {
        if !desired_names.contains(name.as_str()) {
            actions.push(ReconcileAction::RemoveGroup {
                group: name.clone(),
            });
        }
    }

    // 3. Per-asset actions, then stale entries of each desired group
    let wanted = desired.content_ids();
    for group in &desired.groups {
        for asset in &group.members {
            let action = match actual.find_asset_entry(&asset.content_id) {
                None => Some(ReconcileAction::AddAsset {
                    content_id: asset.content_id.clone(),
                    address: asset.address.clone(),
                    group: group.name.clone(),
                    labels: asset.labels.clone(),
                }),
                Some(entry) if entry.address != asset.address => {
                    Some(ReconcileAction::RenameAsset {
                        content_id: asset.content_id.clone(),
                        from_address: entry.address,
                        address: asset.address.clone(),
                        group: group.name.clone(),
                        labels: asset.labels.clone(),
                    })
                }
                Some(entry) if entry.group != group.name => Some(ReconcileAction::MoveAsset {
                    content_id: asset.content_id.clone(),
                    address: asset.address.clone(),
                    from_group: entry.group,
                    group: group.name.clone(),
                    labels: asset.labels.clone(),
                }),
                Some(entry) if entry.labels != asset.labels => {
                    Some(ReconcileAction::RelabelAsset {
                        content_id: asset.content_id.clone(),
                        address: asset.address.clone(),
                        group: group.name.clone(),
                        labels: asset.labels.clone(),
                    })
                }
                Some(_) => None,
            };
            actions.extend(action);
        }

        if !existing.contains(&group.name) {
            continue;
        }
        for entry in actual.group_entries(&group.name) {
            if entry.is_sub_asset || entry.content_id.trim().is_empty() {
                continue;
            }
            if !wanted.contains(entry.content_id.as_str()) {
                actions.push(ReconcileAction::RemoveAsset {
                    content_id: entry.content_id,
                    address: entry.address,
                    group: entry.group,
                });
            }
        }
    }

    ReconcilePlan {
        actions,
        issues: desired.issues.clone(),
    }
}
