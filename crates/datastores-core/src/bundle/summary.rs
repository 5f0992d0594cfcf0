//! Human-readable summary renderer for reconcile plans.

use super::model::{ActionOp, ReconcileAction, ReconcilePlan};
use crate::errors::ExError;

/// Render a Markdown summary of `plan` for review before applying it.
///
/// Informational only; the structured plan is the source of truth.
pub fn render_plan_summary(plan: &ReconcilePlan) -> String {
    let mut out = String::new();
    out.push_str("## Bundle Reconcile Plan\n\n");

    let counts = plan.count_by_op();
    let count = |op: ActionOp| counts.get(&op).copied().unwrap_or(0);
    out.push_str(&format!(
        "**Actions**: {} (add {}, remove {}, move {}, rename {}, relabel {})  \n**Issues**: {}\n\n",
        plan.actions.len(),
        count(ActionOp::Add),
        count(ActionOp::Remove),
        count(ActionOp::Move),
        count(ActionOp::Rename),
        count(ActionOp::RelabelOnly),
        plan.issues.len(),
    ));

    if plan.is_converged() {
        out.push_str("_Layout is converged._\n");
    }

    let (group_actions, asset_actions): (Vec<&ReconcileAction>, Vec<&ReconcileAction>) =
        plan.actions.iter().partition(|a| a.is_group_action());

    if !group_actions.is_empty() {
        out.push_str("### Groups\n\n");
        for action in group_actions {
            out.push_str(&format!("- {}\n", describe(action)));
        }
        out.push('\n');
    }

    if !asset_actions.is_empty() {
        out.push_str("### Assets\n\n");
        for action in asset_actions {
            out.push_str(&format!("- {}\n", describe(action)));
        }
        out.push('\n');
    }

    if !plan.issues.is_empty() {
        out.push_str("### Issues\n\n");
        for issue in &plan.issues {
            let ex: ExError = issue.clone().into();
            out.push_str(&format!("- {ex}\n"));
        }
        out.push('\n');
    }

    out
}

fn describe(action: &ReconcileAction) -> String {
    match action {
        ReconcileAction::AddGroup { group } => format!("Create group `{group}`"),
        ReconcileAction::RemoveGroup { group } => format!("Remove group `{group}`"),
        ReconcileAction::AddAsset { address, group, .. } => {
            format!("Add asset `{address}` to `{group}`")
        }
        ReconcileAction::RenameAsset {
            from_address,
            address,
            ..
        } => format!("Rename asset `{from_address}` --> `{address}`"),
        ReconcileAction::MoveAsset {
            address,
            from_group,
            group,
            ..
        } => format!("Move asset `{address}`: `{from_group}` --> `{group}`"),
        ReconcileAction::RelabelAsset {
            address, labels, ..
        } => {
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            format!("Fix labels of `{address}`: {}", labels.join(", "))
        }
        ReconcileAction::RemoveAsset { address, group, .. } => {
            format!("Remove asset `{address}` from `{group}`")
        }
    }
}
