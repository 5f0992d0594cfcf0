//! Analyze and fix commands
//!
//! Usage: datastores analyze [--manifest <PATH>] [--layout <PATH>] [--json]
//!        datastores fix [--manifest <PATH>] [--layout <PATH>]

use std::path::PathBuf;

use clap::Args;
use datastores_core::bundle::render_plan_summary;
use datastores_core::{BundleReconciler, DesiredState, ExError};
use datastores_store::{FsLayoutStore, ManifestGraph};

use super::{CommandResult, Session};
use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Dependency manifest (YAML); without it assets have no dependencies
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Persisted packaging layout (JSON)
    #[arg(long, default_value = "layout.json")]
    pub layout: PathBuf,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub target: ReconcileArgs,

    /// Print the plan as JSON instead of Markdown
    #[arg(long)]
    pub json: bool,
}

struct Prepared {
    reconciler: BundleReconciler,
    desired: DesiredState,
    store: FsLayoutStore,
}

fn prepare(args: &ReconcileArgs, global: &GlobalArgs) -> Result<Prepared, Box<dyn std::error::Error>> {
    let session = Session::open(global)?;
    let graph = match &args.manifest {
        Some(path) => ManifestGraph::load(path)?,
        None => ManifestGraph::default(),
    };

    let reconciler = BundleReconciler::new(session.config.reconciler.clone());
    let desired = reconciler.compute_desired_state_with_ids(
        &session.workspace.collections,
        &graph,
        &session.ctx.ids,
    );
    let store = FsLayoutStore::open(&args.layout, &reconciler.config().group_template)?;

    Ok(Prepared {
        reconciler,
        desired,
        store,
    })
}

/// Execute analyze command; never touches the layout file
pub fn execute_analyze(args: AnalyzeArgs, global: &GlobalArgs) -> CommandResult {
    let Prepared {
        reconciler,
        desired,
        store,
    } = prepare(&args.target, global)?;
    let plan = reconciler.diff(&desired, &store);

    if args.json {
        let issues: Vec<String> = plan
            .issues
            .iter()
            .map(|i| ExError::from(i.clone()).to_string())
            .collect();
        let doc = serde_json::json!({
            "digest": desired.digest(),
            "converged": plan.is_converged(),
            "actions": plan.actions,
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print!("{}", render_plan_summary(&plan));
        println!("\n_Desired state digest: {}_", desired.digest());
    }
    Ok(())
}

/// Execute fix command: diff, apply, save, then diff again
pub fn execute_fix(args: ReconcileArgs, global: &GlobalArgs) -> CommandResult {
    let Prepared {
        reconciler,
        desired,
        mut store,
    } = prepare(&args, global)?;

    let (report, residual) = reconciler.reconcile(&desired, &mut store)?;
    if store.is_dirty() {
        store.save()?;
    }

    println!(
        "Applied {} action(s), skipped {}",
        report.applied.len(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.action.target(), skipped.reason);
    }

    if residual.is_converged() {
        println!("Layout converged.");
        Ok(())
    } else {
        print!("{}", render_plan_summary(&residual));
        Err(format!(
            "layout did not converge: {} residual action(s)",
            residual.actions.len()
        )
        .into())
    }
}
