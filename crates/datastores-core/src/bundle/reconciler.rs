//! Reconciler entry points with boundary logging.
//!
//! ## Logging Ownership
//!
//! This layer owns lifecycle logging for reconciliation:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The desired-state, diff and apply functions below it only use
//! `tracing::debug!()` and `tracing::warn!()`.

use std::time::Instant;

use super::apply::apply_plan;
use super::backend::{LayoutReader, LayoutWriter};
use super::desired::compute_desired_state;
use super::diff::compute_plan;
use super::model::{ApplyReport, DesiredState, ReconcilePlan};
use crate::config::ReconcilerConfig;
use crate::deps::DependencyGraph;
use crate::errors::Result;
use crate::model::Collection;
use crate::stable_id::IdAllocator;
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Clone, Default)]
pub struct BundleReconciler {
    config: ReconcilerConfig,
}

impl BundleReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// One group per runtime-supported collection; see
    /// [`super::desired::compute_desired_state`].
    pub fn compute_desired_state(
        &self,
        collections: &[Collection],
        graph: &dyn DependencyGraph,
    ) -> DesiredState {
        self.desired_state(collections, graph, None)
    }

    /// Same as [`Self::compute_desired_state`], reading id text from the
    /// allocator that owns the collections' ids.
    pub fn compute_desired_state_with_ids(
        &self,
        collections: &[Collection],
        graph: &dyn DependencyGraph,
        ids: &IdAllocator,
    ) -> DesiredState {
        self.desired_state(collections, graph, Some(ids))
    }

    fn desired_state(
        &self,
        collections: &[Collection],
        graph: &dyn DependencyGraph,
        ids: Option<&IdAllocator>,
    ) -> DesiredState {
        log_op_start!(
            "compute_desired_state",
            collection_count = collections.len()
        );
        let start = Instant::now();

        let state = compute_desired_state(collections, graph, &self.config, ids);

        log_op_end!(
            "compute_desired_state",
            duration_ms = start.elapsed().as_millis() as u64,
            group_count = state.groups.len(),
            issue_count = state.issues.len()
        );
        state
    }

    /// Diff `desired` against the persisted layout
    pub fn diff<R>(&self, desired: &DesiredState, actual: &R) -> ReconcilePlan
    where
        R: LayoutReader + ?Sized,
    {
        log_op_start!("diff", group_count = desired.groups.len());
        let start = Instant::now();

        let plan = compute_plan(desired, actual, &self.config);

        log_op_end!(
            "diff",
            duration_ms = start.elapsed().as_millis() as u64,
            action_count = plan.actions.len(),
            issue_count = plan.issues.len()
        );
        plan
    }

    /// Apply `plan` through `backend`.
    ///
    /// # Errors
    ///
    /// `ReconcileConflict` when the configured template is missing.
    pub fn apply(
        &self,
        plan: &ReconcilePlan,
        backend: &mut dyn LayoutWriter,
    ) -> Result<ApplyReport> {
        log_op_start!("apply", action_count = plan.actions.len());
        let start = Instant::now();

        let report = apply_plan(plan, backend, &self.config).map_err(|e| {
            log_op_error!(
                "apply",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "apply",
            duration_ms = start.elapsed().as_millis() as u64,
            action_count = report.applied.len(),
            skipped_count = report.skipped.len()
        );
        Ok(report)
    }

    /// Diff, apply, then diff again; returns the report and the residual plan.
    ///
    /// # Errors
    ///
    /// As [`BundleReconciler::apply`].
    pub fn reconcile(
        &self,
        desired: &DesiredState,
        backend: &mut dyn LayoutWriter,
    ) -> Result<(ApplyReport, ReconcilePlan)> {
        let plan = self.diff(desired, &*backend);
        let report = self.apply(&plan, backend)?;
        let residual = self.diff(desired, &*backend);
        if !residual.is_converged() {
            tracing::warn!(
                action_count = residual.actions.len(),
                "layout did not converge after apply"
            );
        }
        Ok((report, residual))
    }
}
