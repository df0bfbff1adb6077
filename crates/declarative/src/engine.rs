//! Reconciliation driver
//!
//! Runs resolve → observe → plan → execute → aggregate against one
//! [`AdminHandle`]. Every run re-derives the observed state from scratch,
//! so running it again after a failure picks up where the last run stopped.

use gridkit::{AdminHandle, ServerId};
use rayon::ThreadPool;
use serde::Serialize;

use crate::aggregate::aggregate;
use crate::context::ProgressCallback;
use crate::error::{ActionFailure, Error, Result};
use crate::executor::execute_batch;
use crate::observer::observe;
use crate::planner::{Plan, PlannedAction, plan};
use crate::resolver::resolve_targets;
use crate::types::{Observation, ReconcileRequest, ReconciliationResult};

/// What a run would do, without doing it
#[derive(Debug, Clone, Default)]
pub struct Preview {
    pub targets: Vec<ServerId>,
    pub observation: Observation,
    pub plan: Plan,
}

impl Preview {
    /// Entries for display, in target order
    pub fn rows(&self) -> Vec<PreviewRow<'_>> {
        self.observation
            .iter()
            .map(|(id, info)| PreviewRow {
                server: id,
                enabled: info.enabled,
                state: info.lifecycle.name(),
                actions: self
                    .plan
                    .actions()
                    .filter(|a| &a.server == id)
                    .map(|a| a.kind.verb())
                    .collect(),
            })
            .collect()
    }
}

/// One server of a [`Preview`]
#[derive(Debug, Clone, Serialize)]
pub struct PreviewRow<'a> {
    pub server: &'a ServerId,
    pub enabled: bool,
    pub state: &'static str,
    pub actions: Vec<&'static str>,
}

/// Bring the requested servers to the desired state
///
/// Returns [`Error::Action`] on the first failed action in plan order. The
/// error carries the partial result: servers whose action succeeded before
/// the failure. Nothing is rolled back.
pub fn reconcile<P: ProgressCallback>(
    admin: &dyn AdminHandle,
    request: &ReconcileRequest,
    progress: &mut P,
) -> Result<ReconciliationResult> {
    request.desired.validate()?;

    let targets = resolve(admin, request)?;
    if targets.is_empty() {
        log::info!("No servers to reconcile");
        return Ok(ReconciliationResult::empty(targets));
    }

    progress.on_observe_start(targets.len());
    let pool = build_pool(request.jobs, observation_calls(&targets))?;
    let observation = observe(admin, &targets, &pool)?;
    progress.on_observe_complete();

    let plan = plan(&observation, &request.desired);
    log::info!(
        "Planned {} enablement and {} lifecycle actions across {} servers",
        plan.enablement.len(),
        plan.lifecycle.len(),
        targets.len()
    );

    let desired = &request.desired;

    let enablement_ok = match run_batch(admin, &plan.enablement, request.jobs, progress)? {
        (ok, None) => ok,
        (ok, Some(failure)) => {
            return Err(Error::Action {
                failure,
                partial: Box::new(aggregate(targets, desired, ok, Vec::new())),
            });
        }
    };

    let lifecycle_ok = match run_batch(admin, &plan.lifecycle, request.jobs, progress)? {
        (ok, None) => ok,
        (ok, Some(failure)) => {
            return Err(Error::Action {
                failure,
                partial: Box::new(aggregate(targets, desired, enablement_ok, ok)),
            });
        }
    };

    let result = aggregate(targets, desired, enablement_ok, lifecycle_ok);
    if result.changed {
        log::info!(
            "Reconciliation changed {} servers",
            result.changed_servers().len()
        );
    } else {
        log::info!("All servers already in desired state");
    }
    Ok(result)
}

/// Resolve, observe and plan without issuing any action
///
/// The desired state is not validated: a request with no target yields an
/// empty plan, which is what a read-only status view needs.
pub fn preview(admin: &dyn AdminHandle, request: &ReconcileRequest) -> Result<Preview> {
    let targets = resolve(admin, request)?;
    if targets.is_empty() {
        return Ok(Preview::default());
    }

    let pool = build_pool(request.jobs, observation_calls(&targets))?;
    let observation = observe(admin, &targets, &pool)?;
    let plan = plan(&observation, &request.desired);

    Ok(Preview {
        targets,
        observation,
        plan,
    })
}

fn resolve(admin: &dyn AdminHandle, request: &ReconcileRequest) -> Result<Vec<ServerId>> {
    let inventory = admin
        .list_all_server_ids()
        .map_err(|source| Error::Inventory { source })?;
    log::debug!("Registry knows {} servers", inventory.len());
    resolve_targets(request.targets.as_deref(), &inventory, request.skip_unknown)
}

fn run_batch<P: ProgressCallback>(
    admin: &dyn AdminHandle,
    actions: &[PlannedAction],
    jobs: Option<usize>,
    progress: &mut P,
) -> Result<(Vec<ServerId>, Option<ActionFailure>)> {
    let Some(first) = actions.first() else {
        return Ok((Vec::new(), None));
    };

    let pool = build_pool(jobs, actions.len())?;
    progress.on_batch_start(first.kind, actions.len());
    let outcome = execute_batch(admin, actions, &pool);
    for o in &outcome.outcomes {
        progress.on_action_complete(&o.action, o.succeeded());
    }
    progress.on_batch_complete();

    Ok(outcome.settle())
}

/// Two reads per target: enablement and lifecycle
fn observation_calls(targets: &[ServerId]) -> usize {
    targets.len() * 2
}

/// Pool wide enough for `calls` blocking calls in flight at once
///
/// An explicit `jobs` caps the width instead.
fn build_pool(jobs: Option<usize>, calls: usize) -> Result<ThreadPool> {
    let threads = jobs.unwrap_or(calls).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))
}
