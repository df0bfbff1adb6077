//! End-to-end reconciliation runs against the in-memory registry.

use declarative::{
    ActionKind, DesiredState, Error, FailureReason, LifecycleTarget, NoProgress,
    ReconcileRequest, reconcile,
};
use gridkit::{AdminHandle, MemoryAdmin, Operation, ServerId, ServerState};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

fn ids(names: &[&str]) -> Vec<ServerId> {
    names.iter().map(|n| ServerId::from(*n)).collect()
}

fn fleet() -> MemoryAdmin {
    MemoryAdmin::new()
        .with_server("api", false, ServerState::Inactive)
        .with_server("worker", true, ServerState::Active)
        .with_server("cron", true, ServerState::Activating)
        .with_server("batch", false, ServerState::ActivationTimedOut)
}

fn run(admin: &MemoryAdmin, request: &ReconcileRequest) -> declarative::Result<declarative::ReconciliationResult> {
    reconcile(admin, request, &mut NoProgress)
}

#[test]
fn second_run_changes_nothing() {
    let admin = fleet();
    let request = ReconcileRequest::new(DesiredState::new(
        Some(true),
        Some(LifecycleTarget::Started),
    ));

    let first = run(&admin, &request).unwrap();
    assert!(first.changed);
    assert_eq!(first.enabled, Some(ids(&["api", "batch"])));
    assert_eq!(first.state_changed, Some(ids(&["api", "batch"])));

    let calls = admin.mutating_calls();
    let second = run(&admin, &request).unwrap();
    assert!(!second.changed);
    assert_eq!(second.enabled, Some(vec![]));
    assert_eq!(second.state_changed, Some(vec![]));
    assert_eq!(admin.mutating_calls(), calls);
}

#[test]
fn enable_only_touches_disabled_servers() {
    let admin = MemoryAdmin::new()
        .with_server("A", false, ServerState::Inactive)
        .with_server("B", true, ServerState::Inactive);

    let result = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(Some(true), None)),
    )
    .unwrap();

    assert_eq!(result.targets, ids(&["A", "B"]));
    assert_eq!(result.enabled, Some(ids(&["A"])));
    assert!(result.disabled.is_none());
    assert!(result.state_changed.is_none());
    assert_eq!(admin.calls(Operation::Enable), 1);
    assert_eq!(admin.calls(Operation::Start), 0);
}

#[test]
fn start_skips_transitioning_servers() {
    let admin = MemoryAdmin::new()
        .with_server("A", true, ServerState::Active)
        .with_server("B", true, ServerState::Inactive)
        .with_server("C", true, ServerState::Activating);

    let result = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(None, Some(LifecycleTarget::Started))),
    )
    .unwrap();

    assert_eq!(result.state_changed, Some(ids(&["B"])));
    assert_eq!(admin.calls(Operation::Start), 1);
}

#[test]
fn unknown_targets_fail_before_any_action() {
    let admin = MemoryAdmin::new()
        .with_server("A", false, ServerState::Inactive)
        .with_server("B", false, ServerState::Inactive);
    let request = ReconcileRequest::new(DesiredState::new(Some(true), None)).targets(["A", "C"]);

    let err = run(&admin, &request).unwrap_err();

    assert!(matches!(&err, Error::UnknownTargets { ids } if ids == &[ServerId::from("C")]));
    assert_eq!(err.to_string(), "The following servers do not exist: C");
    assert_eq!(admin.calls(Operation::IsEnabled), 0);
    assert_eq!(admin.mutating_calls(), 0);
}

#[test]
fn unknown_targets_skipped() {
    let admin = MemoryAdmin::new()
        .with_server("A", false, ServerState::Inactive)
        .with_server("B", false, ServerState::Inactive);
    let request = ReconcileRequest::new(DesiredState::new(Some(true), None))
        .targets(["A", "C"])
        .skip_unknown(true);

    let result = run(&admin, &request).unwrap();

    assert_eq!(result.targets, ids(&["A"]));
    assert_eq!(result.enabled, Some(ids(&["A"])));
    assert_eq!(admin.snapshot(&"B".into()), Some((false, ServerState::Inactive)));
}

#[test]
fn empty_target_set_makes_no_calls() {
    let admin = MemoryAdmin::new().with_server("A", false, ServerState::Inactive);
    let request = ReconcileRequest::new(DesiredState::new(Some(true), None))
        .targets(["ghost"])
        .skip_unknown(true);

    let result = run(&admin, &request).unwrap();

    assert!(result.targets.is_empty());
    assert!(!result.changed);
    assert!(result.enabled.is_none());
    assert_eq!(admin.calls(Operation::IsEnabled), 0);
    assert_eq!(admin.calls(Operation::GetState), 0);
    assert_eq!(admin.mutating_calls(), 0);
}

#[test]
fn empty_registry_is_a_no_op() {
    let admin = MemoryAdmin::new();
    let result = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(None, Some(LifecycleTarget::Stopped))),
    )
    .unwrap();
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({"targets": [], "changed": false})
    );
}

#[test]
fn action_failure_carries_partial_result() {
    let admin = MemoryAdmin::new()
        .with_server("A", false, ServerState::Inactive)
        .with_server("B", false, ServerState::Inactive)
        .with_server("C", false, ServerState::Inactive);
    admin.fail_on(
        "B",
        Operation::Enable,
        gridkit::Error::Deployment {
            reason: "registry out of sync".into(),
        },
    );

    let err = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(Some(true), None)),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "DeploymentException: registry out of sync");
    let partial = err.partial_result().unwrap();
    assert_eq!(partial.enabled, Some(ids(&["A"])));
    assert!(partial.changed);
    // C was issued alongside B and is not rolled back
    assert_eq!(admin.snapshot(&"C".into()), Some((true, ServerState::Inactive)));
}

#[test]
fn enablement_failure_stops_before_lifecycle() {
    let admin = MemoryAdmin::new()
        .with_server("A", false, ServerState::Inactive)
        .with_server("B", false, ServerState::Inactive);
    admin.fail_on("A", Operation::Enable, gridkit::Error::server_not_exist("A"));

    let err = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(
            Some(true),
            Some(LifecycleTarget::Started),
        )),
    )
    .unwrap_err();

    match &err {
        Error::Action { failure, partial } => {
            assert_eq!(failure.reason, FailureReason::TargetVanished);
            assert_eq!(failure.kind, ActionKind::Enable);
            assert_eq!(partial.enabled, Some(vec![]));
            assert_eq!(partial.state_changed, Some(vec![]));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "Server A does not exist");
    assert_eq!(admin.calls(Operation::Start), 0);
}

#[test]
fn lifecycle_failure_keeps_enablement_successes() {
    let admin = MemoryAdmin::new()
        .with_server("A", false, ServerState::Active)
        .with_server("B", true, ServerState::Active);
    admin.fail_on(
        "A",
        Operation::Stop,
        gridkit::Error::ServerStop {
            id: "A".into(),
            reason: "timeout".into(),
        },
    );

    let err = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(
            Some(false),
            Some(LifecycleTarget::Stopped),
        )),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "Failed to stop server A. timeout");
    let partial = err.partial_result().unwrap();
    assert_eq!(partial.disabled, Some(ids(&["B"])));
    assert_eq!(partial.state_changed, Some(vec![]));
}

#[test]
fn unreachable_node_aborts_the_run() {
    let admin = MemoryAdmin::new()
        .with_server("A", true, ServerState::Inactive)
        .with_server("X", true, ServerState::Inactive)
        .with_server("Z", true, ServerState::Inactive);
    admin.fail_on(
        "X",
        Operation::Start,
        gridkit::Error::NodeUnreachable {
            node: "node7".into(),
            reason: "no route to host".into(),
        },
    );

    let err = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(None, Some(LifecycleTarget::Started))).jobs(2),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "Node node7 could not be reached. no route to host");
    assert_eq!(admin.calls(Operation::Start), 3);
    assert_eq!(err.partial_result().unwrap().state_changed, Some(ids(&["A"])));
}

#[test]
fn observation_failure_aborts_before_planning() {
    let admin = MemoryAdmin::new()
        .with_server("A", false, ServerState::Inactive)
        .with_server("B", false, ServerState::Inactive);
    admin.fail_on(
        "B",
        Operation::IsEnabled,
        gridkit::Error::transport("connection reset by peer", None),
    );

    let err = run(
        &admin,
        &ReconcileRequest::new(DesiredState::new(Some(true), None)),
    )
    .unwrap_err();

    assert!(matches!(err, Error::RemoteUnavailable { ref server, .. } if server.as_str() == "B"));
    assert!(err.partial_result().is_none());
    assert_eq!(admin.mutating_calls(), 0);
}

#[test]
fn destroyed_servers_are_always_acted_on() {
    let admin = MemoryAdmin::new().with_server("gone", true, ServerState::Destroyed);
    let request = ReconcileRequest::new(DesiredState::new(None, Some(LifecycleTarget::Stopped)));

    let result = run(&admin, &request).unwrap();

    assert_eq!(result.state_changed, Some(ids(&["gone"])));
    assert_eq!(admin.calls(Operation::Stop), 1);
}

#[test]
fn request_order_drives_plan_order() {
    let admin = MemoryAdmin::new()
        .with_server("a", false, ServerState::Inactive)
        .with_server("b", false, ServerState::Inactive)
        .with_server("c", false, ServerState::Inactive);
    let request =
        ReconcileRequest::new(DesiredState::new(Some(true), None)).targets(["c", "a", "c"]);

    let result = run(&admin, &request).unwrap();

    assert_eq!(result.targets, ids(&["c", "a"]));
    assert_eq!(result.enabled, Some(ids(&["c", "a"])));
}

/// Registry that holds every call until `reads` observation calls (or
/// `writes` mutating calls) have arrived, recording the peak in flight.
///
/// A call never waits longer than `GATE_TIMEOUT`, so a run that does not fan
/// out still finishes and the peak shows how far it got.
struct GatedRegistry {
    inner: MemoryAdmin,
    reads: usize,
    writes: usize,
    gate: Mutex<Gate>,
    arrivals: Condvar,
}

#[derive(Default)]
struct Gate {
    in_flight: usize,
    reads_arrived: usize,
    writes_arrived: usize,
    peak_reads: usize,
    peak_writes: usize,
}

const GATE_TIMEOUT: Duration = Duration::from_secs(5);

impl GatedRegistry {
    fn new(inner: MemoryAdmin, reads: usize, writes: usize) -> Self {
        Self {
            inner,
            reads,
            writes,
            gate: Mutex::new(Gate::default()),
            arrivals: Condvar::new(),
        }
    }

    fn hold(&self, write: bool) {
        let mut gate = self.gate.lock().unwrap();
        gate.in_flight += 1;
        if write {
            gate.writes_arrived += 1;
            gate.peak_writes = gate.peak_writes.max(gate.in_flight);
        } else {
            gate.reads_arrived += 1;
            gate.peak_reads = gate.peak_reads.max(gate.in_flight);
        }
        self.arrivals.notify_all();

        let (mut gate, _) = self
            .arrivals
            .wait_timeout_while(gate, GATE_TIMEOUT, |g| {
                if write {
                    g.writes_arrived < self.writes
                } else {
                    g.reads_arrived < self.reads
                }
            })
            .unwrap();
        gate.in_flight -= 1;
    }

    fn peaks(&self) -> (usize, usize) {
        let gate = self.gate.lock().unwrap();
        (gate.peak_reads, gate.peak_writes)
    }
}

impl AdminHandle for GatedRegistry {
    fn list_all_server_ids(&self) -> gridkit::Result<Vec<ServerId>> {
        self.inner.list_all_server_ids()
    }

    fn is_server_enabled(&self, id: &ServerId) -> gridkit::Result<bool> {
        self.hold(false);
        self.inner.is_server_enabled(id)
    }

    fn get_server_state(&self, id: &ServerId) -> gridkit::Result<ServerState> {
        self.hold(false);
        self.inner.get_server_state(id)
    }

    fn enable_server(&self, id: &ServerId, enabled: bool) -> gridkit::Result<()> {
        self.hold(true);
        self.inner.enable_server(id, enabled)
    }

    fn start_server(&self, id: &ServerId) -> gridkit::Result<()> {
        self.hold(true);
        self.inner.start_server(id)
    }

    fn stop_server(&self, id: &ServerId) -> gridkit::Result<()> {
        self.hold(true);
        self.inner.stop_server(id)
    }
}

fn disabled_fleet(size: usize) -> MemoryAdmin {
    (0..size).fold(MemoryAdmin::new(), |admin, n| {
        admin.with_server(format!("srv-{n:02}"), false, ServerState::Inactive)
    })
}

#[test]
fn every_call_of_a_window_is_in_flight_at_once() {
    let registry = GatedRegistry::new(disabled_fleet(12), 24, 12);
    let request = ReconcileRequest::new(DesiredState::new(Some(true), None));

    let result = reconcile(&registry, &request, &mut NoProgress).unwrap();

    assert_eq!(result.enabled.map(|ids| ids.len()), Some(12));
    assert_eq!(registry.peaks(), (24, 12));
}

#[test]
fn lifecycle_batch_fans_out_after_enablement() {
    // Starts are issued only once every enable has resolved
    let registry = GatedRegistry::new(disabled_fleet(6), 12, 6);
    let request = ReconcileRequest::new(DesiredState::new(
        Some(true),
        Some(LifecycleTarget::Started),
    ));

    let result = reconcile(&registry, &request, &mut NoProgress).unwrap();

    assert_eq!(result.state_changed.map(|ids| ids.len()), Some(6));
    assert_eq!(registry.peaks(), (12, 6));
    assert_eq!(registry.inner.calls(Operation::Start), 6);
}

#[test]
fn jobs_caps_calls_in_flight() {
    let registry = GatedRegistry::new(disabled_fleet(8), 2, 2);
    let request = ReconcileRequest::new(DesiredState::new(Some(true), None)).jobs(2);

    let result = reconcile(&registry, &request, &mut NoProgress).unwrap();

    assert_eq!(result.enabled.map(|ids| ids.len()), Some(8));
    assert_eq!(registry.peaks(), (2, 2));
}
