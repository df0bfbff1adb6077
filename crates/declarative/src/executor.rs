//! Action executor - issues a batch of planned actions through a thread pool

use gridkit::{AdminHandle, ServerId};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::{ActionFailure, FailureReason};
use crate::planner::{ActionKind, PlannedAction};

/// Resolution of one issued action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: PlannedAction,
    pub error: Option<FailureReason>,
}

impl ActionOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Every outcome of a batch, in plan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub outcomes: Vec<ActionOutcome>,
}

impl BatchOutcome {
    /// Servers that succeeded before the first failure, and that failure
    ///
    /// Successes that follow a failure in plan order are not reported: the
    /// run stops at the first failure it walks over.
    pub fn settle(&self) -> (Vec<ServerId>, Option<ActionFailure>) {
        let mut succeeded = Vec::new();
        for outcome in &self.outcomes {
            match &outcome.error {
                None => succeeded.push(outcome.action.server.clone()),
                Some(reason) => {
                    let failure = ActionFailure {
                        server: outcome.action.server.clone(),
                        kind: outcome.action.kind,
                        reason: reason.clone(),
                    };
                    return (succeeded, Some(failure));
                }
            }
        }
        (succeeded, None)
    }

    /// First failure in plan order, if any
    pub fn first_failure(&self) -> Option<ActionFailure> {
        self.settle().1
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Issue every action of a batch and wait for all of them
///
/// No call is inspected until the whole batch has resolved, so a failure
/// never prevents the other calls of the same batch from being made.
pub fn execute_batch(
    admin: &dyn AdminHandle,
    actions: &[PlannedAction],
    pool: &ThreadPool,
) -> BatchOutcome {
    let outcomes = pool.install(|| {
        actions
            .par_iter()
            .map(|action| ActionOutcome {
                action: action.clone(),
                error: apply(admin, action).err().map(FailureReason::classify),
            })
            .collect()
    });

    BatchOutcome { outcomes }
}

fn apply(admin: &dyn AdminHandle, action: &PlannedAction) -> gridkit::Result<()> {
    let id = &action.server;
    log::debug!("{} {id}", action.kind.label());
    let result = match action.kind {
        ActionKind::Enable => admin.enable_server(id, true),
        ActionKind::Disable => admin.enable_server(id, false),
        ActionKind::Start => admin.start_server(id),
        ActionKind::Stop => admin.stop_server(id),
    };
    if let Err(e) = &result {
        log::warn!("Failed to {} {id}: {e}", action.kind);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridkit::{MemoryAdmin, Operation, ServerState};

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap()
    }

    fn actions(kind: ActionKind, ids: &[&str]) -> Vec<PlannedAction> {
        ids.iter()
            .map(|id| PlannedAction::new(ServerId::from(*id), kind))
            .collect()
    }

    #[test]
    fn test_batch_applies_every_action() {
        let admin = MemoryAdmin::new()
            .with_server("a", false, ServerState::Inactive)
            .with_server("b", false, ServerState::Inactive);

        let outcome = execute_batch(&admin, &actions(ActionKind::Enable, &["a", "b"]), &pool());

        let (succeeded, failure) = outcome.settle();
        assert_eq!(succeeded, vec![ServerId::from("a"), ServerId::from("b")]);
        assert!(failure.is_none());
        assert_eq!(admin.snapshot(&"a".into()), Some((true, ServerState::Inactive)));
    }

    #[test]
    fn test_lifecycle_dispatch() {
        let admin = MemoryAdmin::new()
            .with_server("a", true, ServerState::Inactive)
            .with_server("b", true, ServerState::Active);

        execute_batch(&admin, &actions(ActionKind::Start, &["a"]), &pool());
        execute_batch(&admin, &actions(ActionKind::Stop, &["b"]), &pool());

        assert_eq!(admin.snapshot(&"a".into()), Some((true, ServerState::Active)));
        assert_eq!(admin.snapshot(&"b".into()), Some((true, ServerState::Inactive)));
        assert_eq!(admin.calls(Operation::Start), 1);
        assert_eq!(admin.calls(Operation::Stop), 1);
    }

    #[test]
    fn test_failure_does_not_stop_the_batch() {
        let admin = MemoryAdmin::new()
            .with_server("a", false, ServerState::Inactive)
            .with_server("b", false, ServerState::Inactive)
            .with_server("c", false, ServerState::Inactive);
        admin.fail_on(
            "b",
            Operation::Enable,
            gridkit::Error::NodeUnreachable {
                node: "node2".into(),
                reason: "connect timeout".into(),
            },
        );

        let outcome = execute_batch(
            &admin,
            &actions(ActionKind::Enable, &["a", "b", "c"]),
            &pool(),
        );

        assert_eq!(admin.calls(Operation::Enable), 3);
        let (succeeded, failure) = outcome.settle();
        assert_eq!(succeeded, vec![ServerId::from("a")]);
        let failure = failure.unwrap();
        assert_eq!(failure.server, ServerId::from("b"));
        assert_eq!(failure.kind, ActionKind::Enable);
        assert_eq!(failure.to_string(), "Node node2 could not be reached. connect timeout");
        // c was still enabled even though it is not reported
        assert_eq!(admin.snapshot(&"c".into()), Some((true, ServerState::Inactive)));
    }

    #[test]
    fn test_vanished_server() {
        let admin = MemoryAdmin::new().with_server("a", true, ServerState::Inactive);
        admin.remove_server(&"a".into());

        let outcome = execute_batch(&admin, &actions(ActionKind::Start, &["a"]), &pool());
        assert_eq!(
            outcome.first_failure().map(|f| f.reason),
            Some(FailureReason::TargetVanished)
        );
    }

    #[test]
    fn test_empty_batch() {
        let admin = MemoryAdmin::new();
        let outcome = execute_batch(&admin, &[], &pool());
        assert!(outcome.is_empty());
        assert_eq!(admin.mutating_calls(), 0);
    }
}
