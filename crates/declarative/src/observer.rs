//! State observation - fetch enablement and lifecycle of every target

use gridkit::{AdminHandle, ServerId, ServerState};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::types::{ObservedServerInfo, Observation};

type Reading = (gridkit::Result<bool>, gridkit::Result<ServerState>);

/// Observe every target
///
/// Both calls for every target are issued through `pool` and all of them
/// resolve before any result is inspected. The first failing target (in
/// target order) aborts the run.
pub fn observe(
    admin: &dyn AdminHandle,
    targets: &[ServerId],
    pool: &ThreadPool,
) -> Result<Observation> {
    let readings: Vec<Reading> = pool.install(|| {
        targets
            .par_iter()
            .map(|id| {
                rayon::join(
                    || admin.is_server_enabled(id),
                    || admin.get_server_state(id),
                )
            })
            .collect()
    });

    let mut observation = Observation::new();
    for (id, (enabled, lifecycle)) in targets.iter().zip(readings) {
        let info = enabled
            .and_then(|enabled| lifecycle.map(|lifecycle| ObservedServerInfo { enabled, lifecycle }))
            .map_err(|source| Error::RemoteUnavailable {
                server: id.clone(),
                source,
            })?;
        log::debug!(
            "Observed {id}: enabled={} state={}",
            info.enabled,
            info.lifecycle
        );
        observation.insert(id.clone(), info);
    }

    Ok(observation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridkit::{MemoryAdmin, Operation};

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
    }

    #[test]
    fn test_observe_all_targets() {
        let admin = MemoryAdmin::new()
            .with_server("a", true, ServerState::Active)
            .with_server("b", false, ServerState::Inactive);
        let targets = vec![ServerId::from("a"), ServerId::from("b")];

        let observation = observe(&admin, &targets, &pool()).unwrap();

        assert_eq!(observation.len(), 2);
        assert_eq!(
            observation.get(&"b".into()),
            Some(&ObservedServerInfo {
                enabled: false,
                lifecycle: ServerState::Inactive
            })
        );
        assert_eq!(admin.calls(Operation::IsEnabled), 2);
        assert_eq!(admin.calls(Operation::GetState), 2);
    }

    #[test]
    fn test_observation_follows_target_order() {
        let admin = MemoryAdmin::new()
            .with_server("a", true, ServerState::Active)
            .with_server("b", true, ServerState::Active)
            .with_server("c", true, ServerState::Active);
        let targets = vec![ServerId::from("c"), ServerId::from("a"), ServerId::from("b")];

        let observation = observe(&admin, &targets, &pool()).unwrap();
        let order: Vec<_> = observation.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(order, targets);
    }

    #[test]
    fn test_any_failure_aborts() {
        let admin = MemoryAdmin::new()
            .with_server("a", true, ServerState::Active)
            .with_server("b", true, ServerState::Active);
        admin.fail_on(
            "b",
            Operation::GetState,
            gridkit::Error::transport("connection reset", None),
        );
        let targets = vec![ServerId::from("a"), ServerId::from("b")];

        let err = observe(&admin, &targets, &pool()).unwrap_err();
        match err {
            Error::RemoteUnavailable { server, source } => {
                assert_eq!(server, ServerId::from("b"));
                assert!(source.is_transport());
            }
            other => panic!("unexpected error: {other}"),
        }
        // Every call was still issued
        assert_eq!(admin.calls(Operation::GetState), 2);
    }
}
