//! Result aggregation

use gridkit::ServerId;

use crate::types::{DesiredState, ReconciliationResult};

/// Combine the success lists of a run into its result
///
/// The enablement list lands in `enabled` or `disabled` depending on the
/// desired enablement; `state_changed` is present only when a lifecycle
/// target was set.
pub fn aggregate(
    targets: Vec<ServerId>,
    desired: &DesiredState,
    enablement_ok: Vec<ServerId>,
    lifecycle_ok: Vec<ServerId>,
) -> ReconciliationResult {
    let changed = !enablement_ok.is_empty() || !lifecycle_ok.is_empty();
    let mut result = ReconciliationResult {
        targets,
        changed,
        ..Default::default()
    };

    match desired.enabled {
        Some(true) => result.enabled = Some(enablement_ok),
        Some(false) => result.disabled = Some(enablement_ok),
        None => {}
    }
    if desired.lifecycle.is_some() {
        result.state_changed = Some(lifecycle_ok);
    }

    result
}
