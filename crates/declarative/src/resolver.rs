//! Target resolution - match requested servers against the registry inventory

use gridkit::ServerId;
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Resolve the servers a run acts on
///
/// - No request: every server in `inventory`, in inventory order.
/// - `skip_unknown == false`: fails with [`Error::UnknownTargets`] listing every
///   requested id the registry does not know.
/// - `skip_unknown == true`: the requested ids the registry knows, in request
///   order; unknown ids are dropped.
///
/// Duplicate requested ids are collapsed to their first occurrence.
pub fn resolve_targets(
    requested: Option<&[ServerId]>,
    inventory: &[ServerId],
    skip_unknown: bool,
) -> Result<Vec<ServerId>> {
    let Some(requested) = requested else {
        return Ok(inventory.to_vec());
    };

    let known: HashSet<&ServerId> = inventory.iter().collect();
    let mut seen = HashSet::new();
    let requested: Vec<&ServerId> = requested.iter().filter(|id| seen.insert(*id)).collect();

    let (resolved, unknown): (Vec<&ServerId>, Vec<&ServerId>) =
        requested.into_iter().partition(|id| known.contains(id));

    if !unknown.is_empty() {
        if !skip_unknown {
            return Err(Error::UnknownTargets {
                ids: unknown.into_iter().cloned().collect(),
            });
        }
        for id in &unknown {
            log::info!("Skipping unknown server {id}");
        }
    }

    Ok(resolved.into_iter().cloned().collect())
}
