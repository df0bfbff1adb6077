//! Core types for server state reconciliation

use gridkit::{LifecycleClass, ServerId, ServerState};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Desired lifecycle end-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleTarget {
    Started,
    Stopped,
}

impl LifecycleTarget {
    /// Whether a server in `state` already counts as being at this target
    ///
    /// Transitional states count toward where they are heading, so a server
    /// that is `Activating` satisfies `Started`.
    pub fn is_satisfied_by(&self, state: ServerState) -> bool {
        match self {
            Self::Started => state.classify() == LifecycleClass::Started,
            Self::Stopped => state.classify() == LifecycleClass::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "started" => Ok(Self::Started),
            "stopped" => Ok(Self::Stopped),
            other => Err(format!("unknown state '{other}' (expected started or stopped)")),
        }
    }
}

/// What the servers should look like after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Desired enablement, if any
    pub enabled: Option<bool>,
    /// Desired lifecycle, if any
    pub lifecycle: Option<LifecycleTarget>,
}

impl DesiredState {
    pub fn new(enabled: Option<bool>, lifecycle: Option<LifecycleTarget>) -> Self {
        Self { enabled, lifecycle }
    }

    /// Reject a desired state that asks for nothing
    pub fn validate(&self) -> Result<()> {
        if self.enabled.is_none() && self.lifecycle.is_none() {
            return Err(Error::configuration(
                "One of 'state' or 'enabled' must be set.",
            ));
        }
        Ok(())
    }
}

/// Enablement and lifecycle of one server, captured once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedServerInfo {
    pub enabled: bool,
    pub lifecycle: ServerState,
}

/// Observed state of every target, in target order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    entries: Vec<(ServerId, ObservedServerInfo)>,
    index: HashMap<ServerId, usize>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a server's observed info
    pub fn insert(&mut self, id: ServerId, info: ObservedServerInfo) {
        if let Some(&slot) = self.index.get(&id) {
            self.entries[slot].1 = info;
            return;
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, info));
    }

    pub fn get(&self, id: &ServerId) -> Option<&ObservedServerInfo> {
        self.index.get(id).map(|&slot| &self.entries[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ServerId, &ObservedServerInfo)> {
        self.entries.iter().map(|(id, info)| (id, info))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ServerId, ObservedServerInfo)> for Observation {
    fn from_iter<I: IntoIterator<Item = (ServerId, ObservedServerInfo)>>(iter: I) -> Self {
        let mut observation = Self::new();
        for (id, info) in iter {
            observation.insert(id, info);
        }
        observation
    }
}

/// Input of one reconciliation run
#[derive(Debug, Clone, Default)]
pub struct ReconcileRequest {
    /// Requested servers; `None` means every server the registry knows
    pub targets: Option<Vec<ServerId>>,
    /// Desired end-state
    pub desired: DesiredState,
    /// Drop requested servers the registry does not know instead of failing
    pub skip_unknown: bool,
    /// Fan-out width; `None` sizes the pool to the number of targets
    pub jobs: Option<usize>,
}

impl ReconcileRequest {
    pub fn new(desired: DesiredState) -> Self {
        Self {
            desired,
            ..Default::default()
        }
    }

    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ServerId>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn skip_unknown(mut self, skip: bool) -> Self {
        self.skip_unknown = skip;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }
}

/// Final outcome of a run
///
/// Serializes to the caller-facing shape: `enabled`/`disabled` are present
/// only when an enablement target was given, `stateChanged` only when a
/// lifecycle target was given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub targets: Vec<ServerId>,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<ServerId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<ServerId>>,
    #[serde(rename = "stateChanged", skip_serializing_if = "Option::is_none")]
    pub state_changed: Option<Vec<ServerId>>,
}

impl ReconciliationResult {
    /// Result of a run with nothing to act on
    pub fn empty(targets: Vec<ServerId>) -> Self {
        Self {
            targets,
            ..Default::default()
        }
    }

    /// Servers whose enablement was changed, whichever direction
    pub fn enablement_changed(&self) -> &[ServerId] {
        self.enabled
            .as_deref()
            .or(self.disabled.as_deref())
            .unwrap_or_default()
    }

    /// Servers whose lifecycle was changed
    pub fn lifecycle_changed(&self) -> &[ServerId] {
        self.state_changed.as_deref().unwrap_or_default()
    }

    /// Every changed server once, in target order
    pub fn changed_servers(&self) -> Vec<&ServerId> {
        let changed: HashSet<&ServerId> = self
            .enablement_changed()
            .iter()
            .chain(self.lifecycle_changed())
            .collect();
        self.targets
            .iter()
            .filter(|id| changed.contains(id))
            .collect()
    }
}
