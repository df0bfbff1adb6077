//! Planner - derives the actions that move observed servers to the desired state

use gridkit::ServerId;
use serde::Serialize;
use std::fmt;

use crate::types::{DesiredState, LifecycleTarget, Observation};

/// A single mutating registry call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Enable,
    Disable,
    Start,
    Stop,
}

impl ActionKind {
    /// Enablement action that reaches `enabled`
    pub fn for_enablement(enabled: bool) -> Self {
        if enabled { Self::Enable } else { Self::Disable }
    }

    /// Lifecycle action that reaches `target`
    pub fn for_lifecycle(target: LifecycleTarget) -> Self {
        match target {
            LifecycleTarget::Started => Self::Start,
            LifecycleTarget::Stopped => Self::Stop,
        }
    }

    /// Imperative verb, as used in failure messages
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    /// Progressive label for UI
    pub fn label(&self) -> &'static str {
        match self {
            Self::Enable => "Enabling",
            Self::Disable => "Disabling",
            Self::Start => "Starting",
            Self::Stop => "Stopping",
        }
    }

    /// Whether this action changes enablement rather than lifecycle
    pub fn is_enablement(&self) -> bool {
        matches!(self, Self::Enable | Self::Disable)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// An action bound to a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub server: ServerId,
    pub kind: ActionKind,
}

impl PlannedAction {
    pub fn new(server: ServerId, kind: ActionKind) -> Self {
        Self { server, kind }
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.server)
    }
}

/// Actions to issue, split into the two batches of a run
///
/// Both lists follow the order of the observation they were planned from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Enable or disable calls; issued first
    pub enablement: Vec<PlannedAction>,
    /// Start or stop calls; issued once every enablement call succeeded
    pub lifecycle: Vec<PlannedAction>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.enablement.is_empty() && self.lifecycle.is_empty()
    }

    pub fn total(&self) -> usize {
        self.enablement.len() + self.lifecycle.len()
    }

    /// Every action, enablement batch first
    pub fn actions(&self) -> impl Iterator<Item = &PlannedAction> {
        self.enablement.iter().chain(&self.lifecycle)
    }
}

/// Plan the actions that bring every observed server to `desired`
///
/// Pure: a server is planned for a dimension only when that dimension is
/// requested and the observed value does not already satisfy it. Servers in
/// a state that is neither started nor stopped (timed out, destroyed) are
/// always planned when a lifecycle target is set.
pub fn plan(observation: &Observation, desired: &DesiredState) -> Plan {
    let mut plan = Plan::default();

    for (id, info) in observation.iter() {
        if let Some(enabled) = desired.enabled
            && info.enabled != enabled
        {
            plan.enablement.push(PlannedAction::new(
                id.clone(),
                ActionKind::for_enablement(enabled),
            ));
        }

        if let Some(target) = desired.lifecycle
            && !target.is_satisfied_by(info.lifecycle)
        {
            plan.lifecycle.push(PlannedAction::new(
                id.clone(),
                ActionKind::for_lifecycle(target),
            ));
        }
    }

    plan
}
