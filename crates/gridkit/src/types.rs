//! Core registry types.
//!
//! Server identities and the lifecycle state space reported by the registry,
//! plus the coarse started/stopped classification used when deciding whether
//! a server needs a lifecycle action.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier of a server managed by the registry.
///
/// Uniqueness is enforced by the registry, not by this crate.
///
/// # Example
///
/// ```
/// use gridkit::ServerId;
///
/// let id = ServerId::from("billing-1");
/// assert_eq!(id.as_str(), "billing-1");
/// assert_eq!(id.to_string(), "billing-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    /// Create a server id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ServerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ServerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a server as reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerState {
    /// Not running.
    Inactive,
    /// Being started.
    Activating,
    /// Activation did not complete in time.
    ActivationTimedOut,
    /// Running.
    Active,
    /// Being stopped.
    Deactivating,
    /// Being destroyed.
    Destroying,
    /// Destroyed.
    Destroyed,
}

/// Coarse classification of a [`ServerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleClass {
    /// Running, or on its way to running.
    Started,
    /// Stopped, or on its way to stopping.
    Stopped,
    /// Neither (timed out or destroyed).
    Other,
}

impl ServerState {
    /// All states, in registry order.
    pub const ALL: [ServerState; 7] = [
        Self::Inactive,
        Self::Activating,
        Self::ActivationTimedOut,
        Self::Active,
        Self::Deactivating,
        Self::Destroying,
        Self::Destroyed,
    ];

    /// Registry name of the state.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inactive => "Inactive",
            Self::Activating => "Activating",
            Self::ActivationTimedOut => "ActivationTimedOut",
            Self::Active => "Active",
            Self::Deactivating => "Deactivating",
            Self::Destroying => "Destroying",
            Self::Destroyed => "Destroyed",
        }
    }

    /// Classify the state into started / stopped.
    ///
    /// Transitional states count toward the end state they are moving to,
    /// so `Activating` is started and `Deactivating` is stopped.
    ///
    /// ```
    /// use gridkit::{LifecycleClass, ServerState};
    ///
    /// assert_eq!(ServerState::Activating.classify(), LifecycleClass::Started);
    /// assert_eq!(ServerState::Destroying.classify(), LifecycleClass::Stopped);
    /// assert_eq!(ServerState::Destroyed.classify(), LifecycleClass::Other);
    /// ```
    #[must_use]
    pub fn classify(&self) -> LifecycleClass {
        match self {
            Self::Active | Self::Activating => LifecycleClass::Started,
            Self::Inactive | Self::Deactivating | Self::Destroying => LifecycleClass::Stopped,
            Self::ActivationTimedOut | Self::Destroyed => LifecycleClass::Other,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown server state: {s}"))
    }
}
