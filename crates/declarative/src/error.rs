//! Error types for reconciliation runs
//!
//! Every error is fatal for the run. An action failure carries whatever the
//! run had already achieved, since concurrent actions are never rolled back.

use gridkit::{ErrorCategory, ServerId};
use std::fmt;
use thiserror::Error;

use crate::planner::ActionKind;
use crate::types::ReconciliationResult;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single action failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Server was removed from the registry between observation and action
    TargetVanished,
    /// The node hosting the server could not be reached
    NodeUnreachable { node: String, reason: String },
    /// The server reported a start failure
    StartFailed { reason: String },
    /// The server reported a stop failure
    StopFailed { reason: String },
    /// Registry-level inconsistency
    DeploymentError { reason: String },
    /// Anything else the registry or transport reported
    Unexpected { message: String },
}

impl FailureReason {
    /// Classify a registry error raised by an action call
    pub fn classify(err: gridkit::Error) -> Self {
        match err {
            gridkit::Error::ServerNotExist { .. } => Self::TargetVanished,
            gridkit::Error::NodeUnreachable { node, reason } => {
                Self::NodeUnreachable { node, reason }
            }
            gridkit::Error::ServerStart { reason, .. } => Self::StartFailed { reason },
            gridkit::Error::ServerStop { reason, .. } => Self::StopFailed { reason },
            gridkit::Error::Deployment { reason } => Self::DeploymentError { reason },
            other => Self::Unexpected {
                message: other.to_string(),
            },
        }
    }

    /// Short machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TargetVanished => "TargetVanished",
            Self::NodeUnreachable { .. } => "NodeUnreachable",
            Self::StartFailed { .. } => "StartFailed",
            Self::StopFailed { .. } => "StopFailed",
            Self::DeploymentError { .. } => "DeploymentError",
            Self::Unexpected { .. } => "Unexpected",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TargetVanished => ErrorCategory::Missing,
            Self::NodeUnreachable { .. } => ErrorCategory::Unreachable,
            Self::StartFailed { .. } | Self::StopFailed { .. } => ErrorCategory::Operational,
            Self::DeploymentError { .. } => ErrorCategory::Deployment,
            Self::Unexpected { .. } => ErrorCategory::Other,
        }
    }
}

/// A failed action: which server, what was attempted, and why it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub server: ServerId,
    pub kind: ActionKind,
    pub reason: FailureReason,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::TargetVanished => write!(f, "Server {} does not exist", self.server),
            FailureReason::NodeUnreachable { node, reason } => {
                write!(f, "Node {node} could not be reached. {reason}")
            }
            FailureReason::StartFailed { reason } => {
                write!(f, "Failed to start server {}. {reason}", self.server)
            }
            FailureReason::StopFailed { reason } => {
                write!(f, "Failed to stop server {}. {reason}", self.server)
            }
            FailureReason::DeploymentError { reason } => {
                write!(f, "DeploymentException: {reason}")
            }
            FailureReason::Unexpected { message } => {
                write!(f, "Failed to {} server {}. {message}", self.kind.verb(), self.server)
            }
        }
    }
}

impl std::error::Error for ActionFailure {}

/// Errors that end a reconciliation run
#[derive(Debug, Error)]
pub enum Error {
    /// Desired state or options are contradictory or incomplete
    #[error("{message}")]
    Configuration { message: String },

    /// Requested servers the registry does not know
    #[error("The following servers do not exist: {}", join_ids(.ids))]
    UnknownTargets { ids: Vec<ServerId> },

    /// Listing the registry inventory failed
    #[error("failed to list servers: {source}")]
    Inventory {
        #[source]
        source: gridkit::Error,
    },

    /// Observing a server failed; no plan can be made without it
    #[error("failed to observe server {server}: {source}")]
    RemoteUnavailable {
        server: ServerId,
        #[source]
        source: gridkit::Error,
    },

    /// An action failed; `partial` holds what succeeded before it
    #[error("{failure}")]
    Action {
        #[source]
        failure: ActionFailure,
        partial: Box<ReconciliationResult>,
    },

    /// The fan-out thread pool could not be created
    #[error("failed to create thread pool: {0}")]
    ThreadPool(String),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Registry error category behind this error, if the registry caused it
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::UnknownTargets { .. } => Some(ErrorCategory::Missing),
            Self::Inventory { source } | Self::RemoteUnavailable { source, .. } => {
                Some(source.category())
            }
            Self::Action { failure, .. } => Some(failure.reason.category()),
            Self::Configuration { .. } | Self::ThreadPool(_) => None,
        }
    }

    /// Partial result carried by an action failure
    pub fn partial_result(&self) -> Option<&ReconciliationResult> {
        match self {
            Self::Action { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

fn join_ids(ids: &[ServerId]) -> String {
    ids.iter()
        .map(ServerId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
