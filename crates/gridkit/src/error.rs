//! Error types for registry operations.
//!
//! Errors mirror the failures a registry reports for admin calls, plus the
//! transport failures of reaching it at all. Each error has a category that
//! callers use to decide what to tell the user.

use std::fmt;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of registry errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The server is not (or no longer) known to the registry.
    Missing,
    /// The node hosting the server cannot be reached.
    Unreachable,
    /// The server refused to start or stop.
    Operational,
    /// Registry-level inconsistency.
    Deployment,
    /// Session could not be created with the given credentials.
    Permission,
    /// The registry itself could not be reached or answered garbage.
    Transport,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error means the registry could not be talked to at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Missing => "Server does not exist",
            Self::Unreachable => "Node unreachable",
            Self::Operational => "Server operation failed",
            Self::Deployment => "Deployment error",
            Self::Permission => "Permission denied",
            Self::Transport => "Registry unavailable",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Missing => "Check the server name, or pass --skip to ignore unknown servers",
            Self::Unreachable => "Check that the node is running and reachable from the registry",
            Self::Operational => "Inspect the server logs on its node",
            Self::Deployment => "Check the registry's application descriptors",
            Self::Permission => "Verify username and password, or use --secure",
            Self::Transport => "Check the locator and that the registry is running",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The server id is not known to the registry.
    #[error("Server {id} does not exist")]
    ServerNotExist {
        /// Server id.
        id: String,
    },

    /// The node a server is deployed on could not be reached.
    #[error("Node {node} could not be reached. {reason}")]
    NodeUnreachable {
        /// Node name.
        node: String,
        /// Reason reported by the registry.
        reason: String,
    },

    /// The server failed to start.
    #[error("Failed to start server {id}. {reason}")]
    ServerStart {
        /// Server id.
        id: String,
        /// Reason reported by the registry.
        reason: String,
    },

    /// The server failed to stop.
    #[error("Failed to stop server {id}. {reason}")]
    ServerStop {
        /// Server id.
        id: String,
        /// Reason reported by the registry.
        reason: String,
    },

    /// Registry-level deployment inconsistency.
    #[error("DeploymentException: {reason}")]
    Deployment {
        /// Reason reported by the registry.
        reason: String,
    },

    /// Admin session was refused.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Details from the registry.
        message: String,
    },

    /// Connection or HTTP failure.
    #[error("registry request failed: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The registry answered with something we could not decode.
    #[error("invalid registry response: {0}")]
    InvalidResponse(String),

    /// The locator is not a usable endpoint.
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    /// Client certificate or key could not be loaded.
    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            status,
        }
    }

    /// Create a server-not-exist error.
    pub fn server_not_exist(id: impl Into<String>) -> Self {
        Self::ServerNotExist { id: id.into() }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ServerNotExist { .. } => ErrorCategory::Missing,
            Error::NodeUnreachable { .. } => ErrorCategory::Unreachable,
            Error::ServerStart { .. } | Error::ServerStop { .. } => ErrorCategory::Operational,
            Error::Deployment { .. } => ErrorCategory::Deployment,
            Error::PermissionDenied { .. } => ErrorCategory::Permission,
            Error::Transport { .. } | Error::InvalidResponse(_) => ErrorCategory::Transport,
            Error::InvalidLocator(_) | Error::Tls(_) | Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether the registry could not be talked to at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.category().is_transport()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Transport {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Transport {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
