//! # Declarative
//!
//! Declarative state for registry-managed servers.
//!
//! Given a desired enablement and/or lifecycle state, the engine observes the
//! current state of every target, plans only the calls that would change
//! something, and issues them concurrently. Running it twice against an
//! unchanged registry changes nothing the second time.
//!
//! ## Core Concepts
//!
//! - **DesiredState**: optional enablement plus optional lifecycle target
//! - **Observation**: enablement and lifecycle of every target, captured once per run
//! - **Plan**: enablement actions, then lifecycle actions, in target order
//! - **ReconciliationResult**: which servers were changed
//!
//! ## Example
//!
//! ```
//! use declarative::{DesiredState, LifecycleTarget, NoProgress, ReconcileRequest, reconcile};
//! use gridkit::{MemoryAdmin, ServerId, ServerState};
//!
//! let admin = MemoryAdmin::new()
//!     .with_server("api", false, ServerState::Inactive)
//!     .with_server("worker", true, ServerState::Active);
//!
//! let request = ReconcileRequest::new(DesiredState::new(
//!     Some(true),
//!     Some(LifecycleTarget::Started),
//! ));
//!
//! let result = reconcile(&admin, &request, &mut NoProgress)?;
//! assert!(result.changed);
//! assert_eq!(result.enabled, Some(vec![ServerId::from("api")]));
//!
//! // Converged: nothing left to do
//! let again = reconcile(&admin, &request, &mut NoProgress)?;
//! assert!(!again.changed);
//! # Ok::<(), declarative::Error>(())
//! ```
//!
//! ## Failures
//!
//! Every error ends the run. An action failure is reported as
//! [`Error::Action`], which carries the servers changed before it; already
//! issued calls are never rolled back.

pub mod aggregate;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod observer;
pub mod planner;
pub mod resolver;
pub mod types;

pub use context::{NoProgress, ProgressCallback};
pub use engine::{Preview, PreviewRow, preview, reconcile};
pub use error::{ActionFailure, Error, FailureReason, Result};
pub use planner::{ActionKind, Plan, PlannedAction};
pub use types::{
    DesiredState, LifecycleTarget, ObservedServerInfo, Observation, ReconcileRequest,
    ReconciliationResult,
};
