//! Progress reporting hooks
//!
//! The engine reports what it is doing through [`ProgressCallback`] so it can
//! be driven from a terminal UI, a log, or nothing at all.

use crate::planner::{ActionKind, PlannedAction};

/// Progress callback for reconciliation runs
///
/// Per-action completions are reported after a batch has fully resolved,
/// in plan order, since the calls themselves run on pool threads.
pub trait ProgressCallback: Send {
    /// Called before observing `count` servers
    fn on_observe_start(&mut self, count: usize);

    /// Called once every server has been observed
    fn on_observe_complete(&mut self);

    /// Called before issuing a batch of `count` actions of one kind
    fn on_batch_start(&mut self, kind: ActionKind, count: usize);

    /// Called for each action of the batch once it has resolved
    fn on_action_complete(&mut self, action: &PlannedAction, succeeded: bool);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_observe_start(&mut self, _count: usize) {}
    fn on_observe_complete(&mut self) {}
    fn on_batch_start(&mut self, _kind: ActionKind, _count: usize) {}
    fn on_action_complete(&mut self, _action: &PlannedAction, _succeeded: bool) {}
    fn on_batch_complete(&mut self) {}
}
