//! In-memory registry for tests.
//!
//! [`MemoryAdmin`] keeps an ordered inventory of servers and applies admin
//! calls to it directly. Failures can be injected per server and operation,
//! and every call is counted so tests can assert what was (not) issued.

use crate::backend::AdminHandle;
use crate::error::{Error, Result};
use crate::types::{ServerId, ServerState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Admin operations, used for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_all_server_ids`
    ListAll,
    /// `is_server_enabled`
    IsEnabled,
    /// `get_server_state`
    GetState,
    /// `enable_server`
    Enable,
    /// `start_server`
    Start,
    /// `stop_server`
    Stop,
}

#[derive(Debug, Clone)]
struct ServerRecord {
    id: ServerId,
    enabled: bool,
    state: ServerState,
}

#[derive(Debug, Default)]
struct Registry {
    servers: Vec<ServerRecord>,
    failures: HashMap<(ServerId, Operation), Error>,
    list_failure: Option<Error>,
    calls: HashMap<Operation, usize>,
}

impl Registry {
    fn find(&self, id: &ServerId) -> Result<&ServerRecord> {
        self.servers
            .iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::server_not_exist(id.as_str()))
    }

    fn find_mut(&mut self, id: &ServerId) -> Result<&mut ServerRecord> {
        self.servers
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::server_not_exist(id.as_str()))
    }

    fn record(&mut self, id: &ServerId, op: Operation) -> Result<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get(&(id.clone(), op)) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Thread-safe in-memory registry.
///
/// Clones share the same inventory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdmin {
    inner: Arc<Mutex<Registry>>,
}

impl MemoryAdmin {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a server.
    pub fn add_server(&self, id: impl Into<ServerId>, enabled: bool, state: ServerState) {
        let id = id.into();
        let mut registry = self.registry();
        match registry.servers.iter_mut().find(|s| s.id == id) {
            Some(existing) => {
                existing.enabled = enabled;
                existing.state = state;
            }
            None => registry.servers.push(ServerRecord { id, enabled, state }),
        }
    }

    /// Builder-style variant of [`MemoryAdmin::add_server`].
    #[must_use]
    pub fn with_server(self, id: impl Into<ServerId>, enabled: bool, state: ServerState) -> Self {
        self.add_server(id, enabled, state);
        self
    }

    /// Remove a server from the inventory.
    pub fn remove_server(&self, id: &ServerId) -> bool {
        let mut registry = self.registry();
        let before = registry.servers.len();
        registry.servers.retain(|s| &s.id != id);
        registry.servers.len() < before
    }

    /// Make `op` on `id` fail with `err`.
    pub fn fail_on(&self, id: impl Into<ServerId>, op: Operation, err: Error) {
        self.registry().failures.insert((id.into(), op), err);
    }

    /// Make `list_all_server_ids` fail with `err`.
    pub fn fail_listing(&self, err: Error) {
        self.registry().list_failure = Some(err);
    }

    /// Number of calls made for an operation (including failed ones).
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.registry().calls.get(&op).copied().unwrap_or(0)
    }

    /// Total number of mutating calls (enable, start, stop).
    #[must_use]
    pub fn mutating_calls(&self) -> usize {
        self.calls(Operation::Enable) + self.calls(Operation::Start) + self.calls(Operation::Stop)
    }

    /// Current (enabled, state) of a server, bypassing call counting.
    #[must_use]
    pub fn snapshot(&self, id: &ServerId) -> Option<(bool, ServerState)> {
        self.registry()
            .find(id)
            .ok()
            .map(|record| (record.enabled, record.state))
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        match self.inner.lock() {
            Ok(locked) => locked,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AdminHandle for MemoryAdmin {
    fn list_all_server_ids(&self) -> Result<Vec<ServerId>> {
        let mut registry = self.registry();
        *registry.calls.entry(Operation::ListAll).or_default() += 1;
        if let Some(err) = &registry.list_failure {
            return Err(err.clone());
        }
        Ok(registry.servers.iter().map(|s| s.id.clone()).collect())
    }

    fn is_server_enabled(&self, id: &ServerId) -> Result<bool> {
        let mut registry = self.registry();
        registry.record(id, Operation::IsEnabled)?;
        Ok(registry.find(id)?.enabled)
    }

    fn get_server_state(&self, id: &ServerId) -> Result<ServerState> {
        let mut registry = self.registry();
        registry.record(id, Operation::GetState)?;
        Ok(registry.find(id)?.state)
    }

    fn enable_server(&self, id: &ServerId, enabled: bool) -> Result<()> {
        let mut registry = self.registry();
        registry.record(id, Operation::Enable)?;
        registry.find_mut(id)?.enabled = enabled;
        Ok(())
    }

    fn start_server(&self, id: &ServerId) -> Result<()> {
        let mut registry = self.registry();
        registry.record(id, Operation::Start)?;
        registry.find_mut(id)?.state = ServerState::Active;
        Ok(())
    }

    fn stop_server(&self, id: &ServerId) -> Result<()> {
        let mut registry = self.registry();
        registry.record(id, Operation::Stop)?;
        registry.find_mut(id)?.state = ServerState::Inactive;
        Ok(())
    }
}
