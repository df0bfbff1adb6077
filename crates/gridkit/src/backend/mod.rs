//! Admin handle abstraction and implementations.
//!
//! The [`AdminHandle`] trait is the capability obtained from an admin session
//! on the registry. Implementations:
//!
//! - [`http::HttpAdmin`] talks to a registry over its HTTP admin API
//! - [`memory::MemoryAdmin`] keeps an in-memory inventory for tests
//!
//! # Testing
//!
//! ```
//! use gridkit::{AdminHandle, MemoryAdmin, ServerState};
//!
//! let admin = MemoryAdmin::new();
//! admin.add_server("a", false, ServerState::Inactive);
//!
//! admin.enable_server(&"a".into(), true).unwrap();
//! assert!(admin.is_server_enabled(&"a".into()).unwrap());
//! ```

pub mod http;
pub mod memory;

use crate::error::Result;
use crate::types::{ServerId, ServerState};

/// Capability for administering servers on a registry.
///
/// Calls are blocking round-trips. Implementations must be safe to call from
/// many threads at once, since callers fan calls out over a thread pool.
pub trait AdminHandle: Send + Sync {
    /// List the ids of every server known to the registry.
    fn list_all_server_ids(&self) -> Result<Vec<ServerId>>;

    /// Whether the server is enabled.
    ///
    /// # Errors
    ///
    /// Returns `Error::ServerNotExist` if the id is unknown.
    fn is_server_enabled(&self, id: &ServerId) -> Result<bool>;

    /// Current lifecycle state of the server.
    ///
    /// # Errors
    ///
    /// Returns `Error::ServerNotExist` if the id is unknown.
    fn get_server_state(&self, id: &ServerId) -> Result<ServerState>;

    /// Enable or disable the server.
    fn enable_server(&self, id: &ServerId, enabled: bool) -> Result<()>;

    /// Start the server.
    fn start_server(&self, id: &ServerId) -> Result<()>;

    /// Stop the server.
    fn stop_server(&self, id: &ServerId) -> Result<()>;
}

impl<T: AdminHandle + ?Sized> AdminHandle for Box<T> {
    fn list_all_server_ids(&self) -> Result<Vec<ServerId>> {
        (**self).list_all_server_ids()
    }

    fn is_server_enabled(&self, id: &ServerId) -> Result<bool> {
        (**self).is_server_enabled(id)
    }

    fn get_server_state(&self, id: &ServerId) -> Result<ServerState> {
        (**self).get_server_state(id)
    }

    fn enable_server(&self, id: &ServerId, enabled: bool) -> Result<()> {
        (**self).enable_server(id, enabled)
    }

    fn start_server(&self, id: &ServerId) -> Result<()> {
        (**self).start_server(id)
    }

    fn stop_server(&self, id: &ServerId) -> Result<()> {
        (**self).stop_server(id)
    }
}
