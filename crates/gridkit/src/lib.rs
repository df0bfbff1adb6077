//! # gridkit
//!
//! Admin client library for a central server registry.
//!
//! This crate provides:
//! - Core registry types ([`ServerId`], [`ServerState`])
//! - The [`AdminHandle`] capability used to query and mutate server state
//! - The error taxonomy reported by the registry, with categories
//! - An HTTP session backend ([`backend::http`]) and an in-memory backend
//!   ([`MemoryAdmin`]) for tests
//!
//! ## Example
//!
//! ```
//! use gridkit::{AdminHandle, MemoryAdmin, ServerState};
//!
//! let admin = MemoryAdmin::new();
//! admin.add_server("api", true, ServerState::Inactive);
//!
//! admin.start_server(&"api".into()).unwrap();
//! assert_eq!(admin.get_server_state(&"api".into()).unwrap(), ServerState::Active);
//! ```
//!
//! ## Connecting to a registry
//!
//! ```no_run
//! use gridkit::backend::http::{self, Credentials, SessionConfig};
//! use gridkit::AdminHandle;
//!
//! let config = SessionConfig::new(
//!     "https://registry.example:4061",
//!     Credentials::password("admin", "secret"),
//! );
//! let admin = http::connect(&config).expect("session");
//! println!("{} servers", admin.list_all_server_ids().unwrap().len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::AdminHandle;
pub use backend::memory::{MemoryAdmin, Operation};
pub use error::{Error, ErrorCategory, Result};
pub use types::{LifecycleClass, ServerId, ServerState};
