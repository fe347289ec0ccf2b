//! Tamper-evident product passport registry.
//!
//! The registry issues, updates, deactivates and verifies passport records
//! for physical goods. Every mutation is gated by a two-tier authorization
//! check (one owner principal plus a revocable issuer allow-list), and each
//! record's content locator, integrity hash and product id are unique across
//! the whole registry — permanently, even after deactivation. Verification
//! is public and read-only; every successful mutation broadcasts exactly one
//! ordered change notification for external mirrors.

pub mod config;
pub mod digest;
pub mod error;
pub mod events;
pub mod persist;
pub mod registry;
pub mod store;
pub mod types;

pub use config::RegistryConfig;
pub use error::{DuplicateField, RegistryError};
pub use events::RegistryEvent;
pub use persist::SnapshotStore;
pub use registry::Registry;
pub use store::RegistryStore;
pub use types::{HashVerification, LocatorVerification, PassportRecord, RecordId};
