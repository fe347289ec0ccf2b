//! Notification consumers for the passport registry.
//!
//! The registry broadcasts one ordered change notification per successful
//! mutation; this crate is the subscriber side. [`Mirror`] fans the stream
//! out to [`EventSink`]s — an append-only [`AuditLog`] and a derived
//! [`ProductIndex`] ship here, and external systems (search, UI caches)
//! implement the same trait. The registry itself knows nothing about any
//! of this beyond owning the broadcast channel.

mod audit;
mod error;
mod index;
mod mirror;
mod sink;

pub use audit::AuditLog;
pub use error::MirrorError;
pub use index::ProductIndex;
pub use mirror::Mirror;
pub use sink::{EventSink, SequencedEvent};
