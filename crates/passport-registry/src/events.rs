//! Change notifications emitted by the registry.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};

/// One notification record per successful mutating operation, broadcast in
/// commit order. Subscribers (search indexes, audit trails, UI caches) see
/// exactly one event per mutation and none for failed calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A new passport was registered.
    Registered {
        id: RecordId,
        locator: String,
        integrity_hash: String,
        issuer: String,
        product_id: String,
    },

    /// A passport's content locator and integrity hash were replaced.
    Updated {
        id: RecordId,
        locator: String,
        integrity_hash: String,
    },

    /// A passport was deactivated. Its keys stay reserved.
    Deactivated { id: RecordId },

    /// A principal was added to the issuer allow-list.
    IssuerAuthorized { principal: String },

    /// A principal was removed from the issuer allow-list.
    IssuerRevoked { principal: String },
}

impl RegistryEvent {
    /// Record id the event concerns, if it concerns one.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            RegistryEvent::Registered { id, .. }
            | RegistryEvent::Updated { id, .. }
            | RegistryEvent::Deactivated { id } => Some(*id),
            RegistryEvent::IssuerAuthorized { .. } | RegistryEvent::IssuerRevoked { .. } => None,
        }
    }
}
