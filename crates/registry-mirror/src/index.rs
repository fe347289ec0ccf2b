//! Product search index rebuilt from registry notifications.

use crate::error::MirrorError;
use crate::sink::{EventSink, SequencedEvent};
use async_trait::async_trait;
use passport_registry::{RecordId, RegistryEvent};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct IndexState {
    /// Product id -> record id (registrations only; product ids are
    /// immutable, so an entry never moves)
    products: HashMap<String, RecordId>,

    /// Records not yet deactivated
    active: HashSet<RecordId>,
}

/// Derived product lookup for UIs and search, maintained purely from the
/// event stream. It holds no authority: the registry remains the source of
/// truth and this state converges to it as events are applied.
#[derive(Default)]
pub struct ProductIndex {
    state: RwLock<IndexState>,
}

impl ProductIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record id registered under `product_id`, if any.
    pub async fn lookup(&self, product_id: &str) -> Option<RecordId> {
        self.state.read().await.products.get(product_id).copied()
    }

    /// Whether a record has been seen and not yet deactivated.
    pub async fn is_active(&self, id: RecordId) -> bool {
        self.state.read().await.active.contains(&id)
    }

    /// Number of products indexed.
    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    /// Number of active records.
    pub async fn active_count(&self) -> usize {
        self.state.read().await.active.len()
    }
}

#[async_trait]
impl EventSink for ProductIndex {
    fn name(&self) -> &str {
        "product-index"
    }

    async fn apply(&self, event: &SequencedEvent) -> Result<(), MirrorError> {
        let mut state = self.state.write().await;
        match &event.event {
            RegistryEvent::Registered { id, product_id, .. } => {
                state.products.insert(product_id.clone(), *id);
                state.active.insert(*id);
            }
            RegistryEvent::Deactivated { id } => {
                state.active.remove(id);
            }
            // Updates change content keys only; issuer changes carry no
            // product information
            RegistryEvent::Updated { .. }
            | RegistryEvent::IssuerAuthorized { .. }
            | RegistryEvent::IssuerRevoked { .. } => {}
        }
        Ok(())
    }
}
