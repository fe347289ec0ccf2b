//! Async facade over the registry state machine.
//!
//! `RegistryStore` serializes every mutating operation through one write
//! lock: the full precondition chain, the structural mutation and the
//! snapshot write all happen under the same guard, so no observer can see
//! a half-written entry or two indices disagreeing mid-update. The change
//! notification is queued on a broadcast channel before the guard is
//! dropped, which keeps event order identical to commit order, while
//! subscribers only ever receive events on their own tasks — a consumer
//! cannot re-enter a mutating operation from inside the critical section.

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::persist::SnapshotStore;
use crate::registry::Registry;
use crate::types::{HashVerification, LocatorVerification, PassportRecord, RecordId};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, instrument, warn};

/// Default broadcast capacity when not configured.
const DEFAULT_EVENT_BUFFER: usize = 256;

/// Single-writer passport registry with durable snapshots and ordered
/// change notifications.
pub struct RegistryStore {
    inner: RwLock<Registry>,
    snapshots: SnapshotStore,
    events: broadcast::Sender<RegistryEvent>,
}

impl RegistryStore {
    /// Open a registry store, loading the latest snapshot if one exists.
    ///
    /// A loaded snapshot is authoritative: if its owner differs from
    /// `owner`, the snapshot's owner wins and a warning is logged, because
    /// rewriting the owner of an existing registry would forge its history.
    pub async fn open(
        snapshots: SnapshotStore,
        owner: &str,
        event_buffer: usize,
    ) -> Result<Arc<Self>, RegistryError> {
        let registry = match snapshots.load().await? {
            Some(registry) => {
                if registry.owner() != owner {
                    warn!(
                        snapshot_owner = registry.owner(),
                        configured_owner = owner,
                        "Configured owner ignored in favor of snapshot owner"
                    );
                }
                info!("Loaded registry with {} passports", registry.count());
                registry
            }
            None => Registry::new(owner)?,
        };

        let (events, _) = broadcast::channel(event_buffer.max(1));
        Ok(Arc::new(Self {
            inner: RwLock::new(registry),
            snapshots,
            events,
        }))
    }

    /// Open a store from configuration.
    pub async fn from_config(config: &RegistryConfig) -> Result<Arc<Self>, RegistryError> {
        let snapshots = if config.storage.persist {
            SnapshotStore::file(config.storage.path.clone())
        } else {
            info!("Persistence disabled, registry is in-memory only");
            SnapshotStore::memory()
        };
        Self::open(snapshots, &config.owner, config.events.buffer).await
    }

    /// Ephemeral store, mostly for tests.
    pub async fn in_memory(owner: &str) -> Result<Arc<Self>, RegistryError> {
        Self::open(SnapshotStore::memory(), owner, DEFAULT_EVENT_BUFFER).await
    }

    /// Subscribe to change notifications, one per successful mutation in
    /// commit order. A receiver that falls more than the configured buffer
    /// behind observes a `Lagged` gap.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: RegistryEvent) {
        // No subscribers is fine; the event is simply dropped.
        if self.events.send(event).is_err() {
            debug!("No notification subscribers");
        }
    }

    /// Register a new passport. See [`Registry::register`] for the
    /// precondition chain.
    #[instrument(skip(self, supplier_info))]
    pub async fn register(
        &self,
        caller: &str,
        locator: &str,
        integrity_hash: &str,
        product_id: &str,
        supplier_info: &str,
    ) -> Result<RecordId, RegistryError> {
        let mut registry = self.inner.write().await;
        let id = registry.register(caller, locator, integrity_hash, product_id, supplier_info)?;
        self.snapshots.save(&registry).await?;
        self.publish(RegistryEvent::Registered {
            id,
            locator: locator.into(),
            integrity_hash: integrity_hash.into(),
            issuer: caller.into(),
            product_id: product_id.into(),
        });
        info!(id, product_id, "Passport registered");
        Ok(id)
    }

    /// Replace a passport's content locator and integrity hash.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        caller: &str,
        id: RecordId,
        locator: &str,
        integrity_hash: &str,
    ) -> Result<(), RegistryError> {
        let mut registry = self.inner.write().await;
        registry.update(caller, id, locator, integrity_hash)?;
        self.snapshots.save(&registry).await?;
        self.publish(RegistryEvent::Updated {
            id,
            locator: locator.into(),
            integrity_hash: integrity_hash.into(),
        });
        info!(id, "Passport content updated");
        Ok(())
    }

    /// Deactivate a passport. Its keys stay reserved forever.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, caller: &str, id: RecordId) -> Result<(), RegistryError> {
        let mut registry = self.inner.write().await;
        registry.deactivate(caller, id)?;
        self.snapshots.save(&registry).await?;
        self.publish(RegistryEvent::Deactivated { id });
        info!(id, "Passport deactivated");
        Ok(())
    }

    /// Add a principal to the issuer allow-list. Owner-only; idempotent.
    #[instrument(skip(self))]
    pub async fn authorize_issuer(
        &self,
        caller: &str,
        principal: &str,
    ) -> Result<(), RegistryError> {
        let mut registry = self.inner.write().await;
        registry.authorize_issuer(caller, principal)?;
        self.snapshots.save(&registry).await?;
        self.publish(RegistryEvent::IssuerAuthorized {
            principal: principal.into(),
        });
        info!(principal, "Issuer authorized");
        Ok(())
    }

    /// Remove a principal from the issuer allow-list. Owner-only;
    /// idempotent; the owner itself can never be revoked.
    #[instrument(skip(self))]
    pub async fn revoke_issuer(&self, caller: &str, principal: &str) -> Result<(), RegistryError> {
        let mut registry = self.inner.write().await;
        registry.revoke_issuer(caller, principal)?;
        self.snapshots.save(&registry).await?;
        self.publish(RegistryEvent::IssuerRevoked {
            principal: principal.into(),
        });
        info!(principal, "Issuer revoked");
        Ok(())
    }

    /// Get a passport snapshot by id.
    pub async fn get(&self, id: RecordId) -> Result<PassportRecord, RegistryError> {
        let registry = self.inner.read().await;
        registry.get(id).cloned()
    }

    /// Get a passport snapshot by product id.
    pub async fn get_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<PassportRecord, RegistryError> {
        let registry = self.inner.read().await;
        registry.get_by_product_id(product_id).cloned()
    }

    /// Total passports ever registered.
    pub async fn count(&self) -> u64 {
        self.inner.read().await.count()
    }

    /// Verify an integrity hash against committed state. Public; never
    /// fails.
    pub async fn verify_by_hash(&self, integrity_hash: &str) -> HashVerification {
        self.inner.read().await.verify_by_hash(integrity_hash)
    }

    /// Verify a content locator against committed state. Public; never
    /// fails.
    pub async fn verify_by_locator(&self, locator: &str) -> LocatorVerification {
        self.inner.read().await.verify_by_locator(locator)
    }

    /// True iff `principal` may register passports.
    pub async fn is_authorized(&self, principal: &str) -> bool {
        self.inner.read().await.is_authorized(principal)
    }

    /// The owner principal.
    pub async fn owner(&self) -> String {
        self.inner.read().await.owner().to_string()
    }
}
