//! Append-only audit trail of registry notifications.

use crate::error::MirrorError;
use crate::sink::{EventSink, SequencedEvent};
use async_trait::async_trait;
use passport_registry::RecordId;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory audit trail. Events are appended in receive order and never
/// removed, mirroring the registry's own append-only discipline.
#[derive(Default)]
pub struct AuditLog {
    records: RwLock<Vec<SequencedEvent>>,
}

impl AuditLog {
    /// Create an empty audit log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the trail is still empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All recorded events, in receive order.
    pub async fn records(&self) -> Vec<SequencedEvent> {
        self.records.read().await.clone()
    }

    /// The trail restricted to one passport record.
    pub async fn record_history(&self, id: RecordId) -> Vec<SequencedEvent> {
        self.records
            .read()
            .await
            .iter()
            .filter(|e| e.event.record_id() == Some(id))
            .cloned()
            .collect()
    }

    /// Export the whole trail as JSON, for handing to durable storage.
    pub async fn export_json(&self) -> Result<String, MirrorError> {
        let records = self.records.read().await;
        Ok(serde_json::to_string(&*records)?)
    }
}

#[async_trait]
impl EventSink for AuditLog {
    fn name(&self) -> &str {
        "audit-log"
    }

    async fn apply(&self, event: &SequencedEvent) -> Result<(), MirrorError> {
        let mut records = self.records.write().await;
        records.push(event.clone());
        debug!(seq = event.seq, "Audit log appended");
        Ok(())
    }
}
