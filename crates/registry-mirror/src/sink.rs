//! Event sink trait and the sequenced event wrapper.

use crate::error::MirrorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use passport_registry::RegistryEvent;
use serde::{Deserialize, Serialize};

/// A registry notification with mirror-side bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequencedEvent {
    /// Position in the mirror's receive order, starting at 1
    pub seq: u64,

    /// When the mirror received the notification
    pub received_at: DateTime<Utc>,

    /// The registry notification itself
    pub event: RegistryEvent,
}

/// A consumer of registry notifications.
///
/// Sinks are applied in receive order, one event at a time; a sink that
/// fails an event is logged and skipped for that event, never retried.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Sink name, for logging.
    fn name(&self) -> &str;

    /// Apply one notification.
    async fn apply(&self, event: &SequencedEvent) -> Result<(), MirrorError>;
}
