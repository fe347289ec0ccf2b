//! Fan-out of registry notifications to attached sinks.

use crate::sink::{EventSink, SequencedEvent};
use chrono::Utc;
use passport_registry::RegistryEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Consumes a registry notification stream and applies each event to every
/// attached sink, in receive order. Runs until the registry drops its
/// notification channel.
#[derive(Default)]
pub struct Mirror {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Mirror {
    /// Create a mirror with no sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink. Sinks receive events in attachment order.
    pub fn attach(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Consume the notification stream until the channel closes.
    ///
    /// A lagged receiver (the registry outran the broadcast buffer) is
    /// logged as a gap; sinks built from a gapped stream should be rebuilt
    /// from a registry snapshot rather than trusted.
    pub async fn run(self, receiver: broadcast::Receiver<RegistryEvent>) {
        let mut seq = 0u64;
        let mut stream = BroadcastStream::new(receiver);

        info!(sinks = self.sinks.len(), "Mirror started");

        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    seq += 1;
                    let event = SequencedEvent {
                        seq,
                        received_at: Utc::now(),
                        event,
                    };
                    for sink in &self.sinks {
                        if let Err(e) = sink.apply(&event).await {
                            error!(sink = sink.name(), seq, "Sink failed to apply event: {}", e);
                        }
                    }
                    debug!(seq, "Event mirrored");
                }
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    warn!(missed, "Mirror lagged behind registry notifications");
                }
            }
        }

        info!(events = seq, "Notification channel closed, mirror stopped");
    }

    /// Spawn [`Mirror::run`] on its own task.
    pub fn spawn(self, receiver: broadcast::Receiver<RegistryEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::error::MirrorError;
    use async_trait::async_trait;

    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn apply(&self, event: &SequencedEvent) -> Result<(), MirrorError> {
            Err(MirrorError::Sink {
                sink: "failing".into(),
                reason: format!("rejected seq {}", event.seq),
            })
        }
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_the_mirror() {
        let audit = Arc::new(AuditLog::new());
        let mirror = Mirror::new()
            .attach(Arc::new(FailingSink))
            .attach(audit.clone());

        let (tx, rx) = broadcast::channel(8);
        let handle = mirror.spawn(rx);

        tx.send(RegistryEvent::Deactivated { id: 1 }).unwrap();
        tx.send(RegistryEvent::Deactivated { id: 2 }).unwrap();
        drop(tx);
        handle.await.unwrap();

        // The healthy sink saw both events despite the failing one
        let records = audit.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, 1);
        assert_eq!(records[1].seq, 2);
    }

    #[tokio::test]
    async fn test_mirror_stops_when_channel_closes() {
        let mirror = Mirror::new().attach(Arc::new(AuditLog::new()));
        let (tx, rx) = broadcast::channel::<RegistryEvent>(8);
        let handle = mirror.spawn(rx);

        drop(tx);
        handle.await.unwrap();
    }
}
