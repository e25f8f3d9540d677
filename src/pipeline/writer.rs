use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::RumError;
use crate::events::RumEvent;

/// Hand-off point to the storage/upload collaborator.
/// Called at most once per terminal event; must never block the scope tree.
pub trait EventWriter: Send + Sync {
    fn write(&self, event: RumEvent);
}

/// Fire-and-forget writer backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelWriter {
    tx: mpsc::UnboundedSender<RumEvent>,
}

impl ChannelWriter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RumEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventWriter for ChannelWriter {
    fn write(&self, event: RumEvent) {
        if self.tx.send(event).is_err() {
            warn!("Event channel closed, dropping event");
        }
    }
}

/// Keeps every written event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    events: Arc<Mutex<Vec<RumEvent>>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RumEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl EventWriter for RecordingWriter {
    fn write(&self, event: RumEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Durable storage owned by the upload subsystem.
pub trait EventStore: Send {
    fn store(&mut self, event: RumEvent) -> Result<(), RumError>;
}

/// Drains a `ChannelWriter` receiver into `store` until every writer is dropped.
/// Returns the number of stored events.
pub async fn drain_to_store<S: EventStore>(mut rx: mpsc::UnboundedReceiver<RumEvent>, mut store: S) -> usize {
    let mut stored = 0;
    while let Some(event) = rx.recv().await {
        let kind = event.kind();
        match store.store(event) {
            Ok(()) => stored += 1,
            Err(e) => warn!("Failed to store {:?} event: {}", kind, e),
        }
    }
    debug!("Event channel drained, {} events stored", stored);
    stored
}
