use std::sync::mpsc::{self, Receiver, Sender};

use crate::PkitEvent;

/// Trait for consuming events.
///
/// Each frontend provides its own implementation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PkitEvent);
}

/// Channel-based event sink.
///
/// Sends events through a standard mpsc channel. The receiver end
/// can be polled by any consumer (CLI renderer, test harness, etc.).
pub struct ChannelSink {
    sender: Sender<PkitEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<PkitEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PkitEvent) {
        let _ = self.sender.send(event);
    }
}

/// No-op event sink for headless operation.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PkitEvent) {}
}

/// Collector sink that stores all events for inspection.
#[derive(Default)]
pub struct CollectorSink {
    events: std::sync::Mutex<Vec<PkitEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<PkitEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `Finished` events seen for `op_id`.
    pub fn finished_count(&self, op_id: crate::OperationId) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, PkitEvent::Finished { op_id: id, .. } if *id == op_id))
            .count()
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: PkitEvent) {
        self.events.lock().unwrap().push(event);
    }
}
