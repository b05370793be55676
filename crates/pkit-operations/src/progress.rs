use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use pkit_core::progress::ProgressState;
use pkit_events::{EventSinkHandle, OperationId, PkitEvent};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::trace;

/// Generates a unique operation ID.
pub fn next_op_id() -> OperationId {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Periodic reader of a [`ProgressState`], forwarding changes as `Progress` events.
pub struct ProgressPoller {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct Reader {
    state: Arc<ProgressState>,
    events: EventSinkHandle,
    op_id: OperationId,
    last: Option<u8>,
}

impl Reader {
    fn read(&mut self) {
        let Some(percent) = self.state.get() else {
            return;
        };
        if self.last == Some(percent) {
            return;
        }

        trace!(op_id = self.op_id, percent = percent, "progress");
        self.last = Some(percent);
        self.events.emit(PkitEvent::Progress {
            op_id: self.op_id,
            percent,
        });
    }
}

impl ProgressPoller {
    /// Starts polling `state` every `interval`.
    pub fn spawn(
        state: Arc<ProgressState>,
        events: EventSinkHandle,
        op_id: OperationId,
        interval: Duration,
    ) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let mut reader = Reader {
            state,
            events,
            op_id,
            last: None,
        };

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stopped => {
                        reader.read();
                        break;
                    }
                    _ = ticker.tick() => reader.read(),
                }
            }
        });

        Self {
            stop,
            task,
        }
    }

    /// Stops the poller after one final read.
    pub async fn finish(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use pkit_events::CollectorSink;

    use super::*;

    fn percents(collector: &CollectorSink) -> Vec<u8> {
        collector
            .events()
            .into_iter()
            .filter_map(|e| {
                match e {
                    PkitEvent::Progress { percent, .. } => Some(percent),
                    _ => None,
                }
            })
            .collect()
    }

    #[test]
    fn test_next_op_id_is_unique() {
        let id1 = next_op_id();
        let id2 = next_op_id();
        assert_ne!(id1, id2);
    }

    #[tokio::test]
    async fn test_final_read_on_finish() {
        let collector = Arc::new(CollectorSink::default());
        let state = Arc::new(ProgressState::new());
        let poller = ProgressPoller::spawn(
            state.clone(),
            collector.clone(),
            1,
            Duration::from_secs(3600),
        );

        state.set(100);
        poller.finish().await;

        assert_eq!(percents(&collector).last(), Some(&100));
    }

    #[tokio::test]
    async fn test_no_data_and_repeats_are_skipped() {
        let collector = Arc::new(CollectorSink::default());
        let state = Arc::new(ProgressState::new());
        let poller = ProgressPoller::spawn(
            state.clone(),
            collector.clone(),
            2,
            Duration::from_millis(5),
        );

        time::sleep(Duration::from_millis(30)).await;
        state.set(40);
        time::sleep(Duration::from_millis(30)).await;
        state.reset();
        time::sleep(Duration::from_millis(30)).await;
        state.set(40);
        state.set(90);
        poller.finish().await;

        assert_eq!(percents(&collector), vec![40, 90]);
    }
}
