mod event;
mod sink;

use std::sync::Arc;

pub use event::*;
pub use sink::*;

/// Unique identifier for a running operation.
pub type OperationId = u64;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.emit(PkitEvent::Log {
            level: LogLevel::Info,
            message: "test".to_string(),
        });
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(PkitEvent::Status {
            op_id: 1,
            status: Status::Download,
        });
        sink.emit(PkitEvent::Progress {
            op_id: 1,
            percent: 40,
        });
        sink.emit(PkitEvent::Finished {
            op_id: 1,
            exit: ExitStatus::Success,
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            PkitEvent::Status {
                status: Status::Download,
                ..
            }
        ));
        assert!(matches!(
            &events[1],
            PkitEvent::Progress {
                percent: 40,
                ..
            }
        ));
        assert!(matches!(&events[2], PkitEvent::Finished { .. }));
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(PkitEvent::Log {
            level: LogLevel::Info,
            message: "orphaned".to_string(),
        });
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.emit(PkitEvent::Package {
            op_id: 3,
            info: PackageInfo::Available,
            package_id: "zsh;5.9;x86_64;core".to_string(),
            summary: "Z shell".to_string(),
        });
        sink.emit(PkitEvent::Error {
            op_id: 3,
            kind: ErrorKind::PackageNotFound,
            message: "zsh".to_string(),
        });
        sink.emit(PkitEvent::Finished {
            op_id: 3,
            exit: ExitStatus::Failed,
        });

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.finished_count(3), 1);
        assert_eq!(sink.finished_count(4), 0);
        let events = sink.events();
        assert_eq!(events[0].op_id(), Some(3));
    }

    #[test]
    fn test_event_sink_handle() {
        let collector = Arc::new(CollectorSink::default());
        let sink: EventSinkHandle = collector.clone();
        sink.emit(PkitEvent::RepoDetail {
            op_id: 42,
            repo_name: "extra".to_string(),
            description: "Extra packages".to_string(),
            enabled: true,
        });
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_event_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullSink>();
        assert_send_sync::<ChannelSink>();
        assert_send_sync::<CollectorSink>();
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Status::RefreshCache.to_string(), "refresh-cache");
        assert_eq!(ErrorKind::PackageNotInstalled.to_string(), "package-not-installed");
        assert_eq!(PackageInfo::Installed.to_string(), "installed");
    }
}
