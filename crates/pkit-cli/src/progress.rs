use std::{
    collections::HashMap,
    sync::{mpsc::Receiver, Arc, LazyLock},
    time::Duration,
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nu_ansi_term::Color::Cyan;
use pkit_events::{ExitStatus, LogLevel, OperationId, PkitEvent, Status};
use tracing::{debug, error, info, warn};

use crate::utils::{progress_enabled, split_package_id};

static MULTI: LazyLock<Arc<MultiProgress>> = LazyLock::new(|| Arc::new(MultiProgress::new()));

/// Pause progress display, run the closure, then resume.
pub fn suspend<F: FnOnce()>(f: F) {
    MULTI.suspend(f);
}

/// Stop and clear all progress bars.
pub fn stop() {
    MULTI.clear().ok();
}

/// Owns the background thread rendering events.
///
/// The [`PkitContext`](pkit_operations::PkitContext) holding the channel sender must
/// be dropped before [`finish`](ProgressGuard::finish), or the join never returns.
pub struct ProgressGuard {
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ProgressGuard {
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

fn percent_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.cyan} {prefix}  {wide_bar:.cyan/dim}  {pos:>3}%  {msg}",
    )
    .unwrap()
    .progress_chars("━━─")
}

fn stage_message(status: Status) -> &'static str {
    match status {
        Status::Query => "querying",
        Status::Setup => "resolving",
        Status::RefreshCache => "refreshing repositories",
        Status::Download => "downloading",
        Status::Install => "installing",
        Status::Remove => "removing",
    }
}

fn create_op_bar() -> ProgressBar {
    let pb = if progress_enabled() {
        MULTI.add(ProgressBar::new(100))
    } else {
        MULTI.add(ProgressBar::hidden())
    };
    pb.set_style(percent_style());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Per-operation rendering state.
#[derive(Default)]
struct Renderer {
    bars: HashMap<OperationId, ProgressBar>,
    errors: HashMap<OperationId, Vec<String>>,
}

impl Renderer {
    fn bar(&mut self, op_id: OperationId) -> &ProgressBar {
        self.bars.entry(op_id).or_insert_with(create_op_bar)
    }

    fn handle(&mut self, event: PkitEvent) {
        match event {
            PkitEvent::Status {
                op_id,
                status,
            } => {
                // Queries finish quickly; a bar would only flicker.
                if status != Status::Query {
                    self.bar(op_id).set_message(stage_message(status));
                }
            }
            PkitEvent::Package {
                op_id,
                info,
                package_id,
                ..
            } => {
                if let Some(pb) = self.bars.get(&op_id) {
                    let (name, version, _) = split_package_id(&package_id);
                    pb.set_prefix(format!("{} {version}", Cyan.paint(name)));
                    debug!("{info} {package_id}");
                }
            }
            PkitEvent::Progress {
                op_id,
                percent,
            } => {
                self.bar(op_id).set_position(u64::from(percent));
            }
            PkitEvent::RepoDetail {
                ..
            } => {}
            PkitEvent::Error {
                op_id,
                kind,
                message,
            } => {
                debug!(op_id = op_id, kind = %kind, "{message}");
                self.errors.entry(op_id).or_default().push(message);
            }
            PkitEvent::Finished {
                op_id,
                exit,
            } => {
                if let Some(pb) = self.bars.remove(&op_id) {
                    pb.finish_and_clear();
                }
                // Errors of a failed operation come back as its return value.
                let errors = self.errors.remove(&op_id).unwrap_or_default();
                if exit == ExitStatus::Success {
                    for message in errors {
                        warn!("{message}");
                    }
                }
            }
            PkitEvent::Log {
                level,
                message,
            } => {
                match level {
                    LogLevel::Debug => debug!("{message}"),
                    LogLevel::Info => info!("{message}"),
                    LogLevel::Warning => warn!("{message}"),
                    LogLevel::Error => error!("{message}"),
                }
            }
        }
    }
}

/// Spawn a background thread that maps [`PkitEvent`]s to indicatif progress bars.
///
/// Each operation gets one bar, created on its first stage or progress event and
/// cleared when the operation finishes.
pub fn spawn_event_handler(receiver: Receiver<PkitEvent>) -> ProgressGuard {
    let handle = std::thread::spawn(move || {
        let mut renderer = Renderer::default();
        while let Ok(event) = receiver.recv() {
            renderer.handle(event);
        }
        for (_, pb) in renderer.bars.drain() {
            pb.finish_and_clear();
        }
    });

    ProgressGuard {
        handle: Some(handle),
    }
}
