use std::sync::Arc;

use pkit_catalog::{TransactionFlags, TransactionKind};
use pkit_core::{
    error::PkitError, progress::ProgressState, transaction::run_transaction, PkitResult,
};
use pkit_events::{ExitStatus, OperationId, PkitEvent};
use tracing::debug;

use crate::{context::CatalogGuard, progress::ProgressPoller, PkitContext};

/// Reports the outcome of an operation: an `Error` event on failure, then
/// exactly one `Finished`.
pub fn finish<T>(ctx: &PkitContext, op_id: OperationId, result: PkitResult<T>) -> PkitResult<T> {
    let exit = match &result {
        Ok(_) => ExitStatus::Success,
        Err(err) => {
            ctx.emit(PkitEvent::Error {
                op_id,
                kind: err.kind(),
                message: err.message(),
            });
            ExitStatus::Failed
        }
    };

    debug!(op_id = op_id, exit = ?exit, "operation finished");
    ctx.emit(PkitEvent::Finished {
        op_id,
        exit,
    });
    result
}

/// Runs a whole transaction on a blocking thread while a poller forwards its progress.
///
/// The caller passes the catalog guard it resolved the targets under, so nothing
/// else can touch the catalog between resolving and committing. `before_commit`
/// events are emitted once the transaction is prepared.
pub async fn commit_in_background(
    ctx: &PkitContext,
    op_id: OperationId,
    mut catalog: CatalogGuard,
    kind: TransactionKind,
    flags: TransactionFlags,
    targets: Vec<String>,
    before_commit: Vec<PkitEvent>,
) -> PkitResult<()> {
    let state = Arc::new(ProgressState::new());
    let poller = ProgressPoller::spawn(
        state.clone(),
        ctx.events().clone(),
        op_id,
        ctx.config().progress_interval(),
    );

    let events = ctx.events().clone();
    let progress = state.clone();

    let result = tokio::task::spawn_blocking(move || {
        progress.reset();
        let on_progress = |percent: u8| progress.set(percent);
        run_transaction(
            &mut **catalog,
            kind,
            flags,
            &targets,
            || {
                for event in before_commit {
                    events.emit(event);
                }
            },
            &on_progress,
        )
    })
    .await
    .map_err(|err| PkitError::Internal(format!("transaction task failed: {err}")));

    poller.finish().await;
    state.reset();

    result?
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use pkit_catalog::MemoryCatalog;
    use pkit_config::config::Config;
    use pkit_events::{CollectorSink, EventSinkHandle, PkitEvent};

    use crate::PkitContext;

    pub fn context(catalog: MemoryCatalog) -> (PkitContext, Arc<CollectorSink>) {
        let collector = Arc::new(CollectorSink::default());
        let events: EventSinkHandle = collector.clone();
        let mut config = Config::default_config();
        config.progress_interval = Some(10);
        config.refresh_progress_interval = Some(10);
        (
            PkitContext::new(config, events, Box::new(catalog)),
            collector,
        )
    }

    pub fn errors(collector: &CollectorSink) -> Vec<PkitEvent> {
        collector
            .events()
            .into_iter()
            .filter(|e| matches!(e, PkitEvent::Error { .. }))
            .collect()
    }

    pub fn last_op_id(collector: &CollectorSink) -> u64 {
        collector
            .events()
            .iter()
            .rev()
            .find_map(|e| e.op_id())
            .unwrap_or_default()
    }
}
