use std::sync::Arc;

use pkit_core::{error::PkitError, progress::ProgressState, PkitResult};
use pkit_events::Status;
use tracing::{debug, info};

use crate::{
    progress::{next_op_id, ProgressPoller},
    utils::finish,
    PkitContext, RefreshReport,
};

/// Overall percentage while refreshing repository `idx` of `total`.
fn overall_percent(idx: usize, total: usize, percent: u8) -> u8 {
    let done = idx * 100 + usize::from(percent.min(100));
    (done / total.max(1)) as u8
}

/// Refresh the package lists of every enabled remote repository.
///
/// Unless `force` is set, repositories whose list is already current are left alone.
pub async fn refresh_cache(ctx: &PkitContext, force: bool) -> PkitResult<RefreshReport> {
    let op_id = next_op_id();
    debug!(op_id = op_id, force = force, "refreshing repositories");

    let result = async {
        ctx.status(op_id, Status::RefreshCache);

        let state = Arc::new(ProgressState::new());
        let poller = ProgressPoller::spawn(
            state.clone(),
            ctx.events().clone(),
            op_id,
            ctx.config().refresh_progress_interval(),
        );

        let mut catalog = ctx.catalog().await;
        let progress = state.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let repos = catalog.remote_repositories();
            let total = repos.len();
            let mut refreshed = Vec::with_capacity(total);

            for (idx, repo) in repos.iter().enumerate() {
                progress.reset();
                let on_progress = |percent: u8| progress.set(overall_percent(idx, total, percent));
                catalog
                    .refresh_repository(repo, force, &on_progress)
                    .map_err(|source| {
                        PkitError::RepositoryLoad {
                            repo: repo.name.clone(),
                            source,
                        }
                    })?;
                debug!(repo = %repo.name, "repository refreshed");
                refreshed.push(repo.name.clone());
            }
            progress.reset();

            Ok::<_, PkitError>(refreshed)
        })
        .await
        .map_err(|err| PkitError::Internal(format!("refresh task failed: {err}")));

        poller.finish().await;
        state.reset();

        let refreshed = outcome??;
        info!("Refreshed {} repositories", refreshed.len());
        Ok::<_, PkitError>(RefreshReport {
            refreshed,
        })
    }
    .await;

    finish(ctx, op_id, result)
}
