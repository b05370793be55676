use pkit_catalog::{Catalog, PackageRef, TransactionFlags, TransactionKind};
use pkit_core::{error::PkitError, package_id::PackageId, PkitResult};
use pkit_events::{PackageInfo, PkitEvent, Status};
use tracing::{debug, info};

use crate::{
    progress::next_op_id,
    utils::{commit_in_background, finish},
    PkitContext, TransactionReport,
};

/// The record a sync install of `id` would pick: the first remote repository
/// offering the name wins.
fn find_available(catalog: &dyn Catalog, id: &PackageId) -> PkitResult<PackageRef> {
    for repo in catalog.remote_repositories() {
        let matches = catalog.search(&repo, &id.name).map_err(|source| {
            PkitError::RepositoryLoad {
                repo: repo.name.clone(),
                source,
            }
        })?;
        if let Some(record) = matches.into_iter().find(|r| r.name == id.name) {
            return Ok(record);
        }
    }

    Err(PkitError::PackageNotFound(id.name.clone()))
}

fn sync_flags(ctx: &PkitContext) -> TransactionFlags {
    if ctx.config().skip_sync_dependencies() {
        TransactionFlags::no_deps()
    } else {
        TransactionFlags::default()
    }
}

async fn sync_package(
    ctx: &PkitContext,
    package_id: &str,
    kind: TransactionKind,
) -> PkitResult<TransactionReport> {
    let op_id = next_op_id();
    debug!(op_id = op_id, package_id = package_id, %kind, "sync transaction");

    let result = async {
        ctx.status(op_id, Status::Setup);
        let id: PackageId = package_id.parse()?;

        let catalog = ctx.catalog().await;
        let record = find_available(&**catalog, &id)?;
        let report = TransactionReport {
            package_id: PackageId::from_record(&record, &record.repo).to_string(),
            summary: record.description.clone(),
        };

        let before_commit = vec![
            PkitEvent::Status {
                op_id,
                status: Status::Download,
            },
            PkitEvent::Package {
                op_id,
                info: PackageInfo::Downloading,
                package_id: report.package_id.clone(),
                summary: report.summary.clone(),
            },
            PkitEvent::Status {
                op_id,
                status: Status::Install,
            },
        ];

        commit_in_background(
            ctx,
            op_id,
            catalog,
            kind,
            sync_flags(ctx),
            vec![id.name.clone()],
            before_commit,
        )
        .await?;

        info!("{} {}", kind, report.package_id);
        Ok::<_, PkitError>(report)
    }
    .await;

    finish(ctx, op_id, result)
}

/// Install a package from the remote repositories.
pub async fn install_package(ctx: &PkitContext, package_id: &str) -> PkitResult<TransactionReport> {
    sync_package(ctx, package_id, TransactionKind::SyncInstall).await
}

/// Upgrade an installed package to the version offered by the remote repositories.
pub async fn update_package(ctx: &PkitContext, package_id: &str) -> PkitResult<TransactionReport> {
    sync_package(ctx, package_id, TransactionKind::SyncUpgrade).await
}

/// Install a package from a local package file.
pub async fn install_file(ctx: &PkitContext, path: &str) -> PkitResult<TransactionReport> {
    let op_id = next_op_id();
    debug!(op_id = op_id, path = path, "file install");

    let result = async {
        ctx.status(op_id, Status::Setup);
        let report = TransactionReport {
            package_id: path.to_string(),
            summary: String::new(),
        };

        let before_commit = vec![
            PkitEvent::Status {
                op_id,
                status: Status::Install,
            },
            PkitEvent::Package {
                op_id,
                info: PackageInfo::Installing,
                package_id: report.package_id.clone(),
                summary: report.summary.clone(),
            },
        ];

        let catalog = ctx.catalog().await;
        commit_in_background(
            ctx,
            op_id,
            catalog,
            TransactionKind::FileInstall,
            TransactionFlags::default(),
            vec![path.to_string()],
            before_commit,
        )
        .await?;

        Ok::<_, PkitError>(report)
    }
    .await;

    finish(ctx, op_id, result)
}
