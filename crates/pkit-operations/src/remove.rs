use pkit_catalog::{TransactionFlags, TransactionKind};
use pkit_core::{
    error::PkitError, package_id::PackageId, transaction::resolve_removal, PkitResult,
};
use pkit_events::{PackageInfo, PkitEvent, Status};
use tracing::{debug, info};

use crate::{
    progress::next_op_id,
    utils::{commit_in_background, finish},
    PkitContext, TransactionReport,
};

/// Remove an installed package.
///
/// With `allow_deps`, installed packages depending on the target are removed
/// too. `autoremove` is accepted but has no effect.
pub async fn remove_package(
    ctx: &PkitContext,
    package_id: &str,
    allow_deps: bool,
    autoremove: bool,
) -> PkitResult<TransactionReport> {
    let op_id = next_op_id();
    debug!(
        op_id = op_id,
        package_id = package_id,
        allow_deps = allow_deps,
        "removing package"
    );

    let result = async {
        ctx.status(op_id, Status::Setup);
        let id: PackageId = package_id.parse()?;
        if autoremove {
            debug!("autoremove is not supported, ignoring");
        }

        let catalog = ctx.catalog().await;
        let record = resolve_removal(&**catalog, &id.name)?;
        let report = TransactionReport {
            package_id: PackageId::from_record(&record, &record.repo).to_string(),
            summary: record.description.clone(),
        };

        let before_commit = vec![
            PkitEvent::Status {
                op_id,
                status: Status::Remove,
            },
            PkitEvent::Package {
                op_id,
                info: PackageInfo::Removing,
                package_id: report.package_id.clone(),
                summary: report.summary.clone(),
            },
        ];

        commit_in_background(
            ctx,
            op_id,
            catalog,
            TransactionKind::Remove,
            TransactionFlags::cascade(allow_deps),
            vec![record.name.clone()],
            before_commit,
        )
        .await?;

        info!("removed {}", report.package_id);
        Ok::<_, PkitError>(report)
    }
    .await;

    finish(ctx, op_id, result)
}

#[cfg(test)]
mod tests {
    use pkit_catalog::{FailStage, MemoryCatalog, PackageRecord};
    use pkit_events::{ErrorKind, ExitStatus};

    use super::*;
    use crate::utils::test_support::*;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new().with_local([
            PackageRecord::new("libfoo", "1.0").with_description("Foo library"),
            PackageRecord::new("foo", "1.0").with_depends(["libfoo"]),
            PackageRecord::new("bar", "0.3"),
        ])
    }

    async fn installed_names(ctx: &PkitContext) -> Vec<String> {
        let catalog = ctx.catalog().await;
        let local = catalog.local_repository().unwrap();
        catalog
            .search(&local, "")
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_remove_package() {
        let cat = catalog();
        let stats = cat.stats();
        let (ctx, collector) = context(cat);

        let report = remove_package(&ctx, "bar;0.3;;local", false, false)
            .await
            .unwrap();
        assert_eq!(report.package_id, "bar;0.3;;local");
        assert_eq!(installed_names(&ctx).await, vec!["foo", "libfoo"]);
        assert_eq!(stats.releases(), 1);

        let events = collector.events();
        assert!(events.iter().any(|e| matches!(
            e,
            PkitEvent::Package {
                info: PackageInfo::Removing,
                ..
            }
        )));
        assert!(matches!(
            events.last(),
            Some(PkitEvent::Finished {
                exit: ExitStatus::Success,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_remove_not_installed_opens_no_transaction() {
        let cat = catalog();
        let stats = cat.stats();
        let (ctx, collector) = context(cat);

        let err = remove_package(&ctx, "baz", false, false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PackageNotInstalled);
        assert_eq!(stats.begins(), 0);
        assert_eq!(stats.releases(), 0);
        assert_eq!(installed_names(&ctx).await.len(), 3);
        assert_eq!(errors(&collector).len(), 1);
        assert_eq!(collector.finished_count(last_op_id(&collector)), 1);
    }

    #[tokio::test]
    async fn test_remove_blocked_by_dependents() {
        let (ctx, _collector) = context(catalog());

        let err = remove_package(&ctx, "libfoo", false, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionError);
        assert_eq!(installed_names(&ctx).await.len(), 3);
    }

    #[tokio::test]
    async fn test_remove_with_dependents_allowed() {
        let (ctx, _collector) = context(catalog());

        remove_package(&ctx, "libfoo", true, true).await.unwrap();
        assert_eq!(installed_names(&ctx).await, vec!["bar"]);
    }

    #[tokio::test]
    async fn test_concurrent_removals_of_same_package() {
        let cat = catalog();
        let stats = cat.stats();
        let (ctx, _collector) = context(cat);

        let (first, second) = tokio::join!(
            remove_package(&ctx, "bar", false, false),
            remove_package(&ctx, "bar", false, false),
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().kind(), ErrorKind::PackageNotInstalled);
        assert_eq!(stats.begins(), 1);
        assert_eq!(stats.releases(), 1);
    }

    #[tokio::test]
    async fn test_release_failure_is_failed_finalise() {
        let cat = catalog().fail_at(FailStage::Release);
        let stats = cat.stats();
        let (ctx, collector) = context(cat);

        let err = remove_package(&ctx, "bar", false, false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FailedFinalise);
        assert_eq!(stats.releases(), 1);
        assert_eq!(errors(&collector).len(), 1);
    }
}
