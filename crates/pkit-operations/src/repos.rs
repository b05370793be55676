use pkit_core::{error::PkitError, filter::supported_filters, PkitResult};
use pkit_events::PkitEvent;
use tracing::debug;

use crate::{progress::next_op_id, utils::finish, PkitContext, RepoInfo};

/// List the configured remote repositories, disabled ones included.
pub async fn get_repo_list(ctx: &PkitContext) -> PkitResult<Vec<RepoInfo>> {
    let op_id = next_op_id();
    debug!(op_id = op_id, "listing repositories");

    let result = async {
        let details = {
            let catalog = ctx.catalog().await;
            catalog.repository_details()
        };

        let repos: Vec<RepoInfo> = details
            .into_iter()
            .map(|(repo, description, enabled)| {
                ctx.emit(PkitEvent::RepoDetail {
                    op_id,
                    repo_name: repo.name.clone(),
                    description: description.clone(),
                    enabled,
                });
                RepoInfo {
                    name: repo.name,
                    description,
                    enabled,
                }
            })
            .collect();

        Ok::<_, PkitError>(repos)
    }
    .await;

    finish(ctx, op_id, result)
}

/// Filters understood by [`crate::search::search_name`].
pub fn get_filters(ctx: &PkitContext) -> PkitResult<Vec<String>> {
    let op_id = next_op_id();
    let filters = supported_filters().iter().map(|f| f.to_string()).collect();
    finish(ctx, op_id, Ok(filters))
}

/// Package groups known to the catalog. Package lists carry no group data, so
/// this is always empty.
pub fn get_groups(ctx: &PkitContext) -> PkitResult<Vec<String>> {
    let op_id = next_op_id();
    debug!(op_id = op_id, "listing groups");
    finish(ctx, op_id, Ok(Vec::new()))
}

#[cfg(test)]
mod tests {
    use pkit_catalog::{MemoryCatalog, PackageRecord};

    use super::*;
    use crate::utils::test_support::*;

    #[tokio::test]
    async fn test_repo_list_emits_details() {
        let cat = MemoryCatalog::new()
            .with_remote("core", [PackageRecord::new("foo", "1.0")])
            .with_remote("extra", Vec::new());
        let (ctx, collector) = context(cat);

        let repos = get_repo_list(&ctx).await.unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["core", "extra"]);
        assert!(repos.iter().all(|r| r.enabled));

        let details = collector
            .events()
            .iter()
            .filter(|e| matches!(e, PkitEvent::RepoDetail { .. }))
            .count();
        assert_eq!(details, 2);
        assert_eq!(collector.finished_count(last_op_id(&collector)), 1);
    }

    #[test]
    fn test_filters() {
        let (ctx, collector) = context(MemoryCatalog::new());
        assert_eq!(get_filters(&ctx).unwrap(), vec!["installed"]);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_groups_are_empty() {
        let (ctx, collector) = context(MemoryCatalog::new());
        assert!(get_groups(&ctx).unwrap().is_empty());
        assert_eq!(collector.finished_count(last_op_id(&collector)), 1);
    }
}
