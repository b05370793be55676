use pkit_core::{error::PkitError, filter::FilterSet, query, PkitResult};
use pkit_events::{ErrorKind, PackageInfo, PkitEvent, Status};
use tracing::{debug, trace};

use crate::{
    progress::next_op_id, utils::finish, PkitContext, SearchEntry, SearchReport,
};

/// Search installed and available packages by name.
///
/// `filter` is a `;`-separated filter list such as `installed` or `~installed`.
pub async fn search_name(ctx: &PkitContext, filter: &str, term: &str) -> PkitResult<SearchReport> {
    let op_id = next_op_id();
    debug!(op_id = op_id, filter = filter, term = term, "searching packages");

    let result = async {
        ctx.status(op_id, Status::Query);
        let filter = FilterSet::parse(filter);

        let found = {
            let catalog = ctx.catalog().await;
            query::search_name(&**catalog, filter, term)?
        };

        for warning in &found.warnings {
            ctx.emit(PkitEvent::Error {
                op_id,
                kind: ErrorKind::InternalError,
                message: warning.message(),
            });
        }

        let total_count = found.packages.len();
        let limit = ctx.config().search_limit.unwrap_or(usize::MAX);
        trace!(limit = limit, total = total_count, "applying search limit");

        let packages: Vec<SearchEntry> = found
            .packages
            .iter()
            .take(limit)
            .map(|pkg| {
                let entry = SearchEntry {
                    package_id: pkg.package_id().to_string(),
                    installed: pkg.installed,
                    summary: pkg.summary().to_string(),
                };
                ctx.emit(PkitEvent::Package {
                    op_id,
                    info: if pkg.installed {
                        PackageInfo::Installed
                    } else {
                        PackageInfo::Available
                    },
                    package_id: entry.package_id.clone(),
                    summary: entry.summary.clone(),
                });
                entry
            })
            .collect();

        Ok::<_, PkitError>(SearchReport {
            packages,
            total_count,
        })
    }
    .await;

    finish(ctx, op_id, result)
}
