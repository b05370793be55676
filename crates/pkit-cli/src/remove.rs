use nu_ansi_term::Color::Red;
use pkit_core::PkitResult;
use pkit_operations::{remove, PkitContext};
use tracing::info;

use crate::utils::{split_package_id, Colored};

pub async fn remove_packages(
    ctx: &PkitContext,
    packages: &[String],
    allow_deps: bool,
    autoremove: bool,
) -> PkitResult<()> {
    for package in packages {
        let report = remove::remove_package(ctx, package, allow_deps, autoremove).await?;
        let (name, version, _) = split_package_id(&report.package_id);
        info!("Removed {} {}", Colored(Red, name), version);
    }
    Ok(())
}
