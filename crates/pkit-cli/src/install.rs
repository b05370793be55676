use nu_ansi_term::Color::{Blue, Green};
use pkit_core::PkitResult;
use pkit_operations::{install, PkitContext, TransactionReport};
use tracing::{debug, info};

use crate::utils::{split_package_id, Colored};

#[derive(Clone, Copy)]
pub enum InstallMode {
    Install,
    Update,
    File,
}

fn report_done(verb: &str, report: &TransactionReport) {
    let (name, version, repo) = split_package_id(&report.package_id);
    if repo.is_empty() {
        info!("{verb} {}", Colored(Blue, name));
    } else {
        info!(
            "{verb} {}:{} {}",
            Colored(Blue, name),
            Colored(Green, repo),
            version
        );
    }
}

pub async fn install_packages(
    ctx: &PkitContext,
    targets: &[String],
    mode: InstallMode,
) -> PkitResult<()> {
    for target in targets {
        debug!(target = target, "processing install target");
        let (verb, report) = match mode {
            InstallMode::Install => ("Installed", install::install_package(ctx, target).await?),
            InstallMode::Update => ("Updated", install::update_package(ctx, target).await?),
            InstallMode::File => ("Installed", install::install_file(ctx, target).await?),
        };
        report_done(verb, &report);
    }
    Ok(())
}
