use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed, Red};
use pkit_core::PkitResult;
use pkit_operations::{repos, search, PkitContext, SearchReport};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tracing::{debug, info};

use crate::utils::{split_package_id, Colored, Icons};

fn summary_table(report: &SearchReport) -> String {
    let installed = report.packages.iter().filter(|p| p.installed).count();
    let available = report.packages.len() - installed;

    let mut builder = Builder::new();
    builder.push_record([
        format!("{} Found", Icons::PACKAGE),
        format!(
            "{} (showing {})",
            Colored(Cyan, report.total_count),
            Colored(Green, report.packages.len())
        ),
    ]);
    builder.push_record([
        format!("{} Installed", Icons::INSTALLED),
        format!("{}", Colored(Green, installed)),
    ]);
    builder.push_record([
        format!("{} Available", Icons::NOT_INSTALLED),
        format!("{}", Colored(Blue, available)),
    ]);

    builder
        .build()
        .with(Panel::header("Search Results"))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string()
}

pub async fn search_packages(ctx: &PkitContext, term: String, filter: String) -> PkitResult<()> {
    debug!(term = term, filter = filter, "searching packages");

    let report = search::search_name(ctx, &filter, &term).await?;

    for entry in &report.packages {
        let (name, version, repo) = split_package_id(&entry.package_id);
        let state_icon = if entry.installed {
            Icons::INSTALLED
        } else {
            Icons::NOT_INSTALLED
        };

        info!(
            package_id = entry.package_id,
            installed = entry.installed,
            summary = entry.summary,
            "[{}] {}:{} | {} - {}",
            state_icon,
            Colored(Blue, name),
            Colored(Green, repo),
            Colored(LightRed, version),
            entry.summary,
        );
    }

    if report.packages.is_empty() {
        info!("{}", Colored(Red, format!("No packages found for '{term}'")));
        return Ok(());
    }

    info!("\n{}", summary_table(&report));
    Ok(())
}

pub async fn list_repositories(ctx: &PkitContext) -> PkitResult<()> {
    let repos = repos::get_repo_list(ctx).await?;

    if repos.is_empty() {
        info!("No repositories configured");
        return Ok(());
    }

    let mut builder = Builder::new();
    builder.push_record(["Repository", "Enabled", "Description"]);
    for repo in &repos {
        builder.push_record([
            format!("{}", Colored(Green, &repo.name)),
            if repo.enabled {
                format!("{}", Colored(Green, "yes"))
            } else {
                format!("{}", Colored(Red, "no"))
            },
            repo.description.clone(),
        ]);
    }

    let table = builder.build().with(Style::rounded()).to_string();
    info!("\n{table}");
    Ok(())
}

pub fn list_filters(ctx: &PkitContext) -> PkitResult<()> {
    for filter in repos::get_filters(ctx)? {
        info!("{filter}");
        info!("~{filter}");
    }
    Ok(())
}

pub fn list_groups(ctx: &PkitContext) -> PkitResult<()> {
    let groups = repos::get_groups(ctx)?;
    if groups.is_empty() {
        info!("No package groups");
    }
    for group in groups {
        info!("{group}");
    }
    Ok(())
}
