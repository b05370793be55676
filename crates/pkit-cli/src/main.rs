use std::{env, sync::Arc};

use clap::Parser;
use cli::{Args, Commands};
use install::{install_packages, InstallMode};
use list::{list_filters, list_groups, list_repositories, search_packages};
use logging::setup_logging;
use pkit_config::config::{self, generate_default_config, get_config, CONFIG_PATH};
use pkit_core::{error::ErrorContext, PkitResult};
use pkit_events::{ChannelSink, EventSinkHandle};
use pkit_operations::{sync, PkitContext};
use pkit_utils::path::resolve_path;
use progress::{spawn_event_handler, ProgressGuard};
use remove::remove_packages;
use tracing::{debug, info};
use utils::COLOR;

mod cli;
mod install;
mod list;
mod logging;
mod progress;
mod remove;
mod utils;

fn create_context() -> PkitResult<(PkitContext, ProgressGuard)> {
    let config = get_config();
    let (sink, receiver) = ChannelSink::new();
    let events: EventSinkHandle = Arc::new(sink);
    let ctx = PkitContext::open(config, events)?;
    let guard = spawn_event_handler(receiver);
    Ok((ctx, guard))
}

async fn handle_cli() -> PkitResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write()?;
        *color = false;
    }

    if args.quiet || args.json {
        let mut progress = utils::PROGRESS.write()?;
        *progress = false;
    }

    if let Some(ref c) = args.config {
        let path = resolve_path(c)?;
        let path = if path.is_absolute() {
            path
        } else {
            env::current_dir()
                .with_context(|| "retrieving current directory".into())?
                .join(path)
        };
        debug!(path = %path.display(), "using config file");
        *CONFIG_PATH.write()? = path;
    }

    match args.command {
        Commands::DefConfig => generate_default_config()?,
        command => {
            config::init()?;

            let (ctx, progress_guard) = create_context()?;

            let result = match command {
                Commands::Search {
                    term,
                    filter,
                } => search_packages(&ctx, term, filter).await,
                Commands::Install {
                    packages,
                } => install_packages(&ctx, &packages, InstallMode::Install).await,
                Commands::Update {
                    packages,
                } => install_packages(&ctx, &packages, InstallMode::Update).await,
                Commands::InstallFile {
                    paths,
                } => install_packages(&ctx, &paths, InstallMode::File).await,
                Commands::Remove {
                    packages,
                    allow_deps,
                    autoremove,
                } => remove_packages(&ctx, &packages, allow_deps, autoremove).await,
                Commands::Refresh {
                    force,
                } => {
                    sync::refresh_cache(&ctx, force).await.map(|report| {
                        info!("Refreshed {} repositories", report.refreshed.len());
                    })
                }
                Commands::Repos => list_repositories(&ctx).await,
                Commands::Filters => list_filters(&ctx),
                Commands::Groups => list_groups(&ctx),
                Commands::DefConfig => unreachable!(),
            };

            // Drop the context first to close the event channel, then join the
            // handler so remaining events are drained.
            drop(ctx);
            progress_guard.finish();
            progress::stop();

            result?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
