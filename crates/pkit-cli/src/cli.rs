use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search installed and available packages by name
    #[command(arg_required_else_help = true)]
    #[clap(name = "search", visible_alias = "s", visible_alias = "find")]
    Search {
        /// Name fragment to search for
        #[arg(required = true)]
        term: String,

        /// Filters joined by ';', e.g. 'installed' or '~installed'
        #[arg(required = false, short, long, default_value = "none")]
        filter: String,
    },

    /// Install packages from the remote repositories
    #[command(arg_required_else_help = true)]
    #[clap(name = "install", visible_alias = "i", visible_alias = "add")]
    Install {
        /// Package ids (name;version;arch;repository) or plain names
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Upgrade installed packages to the version offered by the repositories
    #[command(arg_required_else_help = true)]
    #[clap(name = "update", visible_alias = "u", visible_alias = "upgrade")]
    Update {
        /// Packages to update
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Install packages from local package files
    #[command(arg_required_else_help = true)]
    #[clap(name = "install-file")]
    InstallFile {
        /// Paths to package files
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        paths: Vec<String>,
    },

    /// Remove installed packages
    #[command(arg_required_else_help = true)]
    #[clap(name = "remove", visible_alias = "r", visible_alias = "del")]
    Remove {
        /// Packages to remove
        #[arg(required = true)]
        packages: Vec<String>,

        /// Also remove installed packages that depend on the targets
        #[arg(required = false, long)]
        allow_deps: bool,

        /// Remove dependencies that are no longer needed (no effect)
        #[arg(required = false, long)]
        autoremove: bool,
    },

    /// Refresh repository package lists
    #[clap(name = "refresh", visible_alias = "sync", visible_alias = "S")]
    Refresh {
        /// Refresh even when the package lists are current
        #[arg(required = false, short, long)]
        force: bool,
    },

    /// List configured repositories
    #[clap(name = "repos")]
    Repos,

    /// List supported search filters
    #[clap(name = "filters")]
    Filters,

    /// List package groups
    #[clap(name = "groups")]
    Groups,

    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_remove_flags() {
        let args = Args::parse_from(["pkit", "-vv", "remove", "foo", "--allow-deps"]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Commands::Remove {
                packages,
                allow_deps,
                autoremove,
            } => {
                assert_eq!(packages, vec!["foo"]);
                assert!(allow_deps);
                assert!(!autoremove);
            }
            _ => panic!("expected remove"),
        }
    }

    #[test]
    fn test_search_filter_defaults_to_none() {
        let args = Args::parse_from(["pkit", "search", "vim"]);
        match args.command {
            Commands::Search {
                term,
                filter,
            } => {
                assert_eq!(term, "vim");
                assert_eq!(filter, "none");
            }
            _ => panic!("expected search"),
        }
    }
}
