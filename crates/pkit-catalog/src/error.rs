//! Error types for catalog backends.

use miette::Diagnostic;
use pkit_utils::error::LockError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CatalogError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(pkit_catalog::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(
        code(pkit_catalog::json),
        help("The package list may be corrupted. Try 'pkit refresh --force'.")
    )]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(
        code(pkit_catalog::http),
        help("Check your network connection and the repository URL")
    )]
    UreqError(#[from] ureq::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] pkit_config::error::ConfigError),

    #[error("Repository not found: {0}")]
    #[diagnostic(
        code(pkit_catalog::unknown_repository),
        help("Check the repository name in your configuration")
    )]
    UnknownRepository(String),

    #[error("Repository '{0}' has no url to refresh from")]
    #[diagnostic(code(pkit_catalog::missing_url))]
    MissingUrl(String),

    #[error("Failed to fetch {url}: status {status}")]
    #[diagnostic(
        code(pkit_catalog::fetch),
        help("Verify the repository URL is correct and accessible")
    )]
    FetchFailed { url: String, status: u16 },

    #[error("Failed to initialize transaction: {0}")]
    #[diagnostic(code(pkit_catalog::begin))]
    BeginFailed(String),

    #[error("Failed to add target '{0}'")]
    #[diagnostic(code(pkit_catalog::add_target))]
    AddTargetFailed(String),

    #[error("Failed to prepare transaction")]
    #[diagnostic(
        code(pkit_catalog::prepare),
        help("Resolve the listed problems and try again")
    )]
    Unresolved { problems: Vec<String> },

    #[error("Failed to commit transaction: {0}")]
    #[diagnostic(code(pkit_catalog::commit))]
    CommitFailed(String),

    #[error("Failed to release transaction: {0}")]
    #[diagnostic(code(pkit_catalog::release))]
    ReleaseFailed(String),

    #[error("No open transaction with handle {0}")]
    #[diagnostic(code(pkit_catalog::stale_handle))]
    StaleHandle(u64),

    #[error("A transaction is already open")]
    #[diagnostic(code(pkit_catalog::busy))]
    TransactionOpen,
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> CatalogResult<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> CatalogResult<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            CatalogError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
