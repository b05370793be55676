//! Error types for pkit-core.

use miette::Diagnostic;
use pkit_catalog::CatalogError;
use pkit_config::error::ConfigError;
use pkit_events::ErrorKind;
use pkit_utils::error::PathError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PkitError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    PathError(#[from] PathError),

    #[error("Failed to initialize package catalog: {0}")]
    #[diagnostic(
        code(pkit::init),
        help("Check that no other pkit process is running and the database directory is writable")
    )]
    InitializationFailed(String),

    #[error("Failed to load repository '{repo}'")]
    #[diagnostic(
        code(pkit::repository),
        help("Run 'pkit refresh' to fetch the repository package list")
    )]
    RepositoryLoad {
        repo: String,
        #[source]
        source: CatalogError,
    },

    #[error("Transaction failed while {stage}: {reason}")]
    #[diagnostic(code(pkit::transaction))]
    Transaction {
        stage: &'static str,
        reason: String,
        problems: Vec<String>,
    },

    #[error("Package '{0}' not found")]
    #[diagnostic(
        code(pkit::package_not_found),
        help("Run 'pkit refresh' to update package lists, or check the package name")
    )]
    PackageNotFound(String),

    #[error("Package '{0}' is not installed")]
    #[diagnostic(code(pkit::package_not_installed))]
    PackageNotInstalled(String),

    #[error("Invalid package id: {0}")]
    #[diagnostic(
        code(pkit::invalid_package_id),
        help("Use format: name;version;arch;repository (e.g., 'foo;1.0;x86_64;core')")
    )]
    InvalidPackageId(String),

    #[error("Failed to release transaction: {0}")]
    #[diagnostic(code(pkit::finalise))]
    FailedFinalise(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Error while {action}")]
    #[diagnostic(code(pkit::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Thread lock poison error")]
    #[diagnostic(
        code(pkit::poison),
        help("This is an internal error, please report it")
    )]
    PoisonError,

    #[error("{0}")]
    #[diagnostic(code(pkit::internal))]
    Internal(String),
}

impl PkitError {
    /// Category reported to event consumers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::PathError(_) => ErrorKind::ConfigParseFailed,
            Self::InitializationFailed(_) => ErrorKind::InitializationFailed,
            Self::RepositoryLoad { .. } => ErrorKind::RepositoryLoadFailed,
            Self::Transaction { .. } => ErrorKind::TransactionError,
            Self::PackageNotFound(_) => ErrorKind::PackageNotFound,
            Self::PackageNotInstalled(_) => ErrorKind::PackageNotInstalled,
            Self::InvalidPackageId(_) => ErrorKind::InvalidPackageId,
            Self::FailedFinalise(_) => ErrorKind::FailedFinalise,
            Self::Catalog(err) => catalog_kind(err),
            Self::IoError { .. } | Self::PoisonError | Self::Internal(_) => {
                ErrorKind::InternalError
            }
        }
    }

    /// Message reported alongside [`PkitError::kind`], problems included.
    pub fn message(&self) -> String {
        match self {
            Self::Transaction { problems, .. } if !problems.is_empty() => {
                format!("{}\n{}", self, problems.join("\n"))
            }
            Self::RepositoryLoad { source, .. } => format!("{self}: {source}"),
            _ => self.to_string(),
        }
    }
}

fn catalog_kind(err: &CatalogError) -> ErrorKind {
    match err {
        CatalogError::Lock(_) | CatalogError::Config(_) => ErrorKind::InitializationFailed,
        CatalogError::UnknownRepository(_)
        | CatalogError::MissingUrl(_)
        | CatalogError::FetchFailed { .. }
        | CatalogError::UreqError(_)
        | CatalogError::JsonError(_) => ErrorKind::RepositoryLoadFailed,
        CatalogError::BeginFailed(_)
        | CatalogError::AddTargetFailed(_)
        | CatalogError::Unresolved { .. }
        | CatalogError::CommitFailed(_)
        | CatalogError::TransactionOpen
        | CatalogError::StaleHandle(_) => ErrorKind::TransactionError,
        CatalogError::ReleaseFailed(_) => ErrorKind::FailedFinalise,
        CatalogError::IoError { .. } => ErrorKind::InternalError,
    }
}

impl<T> From<std::sync::PoisonError<T>> for PkitError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::PoisonError
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, PkitError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, PkitError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            PkitError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pkit_utils::error::LockError;

    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PkitError::PackageNotInstalled("foo".into()).kind(),
            ErrorKind::PackageNotInstalled
        );
        assert_eq!(
            PkitError::Catalog(CatalogError::Lock(LockError::Busy(PathBuf::from("/db.lck"))))
                .kind(),
            ErrorKind::InitializationFailed
        );
        assert_eq!(
            PkitError::Catalog(CatalogError::ReleaseFailed("x".into())).kind(),
            ErrorKind::FailedFinalise
        );
        assert_eq!(
            PkitError::Config(ConfigError::ReservedRepositoryName).kind(),
            ErrorKind::ConfigParseFailed
        );
    }

    #[test]
    fn test_transaction_message_lists_problems() {
        let err = PkitError::Transaction {
            stage: "preparing",
            reason: "Failed to prepare transaction".into(),
            problems: vec!["app: requires lib".into()],
        };
        assert_eq!(
            err.message(),
            "Transaction failed while preparing: Failed to prepare transaction\napp: requires lib"
        );
    }

    #[test]
    fn test_with_context() {
        let result: std::io::Result<()> = Err(std::io::Error::other("denied"));
        let err = result
            .with_context(|| "reading package file".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "Error while reading package file");
        assert_eq!(err.kind(), ErrorKind::InternalError);
    }
}
