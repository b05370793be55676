use std::fmt;

use crate::OperationId;

/// All event types emitted by pkit operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PkitEvent {
    /// A package was found by a query, or is being acted on by a transaction.
    Package {
        op_id: OperationId,
        info: PackageInfo,
        package_id: String,
        summary: String,
    },
    /// Overall percentage of the running operation.
    Progress { op_id: OperationId, percent: u8 },
    /// The operation entered a new stage.
    Status { op_id: OperationId, status: Status },
    /// A configured repository, as reported by the repository listing.
    RepoDetail {
        op_id: OperationId,
        repo_name: String,
        description: String,
        enabled: bool,
    },
    /// The operation failed. Emitted at most once per operation.
    Error {
        op_id: OperationId,
        kind: ErrorKind,
        message: String,
    },
    /// Terminates every operation exactly once.
    Finished { op_id: OperationId, exit: ExitStatus },
    /// Log message.
    Log { level: LogLevel, message: String },
}

impl PkitEvent {
    pub fn op_id(&self) -> Option<OperationId> {
        match self {
            PkitEvent::Package { op_id, .. }
            | PkitEvent::Progress { op_id, .. }
            | PkitEvent::Status { op_id, .. }
            | PkitEvent::RepoDetail { op_id, .. }
            | PkitEvent::Error { op_id, .. }
            | PkitEvent::Finished { op_id, .. } => Some(*op_id),
            PkitEvent::Log { .. } => None,
        }
    }
}

/// What a `Package` event says about its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageInfo {
    Installed,
    Available,
    Downloading,
    Installing,
    Removing,
}

impl fmt::Display for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageInfo::Installed => "installed",
            PackageInfo::Available => "available",
            PackageInfo::Downloading => "downloading",
            PackageInfo::Installing => "installing",
            PackageInfo::Removing => "removing",
        };
        f.write_str(s)
    }
}

/// Operation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Query,
    Setup,
    RefreshCache,
    Download,
    Install,
    Remove,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Query => "query",
            Status::Setup => "setup",
            Status::RefreshCache => "refresh-cache",
            Status::Download => "download",
            Status::Install => "install",
            Status::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// Failure categories reported through `Error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InitializationFailed,
    ConfigParseFailed,
    RepositoryLoadFailed,
    TransactionError,
    PackageNotFound,
    PackageNotInstalled,
    InvalidPackageId,
    FailedFinalise,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InitializationFailed => "initialization-failed",
            ErrorKind::ConfigParseFailed => "config-parse-failed",
            ErrorKind::RepositoryLoadFailed => "repository-load-failed",
            ErrorKind::TransactionError => "transaction-error",
            ErrorKind::PackageNotFound => "package-not-found",
            ErrorKind::PackageNotInstalled => "package-not-installed",
            ErrorKind::InvalidPackageId => "invalid-package-id",
            ErrorKind::FailedFinalise => "failed-finalise",
            ErrorKind::InternalError => "internal-error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failed,
}

/// Log levels for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}
