use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("Failed to get current directory: {source}")]
    #[diagnostic(code(pkit_utils::path::current_dir))]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },

    #[error("Path is empty")]
    #[diagnostic(code(pkit_utils::path::empty))]
    Empty,

    #[error("Environment variable `{var}` not set in `{input}`")]
    #[diagnostic(
        code(pkit_utils::path::missing_env),
        help("Export the variable or use an absolute path")
    )]
    MissingEnvVar { var: String, input: String },

    #[error("Unclosed variable expression starting at `{input}`")]
    #[diagnostic(code(pkit_utils::path::unclosed_variable))]
    UnclosedVariable { input: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum LockError {
    #[error("Failed to create lock file `{}`: {source}", path.display())]
    #[diagnostic(
        code(pkit_utils::lock::create),
        help("Check that the database directory exists and is writable")
    )]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to acquire lock: {0}")]
    #[diagnostic(code(pkit_utils::lock::acquire))]
    AcquireFailed(String),

    #[error("Database is locked by another process: {}", .0.display())]
    #[diagnostic(
        code(pkit_utils::lock::busy),
        help("Wait for the other package operation to finish, or remove the stale lock file")
    )]
    Busy(PathBuf),
}

pub type PathResult<T> = std::result::Result<T, PathError>;
pub type LockResult<T> = std::result::Result<T, LockError>;
