use std::fmt;

use crate::{
    error::CatalogResult,
    record::{PackageRef, RepositoryRef},
};

/// Callback receiving a percentage in `0..=100`.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    SyncInstall,
    SyncUpgrade,
    Remove,
    FileInstall,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionKind::SyncInstall => "sync-install",
            TransactionKind::SyncUpgrade => "sync-upgrade",
            TransactionKind::Remove => "remove",
            TransactionKind::FileInstall => "file-install",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFlags {
    /// Skip dependency checks.
    pub no_deps: bool,
    /// Also remove packages depending on the removal targets.
    pub cascade: bool,
}

impl TransactionFlags {
    pub fn no_deps() -> Self {
        Self {
            no_deps: true,
            cascade: false,
        }
    }

    pub fn cascade(cascade: bool) -> Self {
        Self {
            no_deps: false,
            cascade,
        }
    }
}

/// Opaque handle to an open catalog transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle(pub u64);

/// Access to the installed repository, the remote repositories and the
/// transaction primitives of a package database.
///
/// At most one transaction may be open at a time. Every handle returned by
/// [`Catalog::begin_transaction`] must be passed to [`Catalog::release`]
/// exactly once.
pub trait Catalog: Send {
    fn local_repository(&self) -> CatalogResult<RepositoryRef>;

    fn remote_repositories(&self) -> Vec<RepositoryRef>;

    /// Records of `repo` whose name contains `term`, ordered by name.
    fn search(&self, repo: &RepositoryRef, term: &str) -> CatalogResult<Vec<PackageRef>>;

    fn begin_transaction(
        &mut self,
        kind: TransactionKind,
        flags: TransactionFlags,
    ) -> CatalogResult<TransactionHandle>;

    fn add_target(&mut self, handle: TransactionHandle, target: &str) -> CatalogResult<()>;

    /// Resolves the targets. Fails with [`crate::CatalogError::Unresolved`]
    /// listing every problem found.
    fn prepare(&mut self, handle: TransactionHandle) -> CatalogResult<()>;

    fn commit(&mut self, handle: TransactionHandle, on_progress: ProgressFn<'_>)
        -> CatalogResult<()>;

    fn release(&mut self, handle: TransactionHandle) -> CatalogResult<()>;

    fn refresh_repository(
        &mut self,
        repo: &RepositoryRef,
        force: bool,
        on_progress: ProgressFn<'_>,
    ) -> CatalogResult<()>;

    /// Human readable description and enabled state of every configured repository.
    fn repository_details(&self) -> Vec<(RepositoryRef, String, bool)> {
        self.remote_repositories()
            .into_iter()
            .map(|repo| (repo, String::new(), true))
            .collect()
    }
}
