//! In-memory catalog with call accounting and fault injection.

use pkit_config::repository::LOCAL_REPOSITORY;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{
    error::{CatalogError, CatalogResult},
    plan::{self, Pending},
    record::{matches_term, sort_by_name, PackageRecord, PackageRef, RepositoryRef},
    traits::{
        Catalog, ProgressFn, TransactionFlags, TransactionHandle, TransactionKind,
    },
};

/// Stage at which a [`MemoryCatalog`] fails on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStage {
    LocalRepository,
    Begin,
    AddTarget,
    Prepare,
    Commit,
    Release,
    Refresh,
}

/// Call counters, shared so they stay readable after the catalog is boxed.
#[derive(Debug, Default)]
pub struct CatalogStats {
    begins: AtomicUsize,
    releases: AtomicUsize,
    commits: AtomicUsize,
    refreshes: AtomicUsize,
}

impl CatalogStats {
    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    local: Vec<PackageRef>,
    remotes: Vec<(String, Vec<PackageRef>)>,
    files: Vec<(String, PackageRef)>,
    pending: Option<Pending>,
    next_handle: u64,
    fail_at: Option<FailStage>,
    stats: Arc<CatalogStats>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, records: impl IntoIterator<Item = PackageRecord>) -> Self {
        self.local = Self::load(LOCAL_REPOSITORY, records);
        self
    }

    pub fn with_remote(
        mut self,
        name: &str,
        records: impl IntoIterator<Item = PackageRecord>,
    ) -> Self {
        self.remotes.push((name.to_string(), Self::load(name, records)));
        self
    }

    /// Registers a package file readable by file installs.
    pub fn with_file(mut self, path: &str, record: PackageRecord) -> Self {
        self.files.push((path.to_string(), Arc::new(record)));
        self
    }

    pub fn fail_at(mut self, stage: FailStage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    pub fn stats(&self) -> Arc<CatalogStats> {
        self.stats.clone()
    }

    pub fn installed(&self) -> &[PackageRef] {
        &self.local
    }

    fn load(repo: &str, records: impl IntoIterator<Item = PackageRecord>) -> Vec<PackageRef> {
        let mut refs: Vec<PackageRef> = records
            .into_iter()
            .map(|r| Arc::new(r.with_repo(repo)))
            .collect();
        sort_by_name(&mut refs);
        refs
    }

    fn fails(&self, stage: FailStage) -> bool {
        self.fail_at == Some(stage)
    }

    fn pending_mut(&mut self, handle: TransactionHandle) -> CatalogResult<&mut Pending> {
        match self.pending.as_mut() {
            Some(p) if p.handle == handle => Ok(p),
            _ => Err(CatalogError::StaleHandle(handle.0)),
        }
    }
}

impl Catalog for MemoryCatalog {
    fn local_repository(&self) -> CatalogResult<RepositoryRef> {
        if self.fails(FailStage::LocalRepository) {
            return Err(CatalogError::IoError {
                action: "opening local repository".to_string(),
                source: std::io::Error::other("injected failure"),
            });
        }
        Ok(RepositoryRef::local())
    }

    fn remote_repositories(&self) -> Vec<RepositoryRef> {
        self.remotes
            .iter()
            .map(|(name, _)| RepositoryRef::remote(name.clone()))
            .collect()
    }

    fn search(&self, repo: &RepositoryRef, term: &str) -> CatalogResult<Vec<PackageRef>> {
        let records = if repo.local {
            self.local_repository()?;
            &self.local
        } else {
            self.remotes
                .iter()
                .find(|(name, _)| name == &repo.name)
                .map(|(_, records)| records)
                .ok_or_else(|| CatalogError::UnknownRepository(repo.name.clone()))?
        };

        Ok(records
            .iter()
            .filter(|r| matches_term(r, term))
            .cloned()
            .collect())
    }

    fn begin_transaction(
        &mut self,
        kind: TransactionKind,
        flags: TransactionFlags,
    ) -> CatalogResult<TransactionHandle> {
        if self.fails(FailStage::Begin) {
            return Err(CatalogError::BeginFailed("injected failure".to_string()));
        }
        if self.pending.is_some() {
            return Err(CatalogError::TransactionOpen);
        }

        self.next_handle += 1;
        let handle = TransactionHandle(self.next_handle);
        self.pending = Some(Pending::new(handle, kind, flags));
        self.stats.begins.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    fn add_target(&mut self, handle: TransactionHandle, target: &str) -> CatalogResult<()> {
        if self.fails(FailStage::AddTarget) {
            return Err(CatalogError::AddTargetFailed(target.to_string()));
        }
        self.pending_mut(handle)?.targets.push(target.to_string());
        Ok(())
    }

    fn prepare(&mut self, handle: TransactionHandle) -> CatalogResult<()> {
        if self.fails(FailStage::Prepare) {
            return Err(CatalogError::Unresolved {
                problems: vec!["injected failure".to_string()],
            });
        }

        let pending = self
            .pending
            .as_ref()
            .filter(|p| p.handle == handle)
            .ok_or(CatalogError::StaleHandle(handle.0))?;

        let file_records = pending
            .targets
            .iter()
            .filter_map(|t| {
                self.files
                    .iter()
                    .find(|(path, _)| path == t)
                    .map(|(_, r)| r.clone())
            })
            .collect::<Vec<_>>();
        if pending.kind == TransactionKind::FileInstall && file_records.len() != pending.targets.len()
        {
            return Err(CatalogError::Unresolved {
                problems: vec!["package file not found".to_string()],
            });
        }

        let remotes: Vec<&[PackageRef]> = self.remotes.iter().map(|(_, r)| r.as_slice()).collect();
        let resolved = plan::resolve(pending, &self.local, &remotes, file_records)
            .map_err(|problems| CatalogError::Unresolved { problems })?;

        self.pending_mut(handle)?.resolved = Some(resolved);
        Ok(())
    }

    fn commit(
        &mut self,
        handle: TransactionHandle,
        on_progress: ProgressFn<'_>,
    ) -> CatalogResult<()> {
        let resolved = self
            .pending_mut(handle)?
            .resolved
            .take()
            .ok_or_else(|| CatalogError::CommitFailed("transaction not prepared".to_string()))?;

        on_progress(0);
        if self.fails(FailStage::Commit) {
            return Err(CatalogError::CommitFailed("injected failure".to_string()));
        }

        let total = resolved.steps();
        let mut done = 0;
        for record in &resolved.installs {
            self.local = plan::apply_install(&self.local, record);
            done += 1;
            on_progress(plan::percent(done, total));
        }
        for name in &resolved.removals {
            self.local = plan::apply_removal(&self.local, name);
            done += 1;
            on_progress(plan::percent(done, total));
        }

        self.stats.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self, handle: TransactionHandle) -> CatalogResult<()> {
        self.pending_mut(handle)?;
        self.pending = None;
        self.stats.releases.fetch_add(1, Ordering::SeqCst);

        if self.fails(FailStage::Release) {
            return Err(CatalogError::ReleaseFailed("injected failure".to_string()));
        }
        Ok(())
    }

    fn refresh_repository(
        &mut self,
        repo: &RepositoryRef,
        _force: bool,
        on_progress: ProgressFn<'_>,
    ) -> CatalogResult<()> {
        if !self.remotes.iter().any(|(name, _)| name == &repo.name) {
            return Err(CatalogError::UnknownRepository(repo.name.clone()));
        }
        if self.fails(FailStage::Refresh) {
            return Err(CatalogError::FetchFailed {
                url: repo.name.clone(),
                status: 500,
            });
        }

        on_progress(50);
        on_progress(100);
        self.stats.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_local([PackageRecord::new("foo", "1.0")])
            .with_remote(
                "core",
                [
                    PackageRecord::new("foo", "2.0"),
                    PackageRecord::new("bar", "2.0"),
                ],
            )
    }

    #[test]
    fn test_search_is_ordered_and_tagged() {
        let cat = catalog();
        let core = RepositoryRef::remote("core");
        let found = cat.search(&core, "").unwrap();
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["bar", "foo"]);
        assert!(found.iter().all(|r| r.repo == "core"));
    }

    #[test]
    fn test_search_unknown_repository() {
        let cat = catalog();
        let err = cat.search(&RepositoryRef::remote("nope"), "foo").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownRepository(_)));
    }

    #[test]
    fn test_only_one_transaction() {
        let mut cat = catalog();
        let handle = cat
            .begin_transaction(TransactionKind::Remove, TransactionFlags::default())
            .unwrap();
        assert!(matches!(
            cat.begin_transaction(TransactionKind::Remove, TransactionFlags::default()),
            Err(CatalogError::TransactionOpen)
        ));
        cat.release(handle).unwrap();
        assert!(matches!(
            cat.release(handle),
            Err(CatalogError::StaleHandle(_))
        ));
        assert_eq!(cat.stats().releases(), 1);
    }

    #[test]
    fn test_upgrade_commit_reports_progress() {
        let mut cat = catalog();
        let seen = Mutex::new(Vec::new());
        let handle = cat
            .begin_transaction(TransactionKind::SyncUpgrade, TransactionFlags::no_deps())
            .unwrap();
        cat.add_target(handle, "foo").unwrap();
        cat.prepare(handle).unwrap();
        cat.commit(handle, &|p| seen.lock().unwrap().push(p))
            .unwrap();
        cat.release(handle).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 100]);
        assert_eq!(cat.installed()[0].version, "2.0");
        assert_eq!(cat.stats().commits(), 1);
    }

    #[test]
    fn test_file_install_requires_known_file() {
        let mut cat = catalog().with_file("/tmp/baz.json", PackageRecord::new("baz", "0.1"));
        let handle = cat
            .begin_transaction(TransactionKind::FileInstall, TransactionFlags::default())
            .unwrap();
        cat.add_target(handle, "/tmp/baz.json").unwrap();
        cat.prepare(handle).unwrap();
        cat.commit(handle, &|_| {}).unwrap();
        cat.release(handle).unwrap();
        assert!(cat.installed().iter().any(|r| r.name == "baz"));
    }

    #[test]
    fn test_injected_local_failure() {
        let cat = catalog().fail_at(FailStage::LocalRepository);
        assert!(cat.local_repository().is_err());
        assert!(cat.search(&RepositoryRef::local(), "foo").is_err());
    }
}
