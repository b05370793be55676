//! File-backed catalog.
//!
//! The installed repository lives in `<db_path>/local.json`; each configured
//! repository in `<repositories_path>/<name>/packages.json`. Both are JSON arrays
//! of [`PackageRecord`]. The session holds the database lock until dropped.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use pkit_config::{config::Config, repository::Repository};
use pkit_utils::lock::DbLock;
use tracing::{debug, info, trace};

use crate::{
    error::{CatalogError, CatalogResult, ErrorContext},
    fetch::{self, Source},
    plan::{self, Pending},
    record::{matches_term, sort_by_name, PackageRecord, PackageRef, RepositoryRef},
    traits::{Catalog, ProgressFn, TransactionFlags, TransactionHandle, TransactionKind},
};

pub const LOCAL_LIST: &str = "local.json";
pub const PACKAGE_LIST: &str = "packages.json";

pub struct FsCatalog {
    db_path: PathBuf,
    repositories_path: PathBuf,
    repositories: Vec<Repository>,
    pending: Option<Pending>,
    next_handle: u64,
    _lock: DbLock,
}

impl FsCatalog {
    /// Opens the catalog described by `config`, failing if another session holds it.
    pub fn open(config: &Config) -> CatalogResult<Self> {
        let db_path = config.get_db_path()?;
        let repositories_path = config.get_repositories_path()?;
        let lock = DbLock::try_acquire(&db_path)?;

        debug!(
            db = %db_path.display(),
            repos = %repositories_path.display(),
            "opened catalog"
        );

        Ok(Self {
            db_path,
            repositories_path,
            repositories: config.repositories.clone(),
            pending: None,
            next_handle: 0,
            _lock: lock,
        })
    }

    pub fn local_list_path(&self) -> PathBuf {
        self.db_path.join(LOCAL_LIST)
    }

    pub fn repository_list_path(&self, name: &str) -> PathBuf {
        self.repositories_path.join(name).join(PACKAGE_LIST)
    }

    fn enabled(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter().filter(|r| r.is_enabled())
    }

    fn read_list(path: &Path, repo: &str) -> CatalogResult<Vec<PackageRef>> {
        if !path.exists() {
            trace!(path = %path.display(), "package list missing, treating as empty");
            return Ok(Vec::new());
        }

        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let records: Vec<PackageRecord> = serde_json::from_reader(BufReader::new(file))?;
        let mut refs: Vec<PackageRef> = records
            .into_iter()
            .map(|r| Arc::new(r.with_repo(repo)))
            .collect();
        sort_by_name(&mut refs);
        Ok(refs)
    }

    fn read_local(&self) -> CatalogResult<Vec<PackageRef>> {
        Self::read_list(
            &self.local_list_path(),
            pkit_config::repository::LOCAL_REPOSITORY,
        )
    }

    fn read_remotes(&self) -> CatalogResult<Vec<Vec<PackageRef>>> {
        self.enabled()
            .map(|repo| Self::read_list(&self.repository_list_path(&repo.name), &repo.name))
            .collect()
    }

    fn write_local(&self, records: &[PackageRef]) -> CatalogResult<()> {
        let path = self.local_list_path();
        let tmp = path.with_extension("json.tmp");

        {
            let file =
                File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
            let mut writer = BufWriter::new(file);
            let list: Vec<&PackageRecord> = records.iter().map(|r| r.as_ref()).collect();
            serde_json::to_writer_pretty(&mut writer, &list)?;
            writer
                .flush()
                .with_context(|| format!("writing {}", tmp.display()))?;
        }

        fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    fn read_package_file(path: &str) -> CatalogResult<PackageRef> {
        let file = File::open(path).with_context(|| format!("opening package file {path}"))?;
        let record: PackageRecord = serde_json::from_reader(BufReader::new(file))?;
        Ok(Arc::new(record))
    }

    fn pending_mut(&mut self, handle: TransactionHandle) -> CatalogResult<&mut Pending> {
        match self.pending.as_mut() {
            Some(p) if p.handle == handle => Ok(p),
            _ => Err(CatalogError::StaleHandle(handle.0)),
        }
    }
}

impl Catalog for FsCatalog {
    fn local_repository(&self) -> CatalogResult<RepositoryRef> {
        let path = self.local_list_path();
        if path.exists() {
            File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        }
        Ok(RepositoryRef::local())
    }

    fn remote_repositories(&self) -> Vec<RepositoryRef> {
        self.enabled()
            .map(|repo| RepositoryRef::remote(repo.name.clone()))
            .collect()
    }

    fn search(&self, repo: &RepositoryRef, term: &str) -> CatalogResult<Vec<PackageRef>> {
        let records = if repo.local {
            self.read_local()?
        } else {
            if !self.enabled().any(|r| r.name == repo.name) {
                return Err(CatalogError::UnknownRepository(repo.name.clone()));
            }
            Self::read_list(&self.repository_list_path(&repo.name), &repo.name)?
        };

        Ok(records
            .into_iter()
            .filter(|r| matches_term(r, term))
            .collect())
    }

    fn begin_transaction(
        &mut self,
        kind: TransactionKind,
        flags: TransactionFlags,
    ) -> CatalogResult<TransactionHandle> {
        if self.pending.is_some() {
            return Err(CatalogError::TransactionOpen);
        }

        self.next_handle += 1;
        let handle = TransactionHandle(self.next_handle);
        debug!(%kind, ?flags, handle = handle.0, "transaction initialized");
        self.pending = Some(Pending::new(handle, kind, flags));
        Ok(handle)
    }

    fn add_target(&mut self, handle: TransactionHandle, target: &str) -> CatalogResult<()> {
        if target.is_empty() {
            return Err(CatalogError::AddTargetFailed(target.to_string()));
        }
        self.pending_mut(handle)?.targets.push(target.to_string());
        Ok(())
    }

    fn prepare(&mut self, handle: TransactionHandle) -> CatalogResult<()> {
        let local = self.read_local()?;
        let remotes = self.read_remotes()?;
        let remote_slices: Vec<&[PackageRef]> = remotes.iter().map(Vec::as_slice).collect();

        let pending = self
            .pending
            .as_ref()
            .filter(|p| p.handle == handle)
            .ok_or(CatalogError::StaleHandle(handle.0))?;

        let mut file_records = Vec::new();
        if pending.kind == TransactionKind::FileInstall {
            let mut problems = Vec::new();
            for target in &pending.targets {
                match Self::read_package_file(target) {
                    Ok(record) => file_records.push(record),
                    Err(err) => problems.push(format!("{target}: {err}")),
                }
            }
            if !problems.is_empty() {
                return Err(CatalogError::Unresolved { problems });
            }
        }

        let resolved = plan::resolve(pending, &local, &remote_slices, file_records)
            .map_err(|problems| CatalogError::Unresolved { problems })?;
        debug!(steps = resolved.steps(), "transaction prepared");

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

        let mut local = self.read_local()?;
        let total = resolved.steps();
        let mut done = 0;
        on_progress(0);

        for record in &resolved.installs {
            debug!(name = %record.name, version = %record.version, "installing");
            local = plan::apply_install(&local, record);
            done += 1;
            on_progress(plan::percent(done, total));
        }
        for name in &resolved.removals {
            debug!(name = %name, "removing");
            local = plan::apply_removal(&local, name);
            done += 1;
            on_progress(plan::percent(done, total));
        }

        self.write_local(&local)?;
        Ok(())
    }

    fn release(&mut self, handle: TransactionHandle) -> CatalogResult<()> {
        self.pending_mut(handle)?;
        self.pending = None;
        debug!(handle = handle.0, "transaction released");
        Ok(())
    }

    fn refresh_repository(
        &mut self,
        repo: &RepositoryRef,
        force: bool,
        on_progress: ProgressFn<'_>,
    ) -> CatalogResult<()> {
        let config_repo = self
            .enabled()
            .find(|r| r.name == repo.name)
            .ok_or_else(|| CatalogError::UnknownRepository(repo.name.clone()))?;
        let url = config_repo
            .url
            .as_deref()
            .ok_or_else(|| CatalogError::MissingUrl(repo.name.clone()))?;

        let source = Source::parse(url);
        let dest = self.repository_list_path(&repo.name);

        if !force && fetch::is_up_to_date(&source, &dest) {
            debug!(repo = %repo.name, "package list is up to date");
            on_progress(100);
            return Ok(());
        }

        let count = fetch::fetch_list(&source, &dest, on_progress)?;
        info!(repo = %repo.name, packages = count, "repository refreshed");
        Ok(())
    }

    fn repository_details(&self) -> Vec<(RepositoryRef, String, bool)> {
        self.repositories
            .iter()
            .map(|repo| {
                (
                    RepositoryRef::remote(repo.name.clone()),
                    repo.description.clone().unwrap_or_default(),
                    repo.is_enabled(),
                )
            })
            .collect()
    }
}
