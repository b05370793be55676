//! Database lock held for the lifetime of a catalog session.
//!
//! Only one process may open a catalog at a time. The lock is an exclusive `flock`
//! on `db.lck` inside the database directory and is released when [`DbLock`] is dropped.

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use crate::error::{LockError, LockResult};

pub const LOCK_FILE_NAME: &str = "db.lck";

pub struct DbLock {
    _file: nix::fcntl::Flock<File>,
    path: PathBuf,
}

impl DbLock {
    fn open(db_dir: &Path) -> LockResult<(PathBuf, File)> {
        if !db_dir.exists() {
            fs::create_dir_all(db_dir).map_err(|source| {
                LockError::Create {
                    path: db_dir.to_path_buf(),
                    source,
                }
            })?;
        }

        let lock_path = db_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| {
                LockError::Create {
                    path: lock_path.clone(),
                    source,
                }
            })?;

        Ok((lock_path, file))
    }

    /// Acquire the lock, blocking until any other holder releases it.
    pub fn acquire(db_dir: &Path) -> LockResult<Self> {
        let (path, file) = Self::open(db_dir)?;

        let file = nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive).map_err(
            |(_, err)| LockError::AcquireFailed(format!("{}: {}", path.display(), err)),
        )?;

        Ok(DbLock {
            _file: file,
            path,
        })
    }

    /// Acquire the lock without blocking.
    ///
    /// Returns [`LockError::Busy`] if another session holds it.
    pub fn try_acquire(db_dir: &Path) -> LockResult<Self> {
        let (path, file) = Self::open(db_dir)?;

        match nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusiveNonblock) {
            Ok(file) => {
                Ok(DbLock {
                    _file: file,
                    path,
                })
            }
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => Err(LockError::Busy(path)),
            Err((_, err)) => {
                Err(LockError::AcquireFailed(format!(
                    "{}: {}",
                    path.display(),
                    err
                )))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
