//! Staged catalog transactions.
//!
//! A [`Transaction`] walks `Initialized -> TargetsAdded -> Prepared -> Committed`
//! and always ends `Released`. A failure at any stage releases the catalog
//! session before the error is returned; dropping an unreleased transaction
//! releases it too. The catalog is released exactly once either way.

use pkit_catalog::{
    Catalog, CatalogError, PackageRef, ProgressFn, TransactionFlags, TransactionHandle,
    TransactionKind,
};
use tracing::{debug, warn};

use crate::{error::PkitError, PkitResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Uninitialized,
    Initialized,
    TargetsAdded,
    Prepared,
    Committed,
    Released,
}

pub struct Transaction<'c> {
    catalog: &'c mut dyn Catalog,
    handle: TransactionHandle,
    kind: TransactionKind,
    flags: TransactionFlags,
    targets: Vec<String>,
    problems: Vec<String>,
    state: TransactionState,
}

impl<'c> Transaction<'c> {
    /// Opens a transaction. Nothing needs releasing if this fails.
    pub fn begin(
        catalog: &'c mut dyn Catalog,
        kind: TransactionKind,
        flags: TransactionFlags,
    ) -> PkitResult<Self> {
        let handle = catalog.begin_transaction(kind, flags).map_err(|err| {
            PkitError::Transaction {
                stage: "initializing",
                reason: err.to_string(),
                problems: Vec::new(),
            }
        })?;
        debug!(%kind, ?flags, "transaction initialized");

        Ok(Self {
            catalog,
            handle,
            kind,
            flags,
            targets: Vec::new(),
            problems: Vec::new(),
            state: TransactionState::Initialized,
        })
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn flags(&self) -> TransactionFlags {
        self.flags
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Problems reported by the last failed prepare.
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    fn expect_state(&mut self, stage: &'static str, allowed: &[TransactionState]) -> PkitResult<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        let err = PkitError::Transaction {
            stage,
            reason: format!("transaction is {:?}", self.state),
            problems: Vec::new(),
        };
        self.release_quietly();
        Err(err)
    }

    pub fn add_target(&mut self, target: &str) -> PkitResult<()> {
        self.expect_state(
            "adding targets",
            &[TransactionState::Initialized, TransactionState::TargetsAdded],
        )?;

        if let Err(err) = self.catalog.add_target(self.handle, target) {
            return Err(self.fail("adding targets", err));
        }
        self.targets.push(target.to_string());
        self.state = TransactionState::TargetsAdded;
        Ok(())
    }

    pub fn prepare(&mut self) -> PkitResult<()> {
        self.expect_state("preparing", &[TransactionState::TargetsAdded])?;

        if let Err(err) = self.catalog.prepare(self.handle) {
            return Err(self.fail("preparing", err));
        }
        self.state = TransactionState::Prepared;
        Ok(())
    }

    pub fn commit(&mut self, on_progress: ProgressFn<'_>) -> PkitResult<()> {
        self.expect_state("committing", &[TransactionState::Prepared])?;

        if let Err(err) = self.catalog.commit(self.handle, on_progress) {
            return Err(self.fail("committing", err));
        }
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Releases the catalog session.
    pub fn release(mut self) -> PkitResult<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> PkitResult<()> {
        if self.state == TransactionState::Released {
            return Ok(());
        }
        self.state = TransactionState::Released;
        debug!(handle = self.handle.0, "releasing transaction");
        self.catalog
            .release(self.handle)
            .map_err(|err| PkitError::FailedFinalise(err.to_string()))
    }

    fn release_quietly(&mut self) {
        if let Err(err) = self.release_inner() {
            warn!("{}", err);
        }
    }

    fn fail(&mut self, stage: &'static str, err: CatalogError) -> PkitError {
        let problems = match &err {
            CatalogError::Unresolved { problems } => problems.clone(),
            _ => Vec::new(),
        };
        self.problems = problems.clone();
        self.release_quietly();

        PkitError::Transaction {
            stage,
            reason: err.to_string(),
            problems,
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.release_quietly();
    }
}

/// Runs every stage for `targets`, calling `before_commit` once prepared.
pub fn run_transaction(
    catalog: &mut dyn Catalog,
    kind: TransactionKind,
    flags: TransactionFlags,
    targets: &[String],
    before_commit: impl FnOnce(),
    on_progress: ProgressFn<'_>,
) -> PkitResult<()> {
    let mut trans = Transaction::begin(catalog, kind, flags)?;
    for target in targets {
        trans.add_target(target)?;
    }
    trans.prepare()?;
    before_commit();
    trans.commit(on_progress)?;
    trans.release()
}

/// The single installed package named exactly `name`.
///
/// No match and several matches are both reported as not installed.
pub fn resolve_removal(catalog: &dyn Catalog, name: &str) -> PkitResult<PackageRef> {
    let local = catalog.local_repository()?;
    let mut matches: Vec<PackageRef> = catalog
        .search(&local, name)?
        .into_iter()
        .filter(|r| r.name == name)
        .collect();

    if matches.len() != 1 {
        debug!(name = name, matches = matches.len(), "removal target is not unique");
        return Err(PkitError::PackageNotInstalled(name.to_string()));
    }
    Ok(matches.remove(0))
}
