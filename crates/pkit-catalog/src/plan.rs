//! Target resolution shared by the catalog backends.

use std::{collections::HashSet, sync::Arc};

use pkit_config::repository::LOCAL_REPOSITORY;

use crate::{
    record::{sort_by_name, PackageRecord, PackageRef},
    traits::{TransactionFlags, TransactionHandle, TransactionKind},
};

/// State of the single open transaction.
#[derive(Debug)]
pub(crate) struct Pending {
    pub handle: TransactionHandle,
    pub kind: TransactionKind,
    pub flags: TransactionFlags,
    pub targets: Vec<String>,
    pub resolved: Option<Resolved>,
}

impl Pending {
    pub fn new(handle: TransactionHandle, kind: TransactionKind, flags: TransactionFlags) -> Self {
        Self {
            handle,
            kind,
            flags,
            targets: Vec::new(),
            resolved: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Resolved {
    pub installs: Vec<PackageRef>,
    pub removals: Vec<String>,
}

impl Resolved {
    pub fn steps(&self) -> usize {
        self.installs.len() + self.removals.len()
    }
}

/// First remote record named `name`, in repository order.
pub(crate) fn find_sync<'a>(
    remotes: impl IntoIterator<Item = &'a [PackageRef]>,
    name: &str,
) -> Option<PackageRef> {
    remotes
        .into_iter()
        .find_map(|records| records.iter().find(|r| r.name == name).cloned())
}

/// Checks install candidates against the local list.
pub(crate) fn check_installs(
    installs: &[PackageRef],
    local: &[PackageRef],
    flags: TransactionFlags,
    problems: &mut Vec<String>,
) {
    if flags.no_deps {
        return;
    }

    let mut available: HashSet<&str> = local.iter().map(|r| r.name.as_str()).collect();
    available.extend(installs.iter().map(|r| r.name.as_str()));

    for record in installs {
        for dep in &record.depends {
            if !available.contains(dep.as_str()) {
                problems.push(format!("{}: requires {}", record.name, dep));
            }
        }
    }
}

/// Names removed by a removal of `targets`, dependents included when cascading.
pub(crate) fn resolve_removals(
    targets: &[String],
    local: &[PackageRef],
    flags: TransactionFlags,
    problems: &mut Vec<String>,
) -> Vec<String> {
    let mut removals: Vec<String> = Vec::new();
    for target in targets {
        if local.iter().any(|r| &r.name == target) {
            removals.push(target.clone());
        } else {
            problems.push(format!("target not found: {target}"));
        }
    }

    let mut idx = 0;
    while idx < removals.len() {
        let name = removals[idx].clone();
        for dependent in local.iter().filter(|r| r.depends.contains(&name)) {
            if removals.contains(&dependent.name) {
                continue;
            }
            if flags.cascade {
                removals.push(dependent.name.clone());
            } else if !flags.no_deps {
                problems.push(format!("{}: requires {}", dependent.name, name));
            }
        }
        idx += 1;
    }

    removals
}

/// Applies one resolved step to the local list and returns the new list.
pub(crate) fn apply_install(local: &[PackageRef], record: &PackageRef) -> Vec<PackageRef> {
    let mut installed = PackageRecord::clone(record);
    installed.repo = LOCAL_REPOSITORY.to_string();

    let mut next: Vec<PackageRef> = local
        .iter()
        .filter(|r| r.name != record.name)
        .cloned()
        .collect();
    next.push(Arc::new(installed));
    sort_by_name(&mut next);
    next
}

pub(crate) fn apply_removal(local: &[PackageRef], name: &str) -> Vec<PackageRef> {
    local.iter().filter(|r| r.name != name).cloned().collect()
}

/// Percentage reached after `done` of `total` steps.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

/// Resolves a sync or removal transaction against in-memory lists.
pub(crate) fn resolve(
    pending: &Pending,
    local: &[PackageRef],
    remotes: &[&[PackageRef]],
    file_records: Vec<PackageRef>,
) -> Result<Resolved, Vec<String>> {
    let mut problems = Vec::new();
    let mut resolved = Resolved::default();

    match pending.kind {
        TransactionKind::SyncInstall | TransactionKind::SyncUpgrade => {
            for target in &pending.targets {
                match find_sync(remotes.iter().copied(), target) {
                    Some(record) => resolved.installs.push(record),
                    None => problems.push(format!("target not found: {target}")),
                }
            }
            check_installs(&resolved.installs, local, pending.flags, &mut problems);
        }
        TransactionKind::FileInstall => {
            resolved.installs = file_records;
            check_installs(&resolved.installs, local, pending.flags, &mut problems);
        }
        TransactionKind::Remove => {
            resolved.removals =
                resolve_removals(&pending.targets, local, pending.flags, &mut problems);
        }
    }

    if problems.is_empty() {
        Ok(resolved)
    } else {
        Err(problems)
    }
}
