use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One concrete package as described by a repository's package list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: u64,
    /// Repository the record was loaded from. Filled in by the catalog.
    #[serde(default)]
    pub repo: String,
    /// Names of packages this one needs installed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            arch: None,
            description: String::new(),
            size: 0,
            repo: String::new(),
            depends: Vec::new(),
        }
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }
}

/// Shared, immutable handle to a record. Query results never copy records.
pub type PackageRef = Arc<PackageRecord>;

/// A repository known to a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub name: String,
    /// True for the installed-packages repository.
    pub local: bool,
}

impl RepositoryRef {
    pub fn local() -> Self {
        Self {
            name: pkit_config::repository::LOCAL_REPOSITORY.to_string(),
            local: true,
        }
    }

    pub fn remote(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: false,
        }
    }
}

/// Case-sensitive name substring match used by every backend.
pub(crate) fn matches_term(record: &PackageRecord, term: &str) -> bool {
    record.name.contains(term)
}

/// Sort by name, keeping list order between equal names.
pub(crate) fn sort_by_name(records: &mut [PackageRef]) {
    records.sort_by(|a, b| a.name.cmp(&b.name));
}
