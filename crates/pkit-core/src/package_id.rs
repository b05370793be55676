//! `name;version;arch;data` package identifiers.

use std::{fmt, str::FromStr};

use pkit_catalog::PackageRecord;

use crate::error::PkitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageId {
    pub name: String,
    pub version: String,
    pub arch: String,
    /// Repository the package belongs to, `local` when installed.
    pub data: String,
}

impl PackageId {
    pub fn from_record(record: &PackageRecord, data: &str) -> Self {
        Self {
            name: record.name.clone(),
            version: record.version.clone(),
            arch: record.arch.clone().unwrap_or_default(),
            data: data.to_string(),
        }
    }

    pub fn version(&self) -> Option<&str> {
        (!self.version.is_empty()).then_some(self.version.as_str())
    }
}

impl FromStr for PackageId {
    type Err = PkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(';').collect();
        if parts.len() > 4 {
            return Err(PkitError::InvalidPackageId(s.to_string()));
        }

        let part = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();
        let name = part(0);
        if name.is_empty() {
            return Err(PkitError::InvalidPackageId(s.to_string()));
        }

        Ok(Self {
            name,
            version: part(1),
            arch: part(2),
            data: part(3),
        })
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.name, self.version, self.arch, self.data
        )
    }
}
