//! Cross-repository package queries.

use std::{cmp::Ordering, collections::HashSet};

use pkit_catalog::{Catalog, PackageRef, RepositoryRef};
use tracing::{debug, warn};

use crate::{
    error::PkitError,
    filter::{filter_by_installed, FilterSet},
    identity::{compare_packages, equals_to, pkg_equal},
    package_id::PackageId,
    sequence::ResultSequence,
    PkitResult,
};

/// A record as seen by one query.
#[derive(Debug, Clone)]
pub struct AnnotatedPackage {
    pub record: PackageRef,
    /// Repository the record was found in.
    pub repo: String,
    pub installed: bool,
}

impl AnnotatedPackage {
    pub fn package_id(&self) -> PackageId {
        PackageId::from_record(&self.record, &self.repo)
    }

    pub fn summary(&self) -> &str {
        &self.record.description
    }
}

/// Packages found by a query plus problems that did not stop it.
#[derive(Debug, Default)]
pub struct QueryResult {
    pub packages: ResultSequence<AnnotatedPackage>,
    pub warnings: Vec<PkitError>,
}

pub fn compare_annotated(a: &AnnotatedPackage, b: &AnnotatedPackage) -> Ordering {
    compare_packages(&a.record, &b.record)
}

/// Searches `repo` for `term` and tags every match with its installed state.
///
/// Matches from the local repository are always installed. A remote match is
/// installed when any local match has the same name and version. If the local
/// repository cannot be read the query still succeeds, with every remote match
/// marked available and the failure returned as a warning.
pub fn find_packages(
    catalog: &dyn Catalog,
    term: &str,
    repo: &RepositoryRef,
) -> PkitResult<QueryResult> {
    let mut records = catalog.search(repo, term).map_err(|source| {
        PkitError::RepositoryLoad {
            repo: repo.name.clone(),
            source,
        }
    })?;
    debug!(repo = %repo.name, term = term, matches = records.len(), "searched repository");
    // Merging relies on every input already being in result order.
    records.sort_by(|a, b| compare_packages(a, b));

    if repo.local {
        let packages = records
            .into_iter()
            .map(|record| {
                AnnotatedPackage {
                    record,
                    repo: repo.name.clone(),
                    installed: true,
                }
            })
            .collect();
        return Ok(QueryResult {
            packages,
            warnings: Vec::new(),
        });
    }

    let mut warnings = Vec::new();
    let local_matches = match catalog
        .local_repository()
        .and_then(|local| catalog.search(&local, term))
    {
        Ok(matches) => matches,
        Err(err) => {
            warn!(repo = %repo.name, "cannot read local repository: {err}");
            warnings.push(PkitError::Internal(format!(
                "Failed to read the local repository: {err}"
            )));
            Vec::new()
        }
    };

    let packages = records
        .into_iter()
        .map(|record| {
            let installed = local_matches.iter().any(|local| pkg_equal(local, &record));
            AnnotatedPackage {
                record,
                repo: repo.name.clone(),
                installed,
            }
        })
        .collect();

    Ok(QueryResult {
        packages,
        warnings,
    })
}

/// True when the local repository holds `name`, at `version` if one is given.
pub fn is_installed(catalog: &dyn Catalog, name: &str, version: Option<&str>) -> PkitResult<bool> {
    let local = catalog.local_repository()?;
    let matches = catalog.search(&local, name)?;
    Ok(matches.iter().any(|r| equals_to(r, name, version)))
}

/// Removes from `installed` every package also present in `remote`.
pub fn dedupe(
    remote: &ResultSequence<AnnotatedPackage>,
    mut installed: ResultSequence<AnnotatedPackage>,
) -> ResultSequence<AnnotatedPackage> {
    let seen: HashSet<(&str, &str)> = remote
        .iter()
        .map(|p| (p.record.name.as_str(), p.record.version.as_str()))
        .collect();

    installed.retain(|p| !seen.contains(&(p.record.name.as_str(), p.record.version.as_str())));
    installed
}

/// Name search across the catalog, merged, deduplicated and filtered.
pub fn search_name(
    catalog: &dyn Catalog,
    filter: FilterSet,
    term: &str,
) -> PkitResult<QueryResult> {
    let mut result = QueryResult::default();

    if filter.keep_available {
        for repo in catalog.remote_repositories() {
            let found = find_packages(catalog, term, &repo)?;
            result.warnings.extend(found.warnings);
            result.packages = result.packages.merge_by(found.packages, compare_annotated);
        }

        if filter.keep_installed {
            match catalog.local_repository() {
                Ok(local) => {
                    let found = find_packages(catalog, term, &local)?;
                    let survivors = dedupe(&result.packages, found.packages);
                    result.packages = result.packages.merge_by(survivors, compare_annotated);
                }
                // Already reported while cross-referencing the remote matches.
                Err(_) if !result.warnings.is_empty() => {}
                Err(err) => {
                    warn!("cannot read local repository: {err}");
                    result.warnings.push(PkitError::Internal(format!(
                        "Failed to read the local repository: {err}"
                    )));
                }
            }
        }
    } else if filter.keep_installed {
        let local = catalog.local_repository()?;
        result = find_packages(catalog, term, &local)?;
    }

    if !filter.keep_installed {
        filter_by_installed(&mut result.packages, false);
    }
    if !filter.keep_available {
        filter_by_installed(&mut result.packages, true);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use pkit_catalog::{FailStage, MemoryCatalog, PackageRecord};
    use pkit_events::ErrorKind;

    use super::*;

    fn rec(name: &str, version: &str) -> PackageRecord {
        PackageRecord::new(name, version)
    }

    fn rows(result: &QueryResult) -> Vec<(String, bool)> {
        result
            .packages
            .iter()
            .map(|p| (format!("{}-{}", p.record.name, p.record.version), p.installed))
            .collect()
    }

    fn scenario() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_local([rec("foo", "1.0")])
            .with_remote("core", [rec("foo", "1.0"), rec("bar", "2.0")])
    }

    #[test]
    fn test_installed_package_reported_once() {
        let catalog = scenario();
        let result = search_name(&catalog, FilterSet::default(), "foo").unwrap();
        assert_eq!(rows(&result), vec![("foo-1.0".to_string(), true)]);
        assert_eq!(result.packages.iter().next().unwrap().repo, "core");
    }

    #[test]
    fn test_not_installed_filter_excludes_installed() {
        let catalog = scenario();
        let result = search_name(&catalog, FilterSet::parse("~installed"), "foo").unwrap();
        assert!(result.packages.is_empty());
    }

    #[test]
    fn test_upgrade_available_keeps_both_versions() {
        let catalog = MemoryCatalog::new()
            .with_local([rec("foo", "1.0")])
            .with_remote("core", [rec("foo", "2.0")]);
        let result = search_name(&catalog, FilterSet::default(), "foo").unwrap();
        assert_eq!(
            rows(&result),
            vec![
                ("foo-1.0".to_string(), true),
                ("foo-2.0".to_string(), false)
            ]
        );
    }

    #[test]
    fn test_installed_filter_searches_local_only() {
        let catalog = scenario();
        let result = search_name(&catalog, FilterSet::parse("installed"), "").unwrap();
        assert_eq!(rows(&result), vec![("foo-1.0".to_string(), true)]);
        assert_eq!(result.packages.iter().next().unwrap().repo, "local");
    }

    #[test]
    fn test_disjoint_filter_is_empty() {
        let catalog = scenario();
        let result = search_name(&catalog, FilterSet::parse("installed;~installed"), "").unwrap();
        assert!(result.packages.is_empty());
    }

    #[test]
    fn test_results_merge_across_repositories_in_order() {
        let catalog = MemoryCatalog::new()
            .with_remote("core", [rec("bash", "5.2"), rec("zsh", "5.9")])
            .with_remote("extra", [rec("fish", "3.7"), rec("zsh", "5.8")]);
        let result = search_name(&catalog, FilterSet::default(), "").unwrap();
        let names: Vec<_> = rows(&result).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["bash-5.2", "fish-3.7", "zsh-5.8", "zsh-5.9"]);
    }

    #[test]
    fn test_versions_ordered_across_repositories() {
        let catalog = MemoryCatalog::new()
            .with_remote("core", [rec("foo", "2.0"), rec("foo", "1.0")])
            .with_remote("extra", [rec("foo", "1.5")]);
        let result = search_name(&catalog, FilterSet::default(), "foo").unwrap();
        let versions: Vec<_> = result
            .packages
            .iter()
            .map(|p| p.record.version.as_str())
            .collect();
        assert_eq!(versions, vec!["1.0", "1.5", "2.0"]);
    }

    #[test]
    fn test_same_package_in_two_remotes_is_kept_twice() {
        let catalog = MemoryCatalog::new()
            .with_remote("core", [rec("foo", "1.0")])
            .with_remote("extra", [rec("foo", "1.0")]);
        let result = search_name(&catalog, FilterSet::default(), "foo").unwrap();
        let repos: Vec<_> = result.packages.iter().map(|p| p.repo.as_str()).collect();
        assert_eq!(repos, vec!["core", "extra"]);
    }

    #[test]
    fn test_installed_if_any_local_match() {
        let catalog = MemoryCatalog::new()
            .with_local([rec("foo", "1.0"), rec("foo-utils", "3.0")])
            .with_remote("core", [rec("foo", "1.0")]);
        let result =
            find_packages(&catalog, "foo", &RepositoryRef::remote("core")).unwrap();
        assert_eq!(rows(&result), vec![("foo-1.0".to_string(), true)]);

        let catalog = MemoryCatalog::new()
            .with_local([rec("foo", "1.0"), rec("afoo", "3.0")])
            .with_remote("core", [rec("foo", "1.0")]);
        let result =
            find_packages(&catalog, "foo", &RepositoryRef::remote("core")).unwrap();
        assert_eq!(rows(&result), vec![("foo-1.0".to_string(), true)]);
    }

    #[test]
    fn test_local_failure_is_a_warning() {
        let catalog = scenario().fail_at(FailStage::LocalRepository);
        let result =
            find_packages(&catalog, "foo", &RepositoryRef::remote("core")).unwrap();
        assert_eq!(rows(&result), vec![("foo-1.0".to_string(), false)]);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind(), ErrorKind::InternalError);
    }

    #[test]
    fn test_search_without_local_repository_keeps_remote_matches() {
        let catalog = scenario().fail_at(FailStage::LocalRepository);
        let result = search_name(&catalog, FilterSet::default(), "").unwrap();
        assert_eq!(
            rows(&result),
            vec![
                ("bar-2.0".to_string(), false),
                ("foo-1.0".to_string(), false)
            ]
        );
        assert_eq!(result.warnings.len(), 1);

        let catalog = MemoryCatalog::new().fail_at(FailStage::LocalRepository);
        let result = search_name(&catalog, FilterSet::default(), "foo").unwrap();
        assert!(result.packages.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_unknown_repository_fails_load() {
        let catalog = scenario();
        let err = find_packages(&catalog, "foo", &RepositoryRef::remote("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepositoryLoadFailed);
    }

    #[test]
    fn test_dedupe_removes_only_identical() {
        let remote: ResultSequence<_> = vec![AnnotatedPackage {
            record: std::sync::Arc::new(rec("foo", "2.0")),
            repo: "core".into(),
            installed: false,
        }]
        .into_iter()
        .collect();
        let installed: ResultSequence<_> = vec![
            AnnotatedPackage {
                record: std::sync::Arc::new(rec("foo", "1.0")),
                repo: "local".into(),
                installed: true,
            },
            AnnotatedPackage {
                record: std::sync::Arc::new(rec("foo", "2.0")),
                repo: "local".into(),
                installed: true,
            },
        ]
        .into_iter()
        .collect();

        let survivors = dedupe(&remote, installed);
        let versions: Vec<_> = survivors
            .iter()
            .map(|p| p.record.version.as_str())
            .collect();
        assert_eq!(versions, vec!["1.0"]);
    }

    #[test]
    fn test_is_installed() {
        let catalog = scenario();
        assert!(is_installed(&catalog, "foo", None).unwrap());
        assert!(is_installed(&catalog, "foo", Some("1.0")).unwrap());
        assert!(!is_installed(&catalog, "foo", Some("2.0")).unwrap());
        assert!(!is_installed(&catalog, "bar", None).unwrap());
    }
}
