//! `;`-separated package filters.

use tracing::trace;

use crate::{query::AnnotatedPackage, sequence::ResultSequence};

/// Which sides of a query survive filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSet {
    pub keep_installed: bool,
    pub keep_available: bool,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            keep_installed: true,
            keep_available: true,
        }
    }
}

impl FilterSet {
    /// Parses a filter such as `installed` or `~installed;none`.
    ///
    /// Unknown tokens are ignored.
    pub fn parse(spec: &str) -> Self {
        let mut filter = Self::default();

        for token in spec.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "installed" => filter.keep_available = false,
                "~installed" => filter.keep_installed = false,
                "none" => {}
                other => trace!(token = other, "ignoring unknown filter"),
            }
        }

        filter
    }

    pub fn wants_only_installed(&self) -> bool {
        self.keep_installed && !self.keep_available
    }
}

/// Filters advertised to clients.
pub fn supported_filters() -> &'static [&'static str] {
    &["installed"]
}

/// Drops every entry whose installed flag differs from `keep`.
pub fn filter_by_installed(seq: &mut ResultSequence<AnnotatedPackage>, keep: bool) {
    seq.retain(|pkg| pkg.installed == keep);
}
