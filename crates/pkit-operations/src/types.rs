/// One row of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub package_id: String,
    pub installed: bool,
    pub summary: String,
}

/// Result of a search operation.
#[derive(Debug, Default)]
pub struct SearchReport {
    pub packages: Vec<SearchEntry>,
    /// Matches before the configured search limit was applied.
    pub total_count: usize,
}

/// Package acted on by a transaction.
#[derive(Debug, Clone)]
pub struct TransactionReport {
    pub package_id: String,
    pub summary: String,
}

/// A configured repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

/// Outcome of refreshing one repository.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
}
