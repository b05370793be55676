use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{config::Config, error::Result};

/// Name reserved for the installed-packages repository.
pub const LOCAL_REPOSITORY: &str = "local";

/// A remote repository offering packages for installation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Repository {
    /// Unique name of the repository.
    pub name: String,

    /// Where the package list is fetched from on refresh. A filesystem path,
    /// `file://` URL or `http(s)://` URL.
    pub url: Option<String>,

    /// Human readable description, reported by the repository listing.
    pub description: Option<String>,

    /// Whether the repository is searched and offered.
    /// Default: true
    pub enabled: Option<bool>,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            description: None,
            enabled: Some(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Directory holding this repository's package list.
    pub fn get_path(&self, config: &Config) -> Result<PathBuf> {
        Ok(config.get_repositories_path()?.join(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_defaults_to_true() {
        let mut repo = Repository::new("core");
        repo.enabled = None;
        assert!(repo.is_enabled());

        repo.enabled = Some(false);
        assert!(!repo.is_enabled());
    }

    #[test]
    fn test_repository_path() {
        let mut config = Config::default_config();
        config.repositories_path = Some("/srv/pkit/repos".into());
        let repo = Repository::new("extra");
        assert_eq!(
            repo.get_path(&config).unwrap(),
            PathBuf::from("/srv/pkit/repos/extra")
        );
    }
}
