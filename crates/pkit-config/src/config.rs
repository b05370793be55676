use std::{
    collections::HashSet,
    fs,
    path::PathBuf,
    sync::{LazyLock, RwLock},
    time::Duration,
};

use pkit_utils::path::{resolve_path, xdg_config_home, xdg_data_home};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{ConfigError, Result},
    repository::{Repository, LOCAL_REPOSITORY},
};

/// Interval at which transaction progress is polled.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 300;

/// Interval at which cache-refresh progress is polled.
pub const DEFAULT_REFRESH_PROGRESS_INTERVAL_MS: u64 = 400;

/// Application's configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Root directory all default paths are derived from.
    /// Default: $XDG_DATA_HOME/pkit
    pub root_path: String,

    /// Directory holding the installed-packages database and its lock file.
    /// Default: $PKIT_ROOT/db
    pub db_path: Option<String>,

    /// Directory holding one sub-directory per configured repository.
    /// Default: $PKIT_ROOT/repos
    pub repositories_path: Option<String>,

    /// Directory used for downloaded package files.
    /// Default: $PKIT_ROOT/cache
    pub cache_path: Option<String>,

    /// Limits the number of results shown by a search.
    pub search_limit: Option<usize>,

    /// Skip dependency checks for sync installs and upgrades.
    /// Default: true
    pub sync_skip_dependencies: Option<bool>,

    /// Transaction progress polling interval in milliseconds.
    /// Default: 300
    pub progress_interval: Option<u64>,

    /// Cache refresh progress polling interval in milliseconds.
    /// Default: 400
    pub refresh_progress_interval: Option<u64>,

    /// List of configured repositories.
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("PKIT_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("pkit").join("config.toml"),
    })
});

pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap();
    *global_config = Some(config);
    Ok(())
}

pub fn get_config() -> Config {
    {
        let config_guard = CONFIG.read().unwrap();
        if let Some(config) = config_guard.as_ref() {
            return config.clone();
        }
    }

    let mut config_guard = CONFIG.write().unwrap();
    config_guard
        .get_or_insert_with(Config::default_config)
        .clone()
}

impl Config {
    pub fn default_config() -> Self {
        let root_path = std::env::var("PKIT_ROOT")
            .unwrap_or_else(|_| format!("{}/pkit", xdg_data_home().display()));

        Self {
            db_path: Some(format!("{root_path}/db")),
            repositories_path: Some(format!("{root_path}/repos")),
            cache_path: Some(format!("{root_path}/cache")),
            root_path,

            search_limit: None,
            sync_skip_dependencies: Some(true),
            progress_interval: Some(DEFAULT_PROGRESS_INTERVAL_MS),
            refresh_progress_interval: Some(DEFAULT_REFRESH_PROGRESS_INTERVAL_MS),
            repositories: Vec::new(),
        }
    }

    /// Creates a new configuration by loading it from the configuration file.
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();

        let mut config = match fs::read_to_string(&config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %config_path.display(), "config file not found, using defaults");
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        self.sync_skip_dependencies.get_or_insert(true);
        self.progress_interval
            .get_or_insert(DEFAULT_PROGRESS_INTERVAL_MS);
        self.refresh_progress_interval
            .get_or_insert(DEFAULT_REFRESH_PROGRESS_INTERVAL_MS);

        if self.progress_interval == Some(0) || self.refresh_progress_interval == Some(0) {
            return Err(ConfigError::InvalidProgressInterval);
        }

        let mut seen_repos = HashSet::new();

        for repo in &mut self.repositories {
            if repo.name == LOCAL_REPOSITORY {
                return Err(ConfigError::ReservedRepositoryName);
            }
            if repo.name.is_empty() || repo.name.contains(['/', ';']) {
                return Err(ConfigError::InvalidRepository(repo.name.clone()));
            }
            if !seen_repos.insert(repo.name.clone()) {
                return Err(ConfigError::DuplicateRepositoryName(repo.name.clone()));
            }

            repo.enabled.get_or_insert(true);
        }

        if self.repositories.is_empty() {
            warn!("No repositories configured. Only installed packages can be queried.");
        }

        Ok(())
    }

    pub fn get_db_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("PKIT_DB") {
            return Ok(resolve_path(&env_path)?);
        }
        match &self.db_path {
            Some(db_path) => Ok(resolve_path(db_path)?),
            None => Ok(resolve_path(&self.root_path)?.join("db")),
        }
    }

    pub fn get_repositories_path(&self) -> Result<PathBuf> {
        match &self.repositories_path {
            Some(path) => Ok(resolve_path(path)?),
            None => Ok(resolve_path(&self.root_path)?.join("repos")),
        }
    }

    pub fn get_cache_path(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(resolve_path(path)?),
            None => Ok(resolve_path(&self.root_path)?.join("cache")),
        }
    }

    pub fn get_repository(&self, repo_name: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|repo| repo.name == repo_name && repo.is_enabled())
    }

    pub fn enabled_repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter().filter(|repo| repo.is_enabled())
    }

    pub fn skip_sync_dependencies(&self) -> bool {
        self.sync_skip_dependencies.unwrap_or(true)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(
            self.progress_interval
                .unwrap_or(DEFAULT_PROGRESS_INTERVAL_MS),
        )
    }

    pub fn refresh_progress_interval(&self) -> Duration {
        Duration::from_millis(
            self.refresh_progress_interval
                .unwrap_or(DEFAULT_REFRESH_PROGRESS_INTERVAL_MS),
        )
    }

    pub fn save(&self) -> Result<()> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, serialized)?;
        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }
}

pub fn generate_default_config() -> Result<()> {
    let config_path = CONFIG_PATH.read().unwrap().to_path_buf();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    Config::default_config().save()?;
    info!(
        "Default configuration file generated at: {}",
        config_path.display()
    );
    Ok(())
}
