use miette::Diagnostic;
use pkit_utils::error::PathError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(pkit_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(pkit_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(pkit_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Invalid repository name: {0}")]
    #[diagnostic(
        code(pkit_config::invalid_repository),
        help("Repository names may not be empty or contain '/' or ';'")
    )]
    InvalidRepository(String),

    #[error("Reserved repository name 'local' cannot be used")]
    #[diagnostic(
        code(pkit_config::reserved_repo_name),
        help("'local' names the installed-packages database; choose a different name")
    )]
    ReservedRepositoryName,

    #[error("Duplicate repository name: {0}")]
    #[diagnostic(
        code(pkit_config::duplicate_repo),
        help("Each repository must have a unique name")
    )]
    DuplicateRepositoryName(String),

    #[error("Progress interval must be greater than zero")]
    #[diagnostic(code(pkit_config::progress_interval))]
    InvalidProgressInterval,

    #[error("IO error: {0}")]
    #[diagnostic(code(pkit_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
