use error::PkitError;

pub mod error;
pub mod filter;
pub mod identity;
pub mod package_id;
pub mod progress;
pub mod query;
pub mod sequence;
pub mod transaction;

pub type PkitResult<T> = std::result::Result<T, PkitError>;
