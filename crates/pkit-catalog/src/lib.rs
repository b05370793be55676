//! Package catalogs: one installed repository plus any number of remote
//! repositories, and the transaction primitives acting on them.

pub mod error;
pub mod fetch;
pub mod fs;
pub mod memory;
mod plan;
pub mod record;
pub mod traits;

pub use error::{CatalogError, CatalogResult};
pub use fs::FsCatalog;
pub use memory::{CatalogStats, FailStage, MemoryCatalog};
pub use record::{PackageRecord, PackageRef, RepositoryRef};
pub use traits::{
    Catalog, ProgressFn, TransactionFlags, TransactionHandle, TransactionKind,
};
