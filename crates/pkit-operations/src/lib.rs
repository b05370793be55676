pub mod context;
pub mod progress;
pub mod types;
pub mod utils;

pub mod install;
pub mod remove;
pub mod repos;
pub mod search;
pub mod sync;

pub use context::PkitContext;
pub use types::*;
