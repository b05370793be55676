pub mod bytes;
pub mod error;
pub mod lock;
pub mod path;
