pub mod config;
pub mod error;
pub mod repository;

#[cfg(test)]
mod test_utils;
