//! Scoped overrides of the `PKIT_*` variables read by [`crate::config`].

use std::ffi::OsString;

/// Sets or clears environment variables until dropped, then puts back what
/// was there before. Restoring happens on panic too.
///
/// Callers still need `#[serial]`: the environment is process-wide.
#[derive(Default)]
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
}

impl ScopedEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.remember(key);
        std::env::set_var(key, value);
        self
    }

    pub fn unset(mut self, key: &str) -> Self {
        self.remember(key);
        std::env::remove_var(key);
        self
    }

    /// Only the first value seen for a key is the one to restore.
    fn remember(&mut self, key: &str) {
        if !self.saved.iter().any(|(k, _)| k == key) {
            self.saved.push((key.to_string(), std::env::var_os(key)));
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, old) in self.saved.drain(..).rev() {
            match old {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_restores_previous_values() {
        std::env::set_var("PKIT_ROOT", "/before");
        std::env::remove_var("PKIT_DB");

        {
            let _env = ScopedEnv::new()
                .set("PKIT_ROOT", "/first")
                .set("PKIT_ROOT", "/second")
                .set("PKIT_DB", "/db");
            assert_eq!(std::env::var("PKIT_ROOT").unwrap(), "/second");
            assert_eq!(std::env::var("PKIT_DB").unwrap(), "/db");
        }

        assert_eq!(std::env::var("PKIT_ROOT").unwrap(), "/before");
        assert!(std::env::var("PKIT_DB").is_err());
        std::env::remove_var("PKIT_ROOT");
    }

    #[test]
    #[serial]
    fn test_restores_after_panic() {
        std::env::remove_var("PKIT_CONFIG");
        let result = std::panic::catch_unwind(|| {
            let _env = ScopedEnv::new().set("PKIT_CONFIG", "/tmp/pkit.toml");
            panic!("assertion inside the scope failed");
        });

        assert!(result.is_err());
        assert!(std::env::var("PKIT_CONFIG").is_err());
    }
}
