use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color;

pub struct Icons;

impl Icons {
    pub const INSTALLED: &str = "✓";
    pub const NOT_INSTALLED: &str = "○";
    pub const PACKAGE: &str = "📦";
}

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));
pub static PROGRESS: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn progress_enabled() -> bool {
    *PROGRESS.read().unwrap()
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap();
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Splits a `name;version;arch;repository` id into display parts.
pub fn split_package_id(package_id: &str) -> (&str, &str, &str) {
    let mut parts = package_id.split(';');
    let name = parts.next().unwrap_or_default();
    let version = parts.next().unwrap_or_default();
    let repo = parts.nth(1).unwrap_or_default();
    (name, version, repo)
}

#[cfg(test)]
mod tests {
    use nu_ansi_term::Color::Red;

    use super::*;

    #[test]
    fn test_split_package_id() {
        assert_eq!(split_package_id("foo;1.0;x86_64;core"), ("foo", "1.0", "core"));
        assert_eq!(split_package_id("foo;1.0;;local"), ("foo", "1.0", "local"));
        assert_eq!(split_package_id("foo"), ("foo", "", ""));
    }

    #[test]
    fn test_colored_respects_color_flag() {
        *COLOR.write().unwrap() = false;
        assert_eq!(Colored(Red, "x").to_string(), "x");
        *COLOR.write().unwrap() = true;
        assert_ne!(Colored(Red, "x").to_string(), "x");
    }
}
