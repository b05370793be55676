//! Fetching repository package lists.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use pkit_utils::bytes::format_bytes;
use tracing::debug;
use ureq::{
    http::{header::CONTENT_LENGTH, Response},
    Agent, Body,
};

use crate::{
    error::{CatalogError, CatalogResult, ErrorContext},
    record::PackageRecord,
    traits::ProgressFn,
};

static AGENT: LazyLock<Agent> = LazyLock::new(|| {
    Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(60)))
        .user_agent(concat!("pkit/", env!("CARGO_PKG_VERSION")))
        .build()
        .into()
});

/// Where a package list is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Http(String),
    Path(PathBuf),
}

impl Source {
    pub fn parse(url: &str) -> Self {
        if url.starts_with("http://") || url.starts_with("https://") {
            Source::Http(url.to_string())
        } else if let Some(path) = url.strip_prefix("file://") {
            Source::Path(PathBuf::from(path))
        } else {
            Source::Path(PathBuf::from(url))
        }
    }
}

/// True when `dest` is at least as new as a filesystem `source`.
pub fn is_up_to_date(source: &Source, dest: &Path) -> bool {
    let Source::Path(src) = source else {
        return false;
    };
    let modified = |p: &Path| p.metadata().and_then(|m| m.modified()).ok();
    match (modified(src), modified(dest)) {
        (Some(src), Some(dest)) => dest >= src,
        _ => false,
    }
}

fn content_length(resp: &Response<Body>) -> u64 {
    resp.headers()
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|len| len.parse::<u64>().ok())
        .unwrap_or(0)
}

fn copy_with_progress(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    total: u64,
    on_progress: ProgressFn<'_>,
    action: &str,
) -> CatalogResult<u64> {
    let mut buffer = [0u8; 8192];
    let mut copied = 0u64;

    loop {
        let n = reader
            .read(&mut buffer)
            .with_context(|| format!("reading {action}"))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buffer[..n])
            .with_context(|| format!("writing {action}"))?;
        copied += n as u64;

        if total > 0 {
            on_progress(((copied * 100) / total).min(100) as u8);
        }
    }

    Ok(copied)
}

/// Downloads or copies the package list at `source` into `dest`.
///
/// The list is written to a `.part` file, validated, then renamed into place so a
/// failed refresh never leaves a truncated list behind.
pub fn fetch_list(source: &Source, dest: &Path, on_progress: ProgressFn<'_>) -> CatalogResult<usize> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let part = dest.with_extension("json.part");
    let mut file =
        File::create(&part).with_context(|| format!("creating temporary file {}", part.display()))?;

    let copied = match source {
        Source::Http(url) => {
            debug!(url = %url, "fetching package list");
            let resp = AGENT.get(url).call()?;
            if !resp.status().is_success() {
                return Err(CatalogError::FetchFailed {
                    url: url.clone(),
                    status: resp.status().as_u16(),
                });
            }
            let total = content_length(&resp);
            let mut reader = resp.into_body().into_reader();
            copy_with_progress(&mut reader, &mut file, total, on_progress, url)?
        }
        Source::Path(path) => {
            debug!(path = %path.display(), "copying package list");
            let mut src =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let total = src.metadata().map(|m| m.len()).unwrap_or(0);
            copy_with_progress(
                &mut src,
                &mut file,
                total,
                on_progress,
                &path.display().to_string(),
            )?
        }
    };
    drop(file);

    let content =
        fs::read(&part).with_context(|| format!("reading temporary file {}", part.display()))?;
    let records: Vec<PackageRecord> = match serde_json::from_slice(&content) {
        Ok(records) => records,
        Err(err) => {
            let _ = fs::remove_file(&part);
            return Err(err.into());
        }
    };

    fs::rename(&part, dest)
        .with_context(|| format!("moving {} into place", dest.display()))?;
    on_progress(100);

    debug!(
        size = %format_bytes(copied, 2),
        packages = records.len(),
        "package list updated"
    );
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://repo.example/core/packages.json"),
            Source::Http("https://repo.example/core/packages.json".to_string())
        );
        assert_eq!(
            Source::parse("file:///srv/core.json"),
            Source::Path(PathBuf::from("/srv/core.json"))
        );
        assert_eq!(
            Source::parse("/srv/core.json"),
            Source::Path(PathBuf::from("/srv/core.json"))
        );
    }

    #[test]
    fn test_fetch_from_path() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("upstream.json");
        fs::write(&src, r#"[{"name": "foo", "version": "1.0"}]"#).unwrap();
        let dest = dir.path().join("core").join("packages.json");

        let seen = Mutex::new(Vec::new());
        let count = fetch_list(&Source::Path(src.clone()), &dest, &|p| {
            seen.lock().unwrap().push(p)
        })
        .unwrap();

        assert_eq!(count, 1);
        assert!(dest.exists());
        assert_eq!(seen.lock().unwrap().last(), Some(&100));
        assert!(is_up_to_date(&Source::Path(src), &dest));
    }

    #[test]
    fn test_invalid_list_is_not_installed() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("broken.json");
        fs::write(&src, "not json").unwrap();
        let dest = dir.path().join("packages.json");

        let result = fetch_list(&Source::Path(src), &dest, &|_| {});
        assert!(matches!(result, Err(CatalogError::JsonError(_))));
        assert!(!dest.exists());
        assert!(!dest.with_extension("json.part").exists());
    }

    #[test]
    fn test_http_source_is_never_up_to_date() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("packages.json");
        fs::write(&dest, "[]").unwrap();
        assert!(!is_up_to_date(
            &Source::Http("http://repo.example/list.json".to_string()),
            &dest
        ));
    }
}
