//! Test source discovery

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// One-shot sequence of test sources, sorted by path
#[derive(Debug)]
pub struct Discovery {
    sources: std::vec::IntoIter<PathBuf>,
}

impl Iterator for Discovery {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        self.sources.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.sources.size_hint()
    }
}

impl ExactSizeIterator for Discovery {}

/// Find test sources directly inside `dir`
///
/// Only regular files whose extension is exactly `extension` are returned.
/// Directory order varies across platforms, so the result is sorted.
pub fn discover(dir: &Path, extension: &str) -> Result<Discovery> {
    let unreadable = |error| Error::FixtureDirUnreadable {
        path: dir.to_path_buf(),
        error,
    };

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) && path.is_file() {
            sources.push(path);
        }
    }
    sources.sort();

    tracing::debug!(
        dir = %dir.display(),
        count = sources.len(),
        "Discovered test sources"
    );

    Ok(Discovery {
        sources: sources.into_iter(),
    })
}
