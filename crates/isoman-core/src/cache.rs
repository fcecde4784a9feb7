//! On-disk checksum manifest cache.
//!
//! Each remote resource (manifest or detached signature) is stored under
//! the SHA-1 hex digest of its URL, so entries survive across runs and are
//! never re-fetched. Nothing here expires entries. Entries are written by the
//! fetch stage through [`crate::transport::Transport::fetch_to`], which
//! renames a complete `.part` file into place, so a present entry is whole.

use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::APP_NAME;
use crate::error::VerifyError;

/// Handle to the cache directory. Opened once per run; it is a plain
/// directory, so there is nothing to close.
#[derive(Debug, Clone)]
pub struct ChecksumCache {
    dir: PathBuf,
}

/// Stable cache key for a URL.
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha1::digest(url.as_bytes()))
}

impl ChecksumCache {
    /// `~/.cache/iso-manager/checksums`
    pub fn open_default() -> anyhow::Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME)?;
        let dir = xdg_dirs.create_cache_directory("checksums")?;
        Ok(Self { dir })
    }

    pub fn open_at(dir: &Path) -> Result<Self, VerifyError> {
        fs::create_dir_all(dir).map_err(|source| VerifyError::Cache {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.path_for(url).is_file()
    }

    /// Path of a cached entry, or `NotCached`.
    pub fn require(&self, url: &str) -> Result<PathBuf, VerifyError> {
        let path = self.path_for(url);
        if path.is_file() {
            Ok(path)
        } else {
            Err(VerifyError::NotCached {
                url: url.to_string(),
            })
        }
    }
}

#[cfg(test)]
impl ChecksumCache {
    /// Put `contents` in place for `url` without going through a transport.
    pub(crate) fn seed(&self, url: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.path_for(url);
        fs::write(&path, contents)?;
        Ok(path)
    }
}
