//! Checksum manifest parsing (`SHA256SUMS`, `MD5SUMS`, ...).
//!
//! Accepts the coreutils layout `<hex> [*| ]<filename>` and the BSD layout
//! `SHA256 (<filename>) = <hex>`. Digests are stored lowercase.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::VerifyError;

/// Filename -> lowercase hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestTable {
    entries: BTreeMap<String, String>,
}

impl ManifestTable {
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_bsd_line(line).or_else(|| parse_gnu_line(line)) {
                Some((name, digest)) => {
                    entries.insert(name.to_string(), digest.to_ascii_lowercase());
                }
                None => tracing::debug!(line = lineno + 1, "skipping malformed manifest line"),
            }
        }
        Self { entries }
    }

    pub fn from_file(path: &Path) -> Result<Self, VerifyError> {
        let bytes = fs::read(path).map_err(|source| VerifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold `other` into this table. The same filename with the same digest
    /// is fine; the same filename with a different digest fails closed.
    pub fn merge(&mut self, other: ManifestTable, label: &str) -> Result<(), VerifyError> {
        for (name, digest) in other.entries {
            match self.entries.get(&name) {
                Some(existing) if *existing != digest => {
                    return Err(VerifyError::ConflictingEntries {
                        label: label.to_string(),
                        filename: name,
                        first: existing.clone(),
                        second: digest,
                    });
                }
                Some(_) => {}
                None => {
                    self.entries.insert(name, digest);
                }
            }
        }
        Ok(())
    }
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// `<hex><ws><marker?><filename>`; the marker is `*` (binary) or a space (text).
fn parse_gnu_line(line: &str) -> Option<(&str, &str)> {
    let (digest, rest) = line.split_once(char::is_whitespace)?;
    let digest = digest.strip_prefix('\\').unwrap_or(digest);
    if !is_hex(digest) {
        return None;
    }
    let rest = rest.trim_start();
    let name = rest.strip_prefix('*').unwrap_or(rest);
    if name.is_empty() {
        return None;
    }
    Some((name, digest))
}

/// `ALG (<filename>) = <hex>`
fn parse_bsd_line(line: &str) -> Option<(&str, &str)> {
    let (head, digest) = line.rsplit_once(") = ")?;
    let (_alg, name) = head.split_once(" (")?;
    let digest = digest.trim();
    if name.is_empty() || !is_hex(digest) {
        return None;
    }
    Some((name, digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_and_text_markers() {
        let t = ManifestTable::parse(
            "abc123 *file.iso\n\
             DEF456  other.iso\n\
             \n\
             # comment\n",
        );
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("file.iso"), Some("abc123"));
        assert_eq!(t.get("other.iso"), Some("def456"));
    }

    #[test]
    fn crlf_and_spaces_in_names() {
        let t = ManifestTable::parse("0a1b  ubuntu 22.04 desktop.iso\r\n");
        assert_eq!(t.get("ubuntu 22.04 desktop.iso"), Some("0a1b"));
    }

    #[test]
    fn bsd_layout() {
        let t = ManifestTable::parse("SHA256 (Fedora-Workstation-Live-x86_64-39.iso) = ABCDEF01\n");
        assert_eq!(t.get("Fedora-Workstation-Live-x86_64-39.iso"), Some("abcdef01"));
    }

    #[test]
    fn malformed_lines_skipped() {
        let t = ManifestTable::parse("not-a-digest file.iso\nabc123\n-----BEGIN PGP SIGNATURE-----\n");
        assert!(t.is_empty());
    }

    #[test]
    fn merge_disjoint_manifests() {
        let mut t = ManifestTable::parse("aa *amd64.iso\n");
        t.merge(ManifestTable::parse("bb *i386.iso\n"), "job").unwrap();
        assert_eq!(t.get("amd64.iso"), Some("aa"));
        assert_eq!(t.get("i386.iso"), Some("bb"));
    }

    #[test]
    fn merge_identical_duplicate_is_fine() {
        let mut t = ManifestTable::parse("aa *x.iso\n");
        t.merge(ManifestTable::parse("AA *x.iso\n"), "job").unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn merge_conflict_fails_closed() {
        let mut t = ManifestTable::parse("aa *x.iso\n");
        let err = t.merge(ManifestTable::parse("bb *x.iso\n"), "job").unwrap_err();
        match err {
            VerifyError::ConflictingEntries { filename, first, second, .. } => {
                assert_eq!(filename, "x.iso");
                assert_eq!(first, "aa");
                assert_eq!(second, "bb");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
