//! Checksum command: print the digest of a local file.

use anyhow::Result;
use isoman_core::digest::{self, DigestAlgorithm};
use std::path::Path;

/// Print `<hex>  <path>`, the format checksum manifests use.
pub fn run_checksum(path: &Path, algorithm: &str) -> Result<()> {
    let algorithm: DigestAlgorithm = algorithm.parse()?;
    let digest = digest::hash_file(path, algorithm)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
