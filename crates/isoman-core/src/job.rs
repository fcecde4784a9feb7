//! Verification jobs: the read-only input of every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One manifest URL, or several (e.g. per-architecture hash lists).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestSources {
    One(String),
    Many(Vec<String>),
}

impl ManifestSources {
    pub fn urls(&self) -> &[String] {
        match self {
            ManifestSources::One(url) => std::slice::from_ref(url),
            ManifestSources::Many(urls) => urls,
        }
    }
}

/// Expected signer of a manifest, used to fetch the key on trust escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerIdentity {
    #[serde(rename = "id")]
    pub key_id: String,
    pub keyserver: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationJob {
    pub label: String,
    /// Where the downloaded image lives (or will live) on disk.
    pub artifact_path: PathBuf,
    /// Where the image is downloaded from.
    pub source_url: String,
    /// Digest algorithm name -> manifest URL(s).
    pub checksum_manifests: BTreeMap<String, ManifestSources>,
    /// Appended to a manifest URL to get its detached signature.
    pub signature_suffix: Option<String>,
    pub signer: Option<SignerIdentity>,
    /// Name to look up in the manifest instead of the URL's last segment.
    pub artifact_filename_override: Option<String>,
}

impl VerificationJob {
    /// Filename under which this artifact is listed in its manifest.
    pub fn checksum_filename(&self) -> Option<String> {
        self.artifact_filename_override
            .clone()
            .or_else(|| last_path_segment(&self.source_url))
    }

    /// Detached signature URL for one of this job's manifests.
    pub fn signature_url(&self, manifest_url: &str) -> Option<String> {
        self.signature_suffix
            .as_deref()
            .map(|suffix| format!("{manifest_url}{suffix}"))
    }

    /// Pick the digest algorithm to verify with: the first of `preference`
    /// this job publishes, else the first algorithm it lists at all.
    pub fn select_algorithm(&self, preference: &[String]) -> Option<(&str, &ManifestSources)> {
        preference
            .iter()
            .find_map(|name| self.checksum_manifests.get_key_value(name.as_str()))
            .or_else(|| self.checksum_manifests.iter().next())
            .map(|(name, sources)| (name.as_str(), sources))
    }
}

/// Last non-empty path segment of a URL, ignoring query and fragment.
fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}
