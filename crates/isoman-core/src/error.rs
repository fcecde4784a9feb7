//! Error taxonomy for the verification pipeline.
//!
//! Every variant is fatal to the run. Configuration gaps (a job with no
//! checksum manifests) are not errors; they surface as skipped outcomes.

use std::path::PathBuf;

use crate::transport::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Manifest, signature or key retrieval failed.
    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Key import from a keyserver failed.
    #[error("failed to receive key {key_id} from {keyserver}: {reason}")]
    KeyImport {
        key_id: String,
        keyserver: String,
        reason: String,
    },

    /// Reading or writing the checksum cache failed.
    #[error("checksum cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest is referenced by a job but was never fetched into the cache.
    #[error("checksum manifest {url} is not cached")]
    NotCached { url: String },

    /// Cryptographic signature mismatch. Never user-overridable.
    #[error("signature invalid for {manifest}")]
    InvalidSignature { manifest: String },

    /// The user chose to abort on an unknown signer.
    #[error("verification aborted at unknown signer for {manifest}")]
    Aborted { manifest: String },

    /// Key download requested but the job declared no signer identity.
    #[error("no signing key identity declared for {manifest}")]
    MissingSigner { manifest: String },

    /// The external signature tool could not produce a classification.
    #[error("signature check failed for {manifest}: {reason}")]
    SignatureTool { manifest: String, reason: String },

    #[error("checksum invalid for {label}: expected {expected}, got {actual}")]
    HashMismatch {
        label: String,
        expected: String,
        actual: String,
    },

    #[error("no checksum entry for {filename} (job {label})")]
    MissingEntry { label: String, filename: String },

    /// Two merged manifests disagree on the digest of one file.
    #[error("conflicting checksum entries for {filename} (job {label}): {first} vs {second}")]
    ConflictingEntries {
        label: String,
        filename: String,
        first: String,
        second: String,
    },

    #[error("hash function not supported: {name}")]
    UnsupportedAlgorithm { name: String },

    #[error("cannot derive checksum filename for {label}")]
    NoFilename { label: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let e = VerifyError::InvalidSignature {
            manifest: "https://example.com/SHA256SUMS".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "signature invalid for https://example.com/SHA256SUMS"
        );

        let e = VerifyError::HashMismatch {
            label: "Debian 12 netinst".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(e.to_string().starts_with("checksum invalid for Debian 12 netinst"));
    }
}
