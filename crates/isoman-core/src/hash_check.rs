//! Hash stage: compare each downloaded artifact with its manifest entry.

use crate::cache::ChecksumCache;
use crate::digest::{self, DigestAlgorithm};
use crate::error::VerifyError;
use crate::job::VerificationJob;
use crate::manifest::ManifestTable;
use crate::progress::{ProgressSink, Stage, StageProgress};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashOutcome {
    Verified {
        label: String,
        algorithm: DigestAlgorithm,
    },
    /// Artifact not on disk yet; nothing to check.
    NotDownloaded { label: String },
    /// Job publishes no checksum manifests.
    NoChecksums { label: String },
}

impl HashOutcome {
    pub fn label(&self) -> &str {
        match self {
            HashOutcome::Verified { label, .. }
            | HashOutcome::NotDownloaded { label }
            | HashOutcome::NoChecksums { label } => label,
        }
    }
}

/// Verify every job whose artifact exists. The first mismatch, missing entry
/// or unsupported algorithm aborts the stage.
pub fn verify_hashes(
    jobs: &[VerificationJob],
    cache: &ChecksumCache,
    preference: &[String],
    progress: &mut dyn ProgressSink,
) -> Result<Vec<HashOutcome>, VerifyError> {
    let total = jobs.len();
    let mut outcomes = Vec::with_capacity(total);
    progress.report(StageProgress {
        stage: Stage::VerifyHashes,
        done: 0,
        total,
    });

    for (i, job) in jobs.iter().enumerate() {
        outcomes.push(verify_job(job, cache, preference)?);
        progress.report(StageProgress {
            stage: Stage::VerifyHashes,
            done: i + 1,
            total,
        });
    }

    let verified = outcomes
        .iter()
        .filter(|o| matches!(o, HashOutcome::Verified { .. }))
        .count();
    tracing::info!(verified, total, "checksums verified");
    Ok(outcomes)
}

pub fn verify_job(
    job: &VerificationJob,
    cache: &ChecksumCache,
    preference: &[String],
) -> Result<HashOutcome, VerifyError> {
    let label = job.label.clone();
    if !job.artifact_path.is_file() {
        tracing::debug!(%label, path = %job.artifact_path.display(), "not downloaded, skipping");
        return Ok(HashOutcome::NotDownloaded { label });
    }

    let Some((name, sources)) = job.select_algorithm(preference) else {
        tracing::warn!(%label, "no checksums available");
        return Ok(HashOutcome::NoChecksums { label });
    };
    let algorithm: DigestAlgorithm = name.parse()?;

    let mut table = ManifestTable::default();
    for url in sources.urls() {
        let path = cache.require(url)?;
        table.merge(ManifestTable::from_file(&path)?, &label)?;
    }

    let filename = job
        .checksum_filename()
        .ok_or_else(|| VerifyError::NoFilename { label: label.clone() })?;
    let expected = table.get(&filename).ok_or_else(|| VerifyError::MissingEntry {
        label: label.clone(),
        filename: filename.clone(),
    })?;

    let actual = digest::hash_file(&job.artifact_path, algorithm)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(VerifyError::HashMismatch {
            label,
            expected: expected.to_string(),
            actual,
        });
    }

    tracing::debug!(%label, %algorithm, "checksum ok");
    Ok(HashOutcome::Verified { label, algorithm })
}
