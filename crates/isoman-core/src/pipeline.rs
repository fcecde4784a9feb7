//! Verification pipeline: fetch manifests, verify signatures, verify hashes.
//!
//! Stages run strictly in order over the whole job list; a stage that fails
//! ends the run before the next one starts.

use crate::cache::ChecksumCache;
use crate::error::VerifyError;
use crate::fetch::{self, FetchPlan, FetchSummary};
use crate::hash_check::{self, HashOutcome};
use crate::job::VerificationJob;
use crate::progress::ProgressSink;
use crate::signature::{self, SignatureOutcome, SignatureTool, SignatureVerdict, TrustPrompt};
use crate::transport::Transport;

/// Result of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub fetch: FetchSummary,
    pub signatures: Vec<SignatureOutcome>,
    pub hashes: Vec<HashOutcome>,
}

impl RunReport {
    pub fn verified_images(&self) -> usize {
        self.hashes
            .iter()
            .filter(|h| matches!(h, HashOutcome::Verified { .. }))
            .count()
    }

    /// Manifests accepted without a verified signature.
    pub fn unverified_manifests(&self) -> impl Iterator<Item = &str> {
        self.signatures
            .iter()
            .filter(|s| s.verdict == SignatureVerdict::Ignored)
            .map(|s| s.manifest_url.as_str())
    }
}

pub struct Pipeline<'a> {
    cache: &'a ChecksumCache,
    transport: &'a dyn Transport,
    tool: &'a dyn SignatureTool,
    prompt: &'a mut dyn TrustPrompt,
    preference: Vec<String>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        cache: &'a ChecksumCache,
        transport: &'a dyn Transport,
        tool: &'a dyn SignatureTool,
        prompt: &'a mut dyn TrustPrompt,
    ) -> Self {
        Self {
            cache,
            transport,
            tool,
            prompt,
            preference: vec!["sha1".to_string(), "md5".to_string()],
        }
    }

    /// Digest algorithms in order of preference.
    pub fn with_preference(mut self, preference: Vec<String>) -> Self {
        self.preference = preference;
        self
    }

    pub fn run(
        &mut self,
        jobs: &[VerificationJob],
        progress: &mut dyn ProgressSink,
    ) -> Result<RunReport, VerifyError> {
        let plan = FetchPlan::from_jobs(jobs);
        tracing::info!(
            jobs = jobs.len(),
            resources = plan.resources().len(),
            "starting verification"
        );

        let fetch = fetch::fetch_all(&plan, self.cache, self.transport, progress)?;
        let signatures = signature::verify_signatures(
            &plan.signature_pairs(),
            self.cache,
            self.tool,
            &mut *self.prompt,
            progress,
        )?;
        let hashes = hash_check::verify_hashes(jobs, self.cache, &self.preference, progress)?;

        Ok(RunReport {
            fetch,
            signatures,
            hashes,
        })
    }
}
