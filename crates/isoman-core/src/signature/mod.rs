//! Signature stage: check each cached manifest against its detached
//! signature and escalate unknown signers to a [`TrustPrompt`].
//!
//! An invalid signature always ends the run; the prompt is never consulted
//! for it.

mod gpg;
mod trust;

pub use gpg::GpgTool;
pub use trust::{FixedDecision, LinePrompt, TrustDecision, TrustPrompt, UnknownSigner};

use std::path::Path;

use crate::cache::ChecksumCache;
use crate::error::VerifyError;
use crate::fetch::SignaturePair;
use crate::progress::{ProgressSink, Stage, StageProgress};

/// Three-way classification from the external verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    Valid,
    /// The verifier could not locate the public key.
    UnknownSigner,
    /// Cryptographic mismatch.
    Invalid,
}

/// External trusted verifier. Anything that is not one of the three
/// statuses (tool missing, unreadable input) is an `Err`.
pub trait SignatureTool {
    fn verify(&self, signature: &Path, data: &Path) -> anyhow::Result<SignatureStatus>;

    /// Retrieve and import a public key into the local trust store.
    fn receive_key(&self, key_id: &str, keyserver: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVerdict {
    Verified,
    /// Unknown signer, key imported on request; accepted for this run.
    KeyImported,
    /// Unknown signer, accepted without verification on request.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOutcome {
    pub manifest_url: String,
    pub verdict: SignatureVerdict,
}

/// Verify every pair once, in order. Stops at the first fatal condition.
pub fn verify_signatures(
    pairs: &[SignaturePair],
    cache: &ChecksumCache,
    tool: &dyn SignatureTool,
    prompt: &mut dyn TrustPrompt,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<SignatureOutcome>, VerifyError> {
    let total = pairs.len();
    let mut outcomes = Vec::with_capacity(total);
    progress.report(StageProgress {
        stage: Stage::VerifySignatures,
        done: 0,
        total,
    });

    for (i, pair) in pairs.iter().enumerate() {
        let verdict = verify_pair(pair, cache, tool, prompt)?;
        tracing::debug!(manifest = %pair.manifest_url, ?verdict, "signature checked");
        outcomes.push(SignatureOutcome {
            manifest_url: pair.manifest_url.clone(),
            verdict,
        });
        progress.report(StageProgress {
            stage: Stage::VerifySignatures,
            done: i + 1,
            total,
        });
    }

    tracing::info!(count = outcomes.len(), "signatures checked");
    Ok(outcomes)
}

fn verify_pair(
    pair: &SignaturePair,
    cache: &ChecksumCache,
    tool: &dyn SignatureTool,
    prompt: &mut dyn TrustPrompt,
) -> Result<SignatureVerdict, VerifyError> {
    let manifest = cache.require(&pair.manifest_url)?;
    let signature = cache.require(&pair.signature_url)?;

    let status = tool
        .verify(&signature, &manifest)
        .map_err(|e| VerifyError::SignatureTool {
            manifest: pair.manifest_url.clone(),
            reason: format!("{e:#}"),
        })?;

    match status {
        SignatureStatus::Valid => Ok(SignatureVerdict::Verified),
        SignatureStatus::Invalid => Err(VerifyError::InvalidSignature {
            manifest: pair.manifest_url.clone(),
        }),
        SignatureStatus::UnknownSigner => {
            let ctx = UnknownSigner {
                manifest_url: &pair.manifest_url,
                signer: pair.signer.as_ref(),
            };
            match prompt.decide(&ctx) {
                TrustDecision::Abort => Err(VerifyError::Aborted {
                    manifest: pair.manifest_url.clone(),
                }),
                TrustDecision::Ignore => {
                    tracing::warn!(manifest = %pair.manifest_url, "accepting checksum file without signature check");
                    Ok(SignatureVerdict::Ignored)
                }
                TrustDecision::DownloadKey => {
                    let signer = pair.signer.as_ref().ok_or_else(|| VerifyError::MissingSigner {
                        manifest: pair.manifest_url.clone(),
                    })?;
                    tool.receive_key(&signer.key_id, &signer.keyserver)
                        .map_err(|e| VerifyError::KeyImport {
                            key_id: signer.key_id.clone(),
                            keyserver: signer.keyserver.clone(),
                            reason: format!("{e:#}"),
                        })?;
                    tracing::info!(key = %signer.key_id, keyserver = %signer.keyserver, "public key imported");
                    Ok(SignatureVerdict::KeyImported)
                }
            }
        }
    }
}
