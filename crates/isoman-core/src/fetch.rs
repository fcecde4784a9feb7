//! Manifest fetch stage.
//!
//! Planning is a pure function of the job list: every distinct manifest URL
//! appears once, and so does its detached signature as soon as any job that
//! references the manifest declares a suffix. Fetching then skips anything
//! the cache already holds.

use std::collections::{HashMap, HashSet};

use crate::cache::ChecksumCache;
use crate::error::VerifyError;
use crate::job::{SignerIdentity, VerificationJob};
use crate::progress::{ProgressSink, Stage, StageProgress};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchResource {
    Manifest { url: String },
    Signature { url: String, for_manifest: String },
}

impl FetchResource {
    pub fn url(&self) -> &str {
        match self {
            FetchResource::Manifest { url } | FetchResource::Signature { url, .. } => url,
        }
    }
}

/// A manifest together with its detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePair {
    pub manifest_url: String,
    pub signature_url: String,
    pub signer: Option<SignerIdentity>,
}

/// Deduplicated work list for a run.
#[derive(Debug, Clone, Default)]
pub struct FetchPlan {
    resources: Vec<FetchResource>,
    signers: HashMap<String, SignerIdentity>,
}

impl FetchPlan {
    pub fn from_jobs(jobs: &[VerificationJob]) -> Self {
        let mut seen = HashSet::new();
        let mut signed: HashMap<&str, String> = HashMap::new();
        let mut resources = Vec::new();
        let mut signers = HashMap::new();

        for job in jobs {
            for sources in job.checksum_manifests.values() {
                for url in sources.urls() {
                    if seen.insert(url.as_str()) {
                        resources.push(FetchResource::Manifest { url: url.clone() });
                    }
                    if let Some(sig) = job.signature_url(url) {
                        match signed.get(url.as_str()) {
                            None => {
                                signed.insert(url.as_str(), sig.clone());
                                resources.push(FetchResource::Signature {
                                    url: sig,
                                    for_manifest: url.clone(),
                                });
                            }
                            Some(first) if *first != sig => tracing::warn!(
                                manifest = %url,
                                kept = %first,
                                ignored = %sig,
                                job = %job.label,
                                "jobs declare different signatures for one checksum file"
                            ),
                            Some(_) => {}
                        }
                    }
                    if let Some(signer) = &job.signer {
                        signers
                            .entry(url.clone())
                            .or_insert_with(|| signer.clone());
                    }
                }
            }
        }

        Self { resources, signers }
    }

    pub fn resources(&self) -> &[FetchResource] {
        &self.resources
    }

    pub fn signer_for(&self, manifest_url: &str) -> Option<&SignerIdentity> {
        self.signers.get(manifest_url)
    }

    /// Every manifest that has a signature, in plan order.
    pub fn signature_pairs(&self) -> Vec<SignaturePair> {
        self.resources
            .iter()
            .filter_map(|r| match r {
                FetchResource::Signature { url, for_manifest } => Some(SignaturePair {
                    manifest_url: for_manifest.clone(),
                    signature_url: url.clone(),
                    signer: self.signer_for(for_manifest).cloned(),
                }),
                FetchResource::Manifest { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub cached: usize,
}

/// Retrieve every planned resource that is not cached yet. The first
/// failure aborts the stage.
pub fn fetch_all(
    plan: &FetchPlan,
    cache: &ChecksumCache,
    transport: &dyn Transport,
    progress: &mut dyn ProgressSink,
) -> Result<FetchSummary, VerifyError> {
    let total = plan.resources.len();
    let mut summary = FetchSummary::default();
    progress.report(StageProgress {
        stage: Stage::FetchManifests,
        done: 0,
        total,
    });

    for (i, resource) in plan.resources.iter().enumerate() {
        let url = resource.url();
        if cache.contains(url) {
            tracing::debug!(url, "checksum file cached");
            summary.cached += 1;
        } else {
            let dest = cache.path_for(url);
            transport
                .fetch_to(url, &dest)
                .map_err(|source| VerifyError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            tracing::debug!(url, dest = %dest.display(), "checksum file fetched");
            summary.downloaded += 1;
        }
        progress.report(StageProgress {
            stage: Stage::FetchManifests,
            done: i + 1,
            total,
        });
    }

    tracing::info!(
        downloaded = summary.downloaded,
        cached = summary.cached,
        "checksum files ready"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::tests::job;
    use crate::progress::NoProgress;
    use crate::transport::FetchError;
    use std::cell::RefCell;
    use std::path::Path;

    /// Serves a fixed body for any URL and records requests.
    #[derive(Default)]
    struct RecordingTransport {
        requests: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Transport for RecordingTransport {
        fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            if self.fail {
                return Err(FetchError::Http(404));
            }
            std::fs::write(dest, url).map_err(FetchError::Storage)?;
            Ok(url.len() as u64)
        }
    }

    fn signed(mut j: VerificationJob, key: &str) -> VerificationJob {
        j.signature_suffix = Some(".gpg".into());
        j.signer = Some(SignerIdentity {
            key_id: key.into(),
            keyserver: "keyserver.ubuntu.com".into(),
        });
        j
    }

    #[test]
    fn shared_manifest_planned_once() {
        let jobs: Vec<_> = (0..5)
            .map(|i| signed(job(&format!("job{i}"), &[("sha1", &["https://m/SHA1SUMS"])]), "AA"))
            .collect();
        let plan = FetchPlan::from_jobs(&jobs);
        assert_eq!(
            plan.resources(),
            [
                FetchResource::Manifest {
                    url: "https://m/SHA1SUMS".into()
                },
                FetchResource::Signature {
                    url: "https://m/SHA1SUMS.gpg".into(),
                    for_manifest: "https://m/SHA1SUMS".into()
                },
            ]
        );
        assert_eq!(plan.signature_pairs().len(), 1);
    }

    #[test]
    fn every_algorithm_and_url_is_planned() {
        let j = job(
            "multi",
            &[
                ("md5", &["https://m/amd64/MD5SUMS", "https://m/i386/MD5SUMS"]),
                ("sha1", &["https://m/SHA1SUMS"]),
            ],
        );
        let plan = FetchPlan::from_jobs(&[j]);
        let urls: Vec<_> = plan.resources().iter().map(|r| r.url()).collect();
        assert_eq!(
            urls,
            ["https://m/amd64/MD5SUMS", "https://m/i386/MD5SUMS", "https://m/SHA1SUMS"]
        );
        assert!(plan.signature_pairs().is_empty());
    }

    #[test]
    fn first_signer_wins() {
        let a = signed(job("a", &[("sha1", &["https://m/SHA1SUMS"])]), "FIRST");
        let b = signed(job("b", &[("sha1", &["https://m/SHA1SUMS"])]), "SECOND");
        let plan = FetchPlan::from_jobs(&[a, b]);
        assert_eq!(plan.signer_for("https://m/SHA1SUMS").unwrap().key_id, "FIRST");
        assert_eq!(
            plan.signature_pairs()[0].signer.as_ref().unwrap().key_id,
            "FIRST"
        );
    }

    #[test]
    fn later_job_can_add_the_signature() {
        let a = job("a", &[("sha1", &["https://m/SHA1SUMS"])]);
        let b = signed(job("b", &[("sha1", &["https://m/SHA1SUMS"])]), "BB");
        let plan = FetchPlan::from_jobs(&[a, b]);
        let pairs = plan.signature_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].manifest_url, "https://m/SHA1SUMS");
        assert_eq!(pairs[0].signature_url, "https://m/SHA1SUMS.gpg");
        assert_eq!(pairs[0].signer.as_ref().unwrap().key_id, "BB");
    }

    #[test]
    fn first_signature_suffix_is_kept() {
        let a = signed(job("a", &[("sha1", &["https://m/SHA1SUMS"])]), "AA");
        let mut b = signed(job("b", &[("sha1", &["https://m/SHA1SUMS"])]), "AA");
        b.signature_suffix = Some(".sign".into());
        let plan = FetchPlan::from_jobs(&[a, b]);
        assert_eq!(plan.resources().len(), 2);
        assert_eq!(plan.signature_pairs()[0].signature_url, "https://m/SHA1SUMS.gpg");
    }

    #[test]
    fn cached_resources_are_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChecksumCache::open_at(dir.path()).unwrap();
        let jobs = [
            signed(job("a", &[("sha1", &["https://m/SHA1SUMS"])]), "AA"),
            signed(job("b", &[("sha1", &["https://m/SHA1SUMS"])]), "AA"),
        ];
        let plan = FetchPlan::from_jobs(&jobs);
        let transport = RecordingTransport::default();

        let first = fetch_all(&plan, &cache, &transport, &mut NoProgress).unwrap();
        assert_eq!(first, FetchSummary { downloaded: 2, cached: 0 });
        let second = fetch_all(&plan, &cache, &transport, &mut NoProgress).unwrap();
        assert_eq!(second, FetchSummary { downloaded: 0, cached: 2 });

        assert_eq!(
            *transport.requests.borrow(),
            ["https://m/SHA1SUMS", "https://m/SHA1SUMS.gpg"]
        );
        assert_eq!(
            std::fs::read_to_string(cache.path_for("https://m/SHA1SUMS.gpg")).unwrap(),
            "https://m/SHA1SUMS.gpg"
        );
    }

    #[test]
    fn transport_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChecksumCache::open_at(dir.path()).unwrap();
        let plan = FetchPlan::from_jobs(&[job("a", &[("md5", &["https://m/MD5SUMS", "https://m/B"])])]);
        let transport = RecordingTransport {
            fail: true,
            ..Default::default()
        };
        let err = fetch_all(&plan, &cache, &transport, &mut NoProgress).unwrap_err();
        match err {
            VerifyError::Transport { url, .. } => assert_eq!(url, "https://m/MD5SUMS"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(transport.requests.borrow().len(), 1);
        assert!(!cache.contains("https://m/MD5SUMS"));
    }

    #[test]
    fn progress_counts_each_resource() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChecksumCache::open_at(dir.path()).unwrap();
        let plan = FetchPlan::from_jobs(&[signed(job("a", &[("sha1", &["https://m/S"])]), "AA")]);
        let mut seen = Vec::new();
        let mut sink = |p: StageProgress| seen.push((p.done, p.total));
        fetch_all(&plan, &cache, &RecordingTransport::default(), &mut sink).unwrap();
        assert_eq!(seen, [(0, 2), (1, 2), (2, 2)]);
    }
}
