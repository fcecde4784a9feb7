//! Sequential image downloader. Verification never triggers downloads; this
//! is the separate stage that puts images where jobs expect them.

use anyhow::{Context, Result};
use std::fs;

use crate::job::VerificationJob;
use crate::progress::{ProgressSink, Stage, StageProgress};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Download each job's image unless it is already on disk (or `force`).
pub fn download_jobs(
    jobs: &[VerificationJob],
    transport: &dyn Transport,
    force: bool,
    progress: &mut dyn ProgressSink,
) -> Result<DownloadSummary> {
    let total = jobs.len();
    let mut summary = DownloadSummary::default();
    progress.report(StageProgress {
        stage: Stage::Download,
        done: 0,
        total,
    });

    for (i, job) in jobs.iter().enumerate() {
        let path = &job.artifact_path;
        if path.is_file() && !force {
            tracing::debug!(label = %job.label, "already downloaded");
            summary.skipped += 1;
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            tracing::info!(
                "[{}/{}] downloading {} to {}",
                i + 1,
                total,
                job.label,
                path.display()
            );
            let n = transport
                .fetch_to(&job.source_url, path)
                .with_context(|| format!("download {}", job.label))?;
            summary.downloaded += 1;
            summary.bytes += n;
        }
        progress.report(StageProgress {
            stage: Stage::Download,
            done: i + 1,
            total,
        });
    }
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

    #[derive(Default)]
    struct EchoTransport {
        requests: RefCell<Vec<String>>,
    }

    impl Transport for EchoTransport {
        fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            fs::write(dest, url).map_err(FetchError::Storage)?;
            Ok(url.len() as u64)
        }
    }

    #[test]
    fn downloads_missing_and_skips_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = job("a", &[]);
        a.artifact_path = dir.path().join("debian/a.iso");
        let mut b = job("b", &[]);
        b.artifact_path = dir.path().join("b.iso");
        fs::write(&b.artifact_path, b"old").unwrap();

        let t = EchoTransport::default();
        let s = download_jobs(&[a.clone(), b.clone()], &t, false, &mut NoProgress).unwrap();
        assert_eq!(s.downloaded, 1);
        assert_eq!(s.skipped, 1);
        assert_eq!(fs::read_to_string(&a.artifact_path).unwrap(), a.source_url);
        assert_eq!(fs::read(&b.artifact_path).unwrap(), b"old");

        let s = download_jobs(&[a, b.clone()], &t, true, &mut NoProgress).unwrap();
        assert_eq!(s.downloaded, 2);
        assert_eq!(fs::read_to_string(&b.artifact_path).unwrap(), b.source_url);
        assert_eq!(t.requests.borrow().len(), 3);
    }
}
