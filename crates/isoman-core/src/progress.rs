//! Per-stage progress reporting.
//!
//! Purely observational: stages report how many items of their work list
//! are done, the CLI turns that into a status line.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchManifests,
    VerifySignatures,
    VerifyHashes,
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::FetchManifests => "Downloading checksum files",
            Stage::VerifySignatures => "Verifying PGP signatures",
            Stage::VerifyHashes => "Verifying checksums",
            Stage::Download => "Downloading images",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProgress {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
}

impl StageProgress {
    pub fn is_finished(&self) -> bool {
        self.done >= self.total
    }
}

pub trait ProgressSink {
    fn report(&mut self, progress: StageProgress);
}

impl<F: FnMut(StageProgress)> ProgressSink for F {
    fn report(&mut self, progress: StageProgress) {
        self(progress)
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: StageProgress) {}
}
