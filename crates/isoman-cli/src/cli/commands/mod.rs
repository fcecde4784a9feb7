//! CLI command handlers, one per file.

mod checksum;
mod completions;
mod download;
mod list;
mod verify;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use download::run_download;
pub use list::run_list;
pub use verify::run_verify;

use isoman_core::progress::StageProgress;
use std::io::Write;

/// Progress sink that rewrites one status line per stage on stderr.
fn stderr_progress() -> impl FnMut(StageProgress) {
    move |p: StageProgress| {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}: {}/{}", p.stage, p.done, p.total);
        if p.is_finished() {
            let _ = writeln!(err);
        }
        let _ = err.flush();
    }
}
