//! `iso-manager download`: fetch images that are not on disk yet.

use anyhow::Result;
use isoman_core::catalog::{Catalog, Filters};
use isoman_core::config::IsoManagerConfig;
use isoman_core::download::download_jobs;
use isoman_core::retry::RetryPolicy;
use isoman_core::transport::CurlTransport;

use super::stderr_progress;

pub fn run_download(
    catalog: &Catalog,
    filters: &Filters,
    path_format: &str,
    cfg: &IsoManagerConfig,
    force: bool,
) -> Result<()> {
    let jobs = catalog.jobs(filters, path_format)?;
    let transport = CurlTransport::new(&cfg.transfer, RetryPolicy::from(&cfg.retry));
    let summary = download_jobs(&jobs, &transport, force, &mut stderr_progress())?;
    println!(
        "Downloaded {} image(s) ({} bytes), {} already present.",
        summary.downloaded, summary.bytes, summary.skipped
    );
    Ok(())
}
