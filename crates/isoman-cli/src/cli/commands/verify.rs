//! `iso-manager verify`: run the verification pipeline over selected images.

use anyhow::Result;
use isoman_core::cache::ChecksumCache;
use isoman_core::catalog::{Catalog, Filters};
use isoman_core::config::IsoManagerConfig;
use isoman_core::hash_check::HashOutcome;
use isoman_core::pipeline::Pipeline;
use isoman_core::retry::RetryPolicy;
use isoman_core::signature::{FixedDecision, GpgTool, LinePrompt, TrustDecision, TrustPrompt};
use isoman_core::transport::CurlTransport;

use super::stderr_progress;
use crate::cli::OnUnknownKey;

fn trust_prompt(mode: OnUnknownKey) -> Box<dyn TrustPrompt> {
    match mode {
        OnUnknownKey::Prompt => Box::new(LinePrompt::new(
            std::io::stdin().lock(),
            std::io::stderr(),
        )),
        OnUnknownKey::Download => Box::new(FixedDecision(TrustDecision::DownloadKey)),
        OnUnknownKey::Ignore => Box::new(FixedDecision(TrustDecision::Ignore)),
        OnUnknownKey::Abort => Box::new(FixedDecision(TrustDecision::Abort)),
    }
}

pub fn run_verify(
    catalog: &Catalog,
    filters: &Filters,
    path_format: &str,
    cfg: &IsoManagerConfig,
    on_unknown_key: OnUnknownKey,
) -> Result<()> {
    let jobs = catalog.jobs(filters, path_format)?;
    if jobs.is_empty() {
        println!("No images match the selection.");
        return Ok(());
    }

    let cache = match &cfg.cache_dir {
        Some(dir) => ChecksumCache::open_at(dir)?,
        None => ChecksumCache::open_default()?,
    };
    let transport = CurlTransport::new(&cfg.transfer, RetryPolicy::from(&cfg.retry));
    let tool = GpgTool::new(&cfg.gpg_program);
    let mut prompt = trust_prompt(on_unknown_key);

    let report = Pipeline::new(&cache, &transport, &tool, prompt.as_mut())
        .with_preference(cfg.preferred_algorithms.clone())
        .run(&jobs, &mut stderr_progress())?;

    for outcome in &report.hashes {
        match outcome {
            HashOutcome::Verified { label, algorithm } => {
                println!("ok       {label} ({algorithm})")
            }
            HashOutcome::NotDownloaded { label } => println!("missing  {label}"),
            HashOutcome::NoChecksums { label } => println!("skipped  {label} (no checksums)"),
        }
    }
    for manifest in report.unverified_manifests() {
        println!("warning: signature of {manifest} was not verified");
    }
    println!(
        "{} image(s) verified; {} checksum file(s) fetched, {} from cache.",
        report.verified_images(),
        report.fetch.downloaded,
        report.fetch.cached
    );
    Ok(())
}
