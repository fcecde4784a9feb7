//! `iso-manager list`: selected images and whether they are on disk.

use anyhow::Result;
use isoman_core::catalog::{Catalog, Filters, ImageStatus};

pub fn run_list(catalog: &Catalog, filters: &Filters, path_format: &str) -> Result<()> {
    let defs = catalog.select(filters);
    if defs.is_empty() {
        println!("No images match the selection.");
        return Ok(());
    }
    println!("{:<10} {:<28} {:<8} {:<10} {}", "DISTRO", "LABEL", "ARCH", "STATUS", "PATH");
    for def in defs {
        let status = match def.status(path_format)? {
            ImageStatus::Exists => "present",
            ImageStatus::NeedsDownload => "missing",
        };
        println!(
            "{:<10} {:<28} {:<8} {:<10} {}",
            def.distro,
            def.label,
            def.arch,
            status,
            def.path(path_format)?.display()
        );
    }
    Ok(())
}
