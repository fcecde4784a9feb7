//! TOML catalog of distributions, releases and downloadable images.
//!
//! A catalog is one file or a directory of `*.toml` files. Each file holds
//! a `[distros.<name>]` table with `[[distros.<name>.releases]]` and, per
//! release, `[[distros.<name>.releases.downloads]]`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::job::{ManifestSources, SignerIdentity, VerificationJob};
use crate::path_template::{self, TemplateVars};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    distros: BTreeMap<String, DistroEntry>,
}

#[derive(Debug, Deserialize)]
struct DistroEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    releases: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    number: String,
    codename: Option<String>,
    #[serde(default)]
    lts: bool,
    #[serde(default)]
    checksums: BTreeMap<String, ManifestSources>,
    signature_suffix: Option<String>,
    pgp: Option<SignerIdentity>,
    #[serde(default)]
    downloads: Vec<DownloadEntry>,
}

#[derive(Debug, Deserialize)]
struct DownloadEntry {
    label: String,
    arch: String,
    de: Option<String>,
    #[serde(default)]
    netboot: bool,
    target: Option<String>,
    url: String,
    filename: Option<String>,
}

/// One downloadable image, flattened out of distro and release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDefinition {
    pub distro: String,
    pub kind: String,
    pub label: String,
    pub release_number: String,
    pub codename: Option<String>,
    pub lts: bool,
    pub checksums: BTreeMap<String, ManifestSources>,
    pub signature_suffix: Option<String>,
    pub signer: Option<SignerIdentity>,
    pub arch: String,
    pub desktop_environment: Option<String>,
    pub netboot: bool,
    pub target: Option<String>,
    pub url: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Exists,
    NeedsDownload,
}

impl IsoDefinition {
    fn template_vars(&self) -> TemplateVars {
        let mut vars = TemplateVars::new();
        vars.set("distro", Some(&self.distro))
            .set("label", Some(&self.label))
            .set("number", Some(&self.release_number))
            .set("codename", self.codename.as_deref())
            .set("arch", Some(&self.arch))
            .set("de", self.desktop_environment.as_deref())
            .set("target", self.target.as_deref());
        vars
    }

    pub fn path(&self, path_format: &str) -> Result<PathBuf> {
        path_template::render(path_format, &self.template_vars())
            .with_context(|| format!("resolve path for {}", self.label))
    }

    pub fn status(&self, path_format: &str) -> Result<ImageStatus> {
        Ok(if self.path(path_format)?.is_file() {
            ImageStatus::Exists
        } else {
            ImageStatus::NeedsDownload
        })
    }

    pub fn to_job(&self, path_format: &str) -> Result<VerificationJob> {
        Ok(VerificationJob {
            label: self.label.clone(),
            artifact_path: self.path(path_format)?,
            source_url: self.url.clone(),
            checksum_manifests: self.checksums.clone(),
            signature_suffix: self.signature_suffix.clone(),
            signer: self.signer.clone(),
            artifact_filename_override: self.filename.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Lts,
    NonLts,
}

/// Selection criteria; empty lists match everything.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub kinds: Vec<String>,
    pub distros: Vec<String>,
    pub arches: Vec<String>,
    /// `"none"` matches images without a desktop environment.
    pub desktops: Vec<String>,
    pub targets: Vec<String>,
    pub support: Option<Support>,
}

fn allows(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|v| v == value)
}

impl Filters {
    pub fn matches(&self, def: &IsoDefinition) -> bool {
        allows(&self.kinds, &def.kind)
            && allows(&self.distros, &def.distro)
            && allows(&self.arches, &def.arch)
            && allows(
                &self.desktops,
                def.desktop_environment.as_deref().unwrap_or("none"),
            )
            && (self.targets.is_empty()
                || def.target.as_deref().is_some_and(|t| allows(&self.targets, t)))
            && match self.support {
                None => true,
                Some(Support::Lts) => def.lts,
                Some(Support::NonLts) => !def.lts,
            }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: Vec<IsoDefinition>,
}

impl Catalog {
    /// Load a catalog file, or every `*.toml` file of a directory in name order.
    pub fn load(path: &Path) -> Result<Self> {
        let mut catalog = Catalog::default();
        if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("read catalog dir {}", path.display()))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
                .collect();
            files.sort();
            for file in files {
                catalog.load_file(&file)?;
            }
        } else {
            catalog.load_file(path)?;
        }
        tracing::debug!(images = catalog.definitions.len(), "catalog loaded");
        Ok(catalog)
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        self.add_toml(&text)
            .with_context(|| format!("parse catalog {}", path.display()))
    }

    /// Add the images of one catalog document.
    pub fn add_toml(&mut self, text: &str) -> Result<()> {
        let file: CatalogFile = toml::from_str(text)?;
        for (distro, entry) in file.distros {
            for release in entry.releases {
                for dl in release.downloads {
                    self.definitions.push(IsoDefinition {
                        distro: distro.clone(),
                        kind: entry.kind.clone(),
                        label: dl.label,
                        release_number: release.number.clone(),
                        codename: release.codename.clone(),
                        lts: release.lts,
                        checksums: release.checksums.clone(),
                        signature_suffix: release.signature_suffix.clone(),
                        signer: release.pgp.clone(),
                        arch: dl.arch,
                        desktop_environment: dl.de,
                        netboot: dl.netboot,
                        target: dl.target,
                        url: dl.url,
                        filename: dl.filename,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn definitions(&self) -> &[IsoDefinition] {
        &self.definitions
    }

    pub fn select(&self, filters: &Filters) -> Vec<&IsoDefinition> {
        self.definitions.iter().filter(|d| filters.matches(d)).collect()
    }

    /// Verification jobs for the selected images, paths resolved with `path_format`.
    pub fn jobs(&self, filters: &Filters, path_format: &str) -> Result<Vec<VerificationJob>> {
        self.select(filters)
            .into_iter()
            .map(|d| d.to_job(path_format))
            .collect()
    }
}
