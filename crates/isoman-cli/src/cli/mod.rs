//! CLI for iso-manager.

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use isoman_core::catalog::{Catalog, Filters, Support};
use isoman_core::config;
use std::path::PathBuf;

use commands::{run_checksum, run_completions, run_download, run_list, run_verify};

/// Top-level CLI for iso-manager.
#[derive(Debug, Parser)]
#[command(name = "iso-manager")]
#[command(about = "Download installer images and verify them against signed checksums", long_about = None)]
pub struct Cli {
    /// Catalog file or directory of `*.toml` catalogs (default: from config).
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Where images live, e.g. "~/ISO/{distro}/{label}.iso" (default: from config).
    #[arg(long, global = true, value_name = "FORMAT")]
    pub path_format: Option<String>,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Image selection. Repeat a flag or separate values with commas.
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Distribution type (e.g. linux).
    #[arg(long = "type", global = true, value_delimiter = ',')]
    pub kinds: Vec<String>,

    #[arg(long = "distro", global = true, value_delimiter = ',')]
    pub distros: Vec<String>,

    #[arg(long = "arch", global = true, value_delimiter = ',')]
    pub arches: Vec<String>,

    /// Desktop environment; "none" selects images without one.
    #[arg(long = "de", global = true, value_delimiter = ',')]
    pub desktops: Vec<String>,

    /// Target (e.g. desktop, server).
    #[arg(long = "target", global = true, value_delimiter = ',')]
    pub targets: Vec<String>,

    #[arg(long, global = true, value_enum)]
    pub support: Option<SupportArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SupportArg {
    Lts,
    NonLts,
}

impl From<&FilterArgs> for Filters {
    fn from(args: &FilterArgs) -> Self {
        Filters {
            kinds: args.kinds.clone(),
            distros: args.distros.clone(),
            arches: args.arches.clone(),
            desktops: args.desktops.clone(),
            targets: args.targets.clone(),
            support: args.support.map(|s| match s {
                SupportArg::Lts => Support::Lts,
                SupportArg::NonLts => Support::NonLts,
            }),
        }
    }
}

/// Answer given when a manifest's signing key is not in the keyring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnUnknownKey {
    /// Ask on the terminal.
    Prompt,
    /// Import the key from the release's keyserver.
    Download,
    /// Accept the manifest without a verified signature.
    Ignore,
    Abort,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List selected images with their download status.
    List,

    /// Download selected images that are not on disk yet.
    Download {
        /// Download again even if the image exists.
        #[arg(long)]
        force: bool,
    },

    /// Verify selected images against signed checksum manifests.
    Verify {
        #[arg(long, value_enum, default_value = "prompt")]
        on_unknown_key: OnUnknownKey,
    },

    /// Print the digest of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,

        /// md5, sha1, sha256 or sha512.
        #[arg(long, default_value = "sha256")]
        algorithm: String,
    },

    /// Generate shell completions on stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    fn load_catalog(&self, cfg: &config::IsoManagerConfig) -> Result<Catalog> {
        let path = self
            .catalog
            .clone()
            .or_else(|| cfg.catalog.clone())
            .context("no catalog configured; pass --catalog or set `catalog` in the config file")?;
        Catalog::load(&path)
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // Commands that need neither config nor catalog.
        match &cli.command {
            CliCommand::Checksum { path, algorithm } => return run_checksum(path, algorithm),
            CliCommand::Completions { shell } => return run_completions(*shell),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let catalog = cli.load_catalog(&cfg)?;
        let filters = Filters::from(&cli.filters);
        let path_format = cli.path_format.as_deref().unwrap_or(&cfg.path_format);

        match cli.command {
            CliCommand::List => run_list(&catalog, &filters, path_format)?,
            CliCommand::Download { force } => {
                run_download(&catalog, &filters, path_format, &cfg, force)?
            }
            CliCommand::Verify { on_unknown_key } => {
                run_verify(&catalog, &filters, path_format, &cfg, on_unknown_key)?
            }
            CliCommand::Checksum { .. } | CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
