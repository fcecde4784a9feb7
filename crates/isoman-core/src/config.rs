use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Name used for XDG config, cache and state directories.
pub const APP_NAME: &str = "iso-manager";

/// Retry policy parameters (`[retry]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per GET (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 15,
        }
    }
}

/// Transfer timeouts (`[transfer]` section). No total timeout; stalled
/// transfers are caught by the low-speed limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    pub connect_timeout_secs: u64,
    /// Abort when the rate stays below this many bytes/s...
    pub low_speed_limit_bytes: u32,
    /// ...for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/iso-manager/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsoManagerConfig {
    /// Catalog file or directory of `*.toml` catalog files.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Template for artifact paths, e.g. `~/ISO/{distro}/{label}.iso`.
    pub path_format: String,
    /// Overrides the XDG cache location for checksum manifests.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Signature verifier binary.
    pub gpg_program: String,
    /// Digest algorithms in order of preference when a release publishes several.
    pub preferred_algorithms: Vec<String>,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for IsoManagerConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            path_format: "~/ISO/{distro}/{label}.iso".to_string(),
            cache_dir: None,
            gpg_program: "gpg".to_string(),
            preferred_algorithms: ["sha512", "sha256", "sha1", "md5"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            transfer: TransferConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME)?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<IsoManagerConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = IsoManagerConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: IsoManagerConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
