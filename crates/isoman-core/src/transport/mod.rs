//! Blocking HTTP GET to disk.
//!
//! One easy handle per request on the calling thread. The body is streamed
//! into `<dest>.part` and renamed over `dest` only after a 2xx response, so
//! a destination path never holds a partial body.

mod error;

pub use error::FetchError;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::TransferConfig;
use crate::retry::{run_with_retry, RetryPolicy};

/// Suffix of the in-progress file next to the destination.
pub const TEMP_SUFFIX: &str = ".part";

/// Remote retrieval seam. The pipeline only ever needs "put the body of
/// this URL at that path".
pub trait Transport {
    /// Fetch `url` into `dest`, returning the number of bytes written.
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// `file.iso` -> `file.iso.part`
pub fn temp_path(dest: &Path) -> PathBuf {
    let mut o = dest.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// libcurl-backed transport with timeouts and retries.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    low_speed_limit: u32,
    low_speed_time: Duration,
    retry: RetryPolicy,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(&TransferConfig::default(), RetryPolicy::default())
    }
}

impl CurlTransport {
    pub fn new(transfer: &TransferConfig, retry: RetryPolicy) -> Self {
        Self {
            connect_timeout: Duration::from_secs(transfer.connect_timeout_secs),
            low_speed_limit: transfer.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(transfer.low_speed_time_secs),
            retry,
        }
    }

    fn fetch_once(&self, url: &str, part: &Path) -> Result<u64, FetchError> {
        let mut file = File::create(part).map_err(FetchError::Storage)?;
        let mut written = 0u64;
        let mut write_err: Option<std::io::Error> = None;

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.fail_on_error(false)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };
        if let Some(e) = write_err {
            return Err(FetchError::Storage(e));
        }
        performed?;

        let code = easy.response_code()?;
        // file:// and other non-HTTP schemes report 0.
        if code != 0 && !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        file.sync_all().map_err(FetchError::Storage)?;
        Ok(written)
    }
}

impl Transport for CurlTransport {
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let part = temp_path(dest);
        let result = run_with_retry(&self.retry, || self.fetch_once(url, &part));
        match result {
            Ok(n) => {
                fs::rename(&part, dest).map_err(FetchError::Storage)?;
                tracing::debug!(url, bytes = n, dest = %dest.display(), "fetched");
                Ok(n)
            }
            Err(e) => {
                let _ = fs::remove_file(&part);
                Err(e)
            }
        }
    }
}
