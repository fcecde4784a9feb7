//! `gpg` as the external signature primitive.
//!
//! Verification runs with `--status-fd 1` so the outcome is read from the
//! machine-readable status lines rather than the exit code alone.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{SignatureStatus, SignatureTool};

/// `ERRSIG` return code meaning "no public key".
const ERRSIG_NO_PUBKEY: &str = "9";

#[derive(Debug, Clone)]
pub struct GpgTool {
    program: PathBuf,
}

impl Default for GpgTool {
    fn default() -> Self {
        Self::new("gpg")
    }
}

impl GpgTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SignatureTool for GpgTool {
    fn verify(&self, signature: &Path, data: &Path) -> Result<SignatureStatus> {
        let output = Command::new(&self.program)
            .args(["--batch", "--no-tty", "--status-fd", "1", "--verify"])
            .arg(signature)
            .arg(data)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("run {}", self.program.display()))?;
        let status = String::from_utf8_lossy(&output.stdout);
        match classify_status(&status, output.status.code()) {
            Some(s) => Ok(s),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    stderr.trim()
                )
            }
        }
    }

    fn receive_key(&self, key_id: &str, keyserver: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["--batch", "--no-tty", "--keyserver", keyserver, "--recv-keys"])
            .arg(format!("0x{}", key_id.trim_start_matches("0x")))
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("run {}", self.program.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{}", stderr.trim());
        }
        Ok(())
    }
}

/// Classify gpg status-fd output. `None` means the run produced no usable
/// verdict (missing data file, unreadable signature, ...).
pub(crate) fn classify_status(status: &str, exit_code: Option<i32>) -> Option<SignatureStatus> {
    let mut good = false;
    let mut missing_key = false;

    for line in status.lines() {
        let Some(rest) = line.strip_prefix("[GNUPG:] ") else {
            continue;
        };
        let mut fields = rest.split_whitespace();
        match fields.next() {
            Some("BADSIG") => return Some(SignatureStatus::Invalid),
            Some("GOODSIG") | Some("VALIDSIG") => good = true,
            Some("NO_PUBKEY") => missing_key = true,
            Some("ERRSIG") => {
                if fields.nth(5) == Some(ERRSIG_NO_PUBKEY) {
                    missing_key = true;
                }
            }
            _ => {}
        }
    }

    if good && exit_code == Some(0) {
        Some(SignatureStatus::Valid)
    } else if missing_key {
        Some(SignatureStatus::UnknownSigner)
    } else if exit_code == Some(1) {
        Some(SignatureStatus::Invalid)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_signature() {
        let out = "[GNUPG:] NEWSIG\n\
                   [GNUPG:] GOODSIG DA87E80D6294BE9B Debian CD signing key <debian-cd@lists.debian.org>\n\
                   [GNUPG:] VALIDSIG DF9B9C49EAA9298432589D76DA87E80D6294BE9B 2024-02-10 ...\n";
        assert_eq!(classify_status(out, Some(0)), Some(SignatureStatus::Valid));
    }

    #[test]
    fn bad_signature_wins() {
        let out = "[GNUPG:] NEWSIG\n[GNUPG:] BADSIG DA87E80D6294BE9B Debian CD signing key\n";
        assert_eq!(classify_status(out, Some(1)), Some(SignatureStatus::Invalid));
        let mixed = "[GNUPG:] GOODSIG AAAA x\n[GNUPG:] BADSIG BBBB y\n";
        assert_eq!(classify_status(mixed, Some(0)), Some(SignatureStatus::Invalid));
    }

    #[test]
    fn missing_public_key() {
        let out = "[GNUPG:] NEWSIG\n\
                   [GNUPG:] ERRSIG DA87E80D6294BE9B 1 8 00 1707559999 9 -\n\
                   [GNUPG:] NO_PUBKEY DA87E80D6294BE9B\n";
        assert_eq!(classify_status(out, Some(2)), Some(SignatureStatus::UnknownSigner));
        let errsig_only = "[GNUPG:] ERRSIG DA87E80D6294BE9B 1 8 00 1707559999 9\n";
        assert_eq!(
            classify_status(errsig_only, Some(2)),
            Some(SignatureStatus::UnknownSigner)
        );
    }

    #[test]
    fn other_failures_have_no_verdict() {
        assert_eq!(classify_status("", Some(2)), None);
        assert_eq!(classify_status("[GNUPG:] NODATA 1\n", Some(2)), None);
        assert_eq!(classify_status("[GNUPG:] GOODSIG AAAA x\n", Some(2)), None);
        assert_eq!(classify_status("", None), None);
    }

    #[test]
    fn exit_one_without_status_is_invalid() {
        assert_eq!(classify_status("", Some(1)), Some(SignatureStatus::Invalid));
    }

    #[test]
    fn missing_program_is_an_error() {
        let tool = GpgTool::new("/nonexistent/gpg-binary");
        assert!(tool.verify(Path::new("a.sig"), Path::new("a")).is_err());
        assert!(tool.receive_key("ABCD", "keyserver.example").is_err());
    }
}
