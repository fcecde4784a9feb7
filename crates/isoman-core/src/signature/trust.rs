//! Trust escalation when a manifest's signer is not in the local keyring.

use std::fmt;
use std::io::{BufRead, Write};

use crate::job::SignerIdentity;

/// What to do about a manifest signed by an unknown key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Fetch the declared key from its keyserver and accept the manifest.
    DownloadKey,
    /// Accept the manifest without a verified signature.
    Ignore,
    /// Stop the whole run.
    Abort,
}

impl TrustDecision {
    /// The choices offered, in prompt order.
    pub const CHOICES: [TrustDecision; 3] = [
        TrustDecision::DownloadKey,
        TrustDecision::Ignore,
        TrustDecision::Abort,
    ];

    pub fn selector(self) -> char {
        match self {
            TrustDecision::DownloadKey => '1',
            TrustDecision::Ignore => '2',
            TrustDecision::Abort => '3',
        }
    }

    pub fn from_selector(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::CHOICES
            .into_iter()
            .find(|c| input.len() == 1 && input.starts_with(c.selector()))
    }

    pub fn describe(self, ctx: &UnknownSigner<'_>) -> String {
        match self {
            TrustDecision::DownloadKey => match ctx.signer {
                Some(s) => format!("Download the public key {} from {}", s.key_id, s.keyserver),
                None => "Download the public key (no key declared)".to_string(),
            },
            TrustDecision::Ignore => "Don't check the signature for the checksum file".to_string(),
            TrustDecision::Abort => "Abort verifying altogether".to_string(),
        }
    }
}

/// Context handed to the prompt.
#[derive(Debug, Clone, Copy)]
pub struct UnknownSigner<'a> {
    pub manifest_url: &'a str,
    pub signer: Option<&'a SignerIdentity>,
}

impl fmt::Display for UnknownSigner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signer {
            Some(s) => write!(f, "{} (key {})", self.manifest_url, s.key_id),
            None => f.write_str(self.manifest_url),
        }
    }
}

/// Blocking decision point, injectable so non-interactive callers and tests
/// can answer deterministically.
pub trait TrustPrompt {
    fn decide(&mut self, ctx: &UnknownSigner<'_>) -> TrustDecision;
}

/// Always answers the same.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub TrustDecision);

impl TrustPrompt for FixedDecision {
    fn decide(&mut self, _ctx: &UnknownSigner<'_>) -> TrustDecision {
        self.0
    }
}

/// Numbered menu on a terminal. Re-asks on unrecognised input; end of input
/// or a read error counts as abort.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, ctx: &UnknownSigner<'_>) -> std::io::Result<TrustDecision> {
        writeln!(self.output, "\nSignature could not be verified for {ctx}")?;
        for choice in TrustDecision::CHOICES {
            writeln!(self.output, "[{}] {}", choice.selector(), choice.describe(ctx))?;
        }
        loop {
            match ctx.signer {
                Some(s) => write!(
                    self.output,
                    "Do you want to download the public key {}? ",
                    s.key_id
                )?,
                None => write!(self.output, "No signing key is declared. Your choice? ")?,
            }
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(TrustDecision::Abort);
            }
            match TrustDecision::from_selector(&line) {
                Some(d) => return Ok(d),
                None => writeln!(self.output, "Enter 1, 2 or 3.")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> TrustPrompt for LinePrompt<R, W> {
    fn decide(&mut self, ctx: &UnknownSigner<'_>) -> TrustDecision {
        self.ask(ctx).unwrap_or_else(|e| {
            tracing::warn!("trust prompt failed: {}", e);
            TrustDecision::Abort
        })
    }
}
