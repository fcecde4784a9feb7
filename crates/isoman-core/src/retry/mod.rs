//! Retry and backoff policy for remote fetches.
//!
//! Manifest, signature and artifact GETs share one policy: transient
//! failures (timeouts, throttling, connection drops, 5xx) back off
//! exponentially, everything else fails immediately.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
