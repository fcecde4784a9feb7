pub mod config;
pub mod logging;

pub mod cache;
pub mod catalog;
pub mod digest;
pub mod download;
pub mod error;
pub mod fetch;
pub mod hash_check;
pub mod job;
pub mod manifest;
pub mod path_template;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod signature;
pub mod transport;

pub use error::VerifyError;
