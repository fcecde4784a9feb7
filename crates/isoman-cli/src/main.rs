use isoman_core::logging::{self, LogSink};

mod cli;

use crate::cli::CliCommand;

fn main() {
    if let LogSink::File(path) = logging::init() {
        tracing::debug!("logging to {}", path.display());
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("iso-manager error: {:#}", err);
        std::process::exit(1);
    }
}
