//! CLI entrypoint for the `seam` C instrumenter.
//!
//! The binary delegates to [`seam_cli::run`], which parses arguments, loads
//! configuration, instruments the requested file and reports the outcome.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    seam_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
