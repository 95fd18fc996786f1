//! Command-line runtime for the `seam` C instrumenter.
//!
//! The runtime parses arguments, resolves configuration and instruments one C
//! file, writing `<stem>_instrumented<ext>` next to it. Log lines produced
//! during the run are written to the same stderr handle as error reports. It
//! is exercised both from the binary entrypoint and from tests where the
//! output streams are substituted.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use seam_config::{Config, ProviderKind};
use seam_syntax::{ClangProvider, TreeSitterProvider};

mod driver;
mod errors;
mod output;
mod telemetry;

use driver::{Outcome, instrument_file};
use errors::AppError;
use telemetry::LogBuffer;

/// Inserts entry and exit markers into C function bodies.
#[derive(Debug, Parser)]
#[command(name = "seam", version)]
struct Cli {
    #[command(flatten)]
    config: Config,
    /// C source file to instrument.
    file: PathBuf,
    /// Compiler arguments for the parser, e.g. `-Iinclude -DNDEBUG`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    compiler_args: Vec<String>,
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// Failures are written to `stderr` and yield [`ExitCode::FAILURE`]; the
/// run summary goes to `stdout`. Finding nothing to instrument is a success.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let logs = LogBuffer::default();
    let result = execute(args, stdout, &logs);
    let _ = stderr.write_all(&logs.take());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // Help and version requests are rendered by clap as "errors".
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, W>(args: I, stdout: &mut W, logs: &LogBuffer) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
{
    let cli = Cli::try_parse_from(args).map_err(AppError::CliUsage)?;
    cli.config.validate()?;
    let dispatch = telemetry::dispatch(&cli.config, logs.clone())?;

    tracing::dispatcher::with_default(&dispatch, || {
        instrument(&cli, stdout).inspect_err(|error| {
            tracing::debug!(%error, "instrumentation failed");
        })
    })
}

fn instrument<W: Write>(cli: &Cli, stdout: &mut W) -> Result<(), AppError> {
    let outcome = match cli.config.provider() {
        ProviderKind::Clang => instrument_file(
            &mut ClangProvider::new(),
            &cli.file,
            &cli.compiler_args,
            &cli.config,
        ),
        ProviderKind::TreeSitter => instrument_file(
            &mut TreeSitterProvider::new()?,
            &cli.file,
            &cli.compiler_args,
            &cli.config,
        ),
    }?;

    match outcome {
        Outcome::NothingToInstrument => writeln!(
            stdout,
            "No '{}' function definitions found to instrument.",
            cli.config.prefix()
        ),
        Outcome::Written { path, functions } => {
            tracing::debug!(functions, "instrumentation complete");
            writeln!(
                stdout,
                "Successfully wrote instrumented file to '{}'",
                path.display()
            )
        }
    }
    .map_err(AppError::Report)
}
