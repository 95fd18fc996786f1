//! Instrumentation of one file on disk.

use std::fs;
use std::path::{Path, PathBuf};

use seam_config::Config;
use seam_syntax::{
    Diagnostic, FunctionFilter, Markers, SyntaxError, SyntaxProvider,
    find_instrumentation_points, instrument,
};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::output::output_path;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// No qualifying function was found; nothing was written.
    NothingToInstrument,
    /// The instrumented copy was written to `path`.
    Written { path: PathBuf, functions: usize },
}

/// Parses `file`, instruments its qualifying functions and writes the copy.
///
/// The input file is never modified. Error diagnostics abort the run before
/// anything is written.
pub(crate) fn instrument_file<P: SyntaxProvider>(
    provider: &mut P,
    file: &Path,
    compiler_args: &[String],
    config: &Config,
) -> Result<Outcome, AppError> {
    if !file.exists() {
        return Err(AppError::file_not_found(file.to_path_buf()));
    }
    // Tree nodes are attributed to the parsed path, so match on the
    // canonical form regardless of how the file was named.
    let canonical =
        fs::canonicalize(file).map_err(|e| SyntaxError::read(file.to_path_buf(), e))?;

    let unit = provider.parse(&canonical, compiler_args)?;
    let errors: Vec<Diagnostic> = unit.errors().cloned().collect();
    if !errors.is_empty() {
        return Err(AppError::ParseErrors {
            diagnostics: errors,
        });
    }

    let filter = FunctionFilter::new(config.prefix());
    let points = find_instrumentation_points(unit.root(), &canonical, &filter);
    if points.is_empty() {
        info!(path = %file.display(), prefix = filter.prefix(), "no functions to instrument");
        return Ok(Outcome::NothingToInstrument);
    }

    let markers = Markers::new(config.entry_marker(), config.exit_marker());
    let result = instrument(unit.source(), &points, &markers);
    let output = output_path(file, config.output_suffix());
    debug!(path = %output.display(), bytes = result.output().len(), "writing output");
    fs::write(&output, result.output()).map_err(|e| AppError::write(output.clone(), e))?;

    info!(
        path = %output.display(),
        functions = result.functions().len(),
        inserted_bytes = result.inserted_bytes(),
        "wrote instrumented file"
    );
    Ok(Outcome::Written {
        path: output,
        functions: result.functions().len(),
    })
}
