//! Error types for the CLI runtime.

use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use seam_config::ConfigError;
use seam_syntax::{Diagnostic, SyntaxError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to configure logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("Error: File not found at '{}'", path.display())]
    FileNotFound { path: PathBuf },
    #[error("Error: Could not load the translation unit. Details: {0}")]
    Load(#[from] SyntaxError),
    #[error("{}", render_parse_errors(diagnostics))]
    ParseErrors { diagnostics: Vec<Diagnostic> },
    #[error("Error writing to file '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to write to the output stream: {0}")]
    Report(io::Error),
}

impl AppError {
    pub(crate) const fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub(crate) const fn write(path: PathBuf, source: io::Error) -> Self {
        Self::Write { path, source }
    }
}

/// Lists every error diagnostic, followed by the abort notice.
fn render_parse_errors(diagnostics: &[Diagnostic]) -> String {
    let mut rendered = String::new();
    for diagnostic in diagnostics {
        let _ = writeln!(rendered, "Parsing Error: {diagnostic}");
    }
    rendered.push_str("\nInstrumentation aborted due to parsing errors.\n");
    rendered.push_str("Please provide correct include paths (-I, -isystem) if needed.");
    rendered
}
